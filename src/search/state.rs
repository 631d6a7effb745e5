//! Member picker state machine.
//!
//! Pure: events go in, at most one [`Effect`] comes out. Timers and lookups
//! are run by the caller (see [`super::SearchSession`]), which feeds their
//! outcomes back as events.

use crate::models::DirectoryUser;

use super::client::SearchError;
use super::selection::SelectionSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Dropdown closed.
    #[default]
    Idle,
    /// Waiting for the debounce window to close.
    Pending,
    /// Lookup in flight.
    Loading,
    /// Dropdown showing results.
    Open,
    /// Dropdown showing "no results".
    EmptyOpen,
}

#[derive(Debug)]
pub enum SearchEvent {
    Keystroke(String),
    DebounceElapsed(String),
    ResponseArrived {
        seq: u64,
        result: Result<Vec<DirectoryUser>, SearchError>,
    },
    Select(String),
    Remove(String),
    ClickOutside,
    Focus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run a lookup; its response must come back tagged with `seq`.
    Search { seq: u64, query: String },
}

#[derive(Debug, Default)]
pub struct SearchState {
    query: String,
    phase: Phase,
    /// Last sequence number handed out.
    issued: u64,
    /// Sequence number whose response is still authoritative.
    current: Option<u64>,
    awaiting: bool,
    /// Set by an outside click until the input is used again.
    dismissed: bool,
    /// Raw results of the latest accepted response.
    results: Vec<DirectoryUser>,
    selection: SelectionSet,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    #[cfg(test)]
    fn last_issued_seq(&self) -> u64 {
        self.issued
    }

    /// Latest results minus anything already selected.
    pub fn visible_results(&self) -> Vec<DirectoryUser> {
        self.selection.filter_results(&self.results)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.phase(), Phase::Open | Phase::EmptyOpen)
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    fn open_for_results(&mut self) {
        if self.visible_results().is_empty() {
            self.set_phase(Phase::EmptyOpen);
        } else {
            self.set_phase(Phase::Open);
        }
    }

    fn reset_query(&mut self) {
        self.query.clear();
        self.results.clear();
        self.current = None;
        self.awaiting = false;
        self.set_phase(Phase::Idle);
    }

    pub fn handle(&mut self, event: SearchEvent) -> Option<Effect> {
        match event {
            SearchEvent::Keystroke(text) => {
                self.dismissed = false;
                if text.trim().is_empty() {
                    self.reset_query();
                    self.query = text;
                } else {
                    self.query = text;
                    self.set_phase(Phase::Pending);
                }
                None
            }

            SearchEvent::DebounceElapsed(text) => {
                let query = text.trim();
                if text != self.query || query.is_empty() {
                    return None;
                }

                self.issued += 1;
                self.current = Some(self.issued);
                self.awaiting = true;
                if !self.dismissed {
                    self.set_phase(Phase::Loading);
                }
                Some(Effect::Search {
                    seq: self.issued,
                    query: query.to_string(),
                })
            }

            SearchEvent::ResponseArrived { seq, result } => {
                if self.current != Some(seq) {
                    tracing::debug!(seq, latest = self.issued, "Discarding stale search response");
                    return None;
                }

                self.awaiting = false;
                self.results = match result {
                    Ok(users) => users,
                    Err(e) => {
                        tracing::warn!("Directory search failed: {}", e);
                        Vec::new()
                    }
                };
                if !self.dismissed && self.phase() == Phase::Loading {
                    self.open_for_results();
                }
                None
            }

            SearchEvent::Select(id) => {
                let Some(user) = self.visible_results().into_iter().find(|u| u.id == id) else {
                    return None;
                };
                self.selection.add(user);
                self.reset_query();
                None
            }

            SearchEvent::Remove(id) => {
                self.selection.remove(&id);
                if self.is_open() {
                    self.open_for_results();
                }
                None
            }

            SearchEvent::ClickOutside => {
                self.dismissed = true;
                self.set_phase(Phase::Idle);
                None
            }

            SearchEvent::Focus => {
                self.dismissed = false;
                if self.phase() == Phase::Idle && !self.query.trim().is_empty() {
                    if self.awaiting {
                        self.set_phase(Phase::Loading);
                    } else if !self.visible_results().is_empty() {
                        self.set_phase(Phase::Open);
                    }
                }
                None
            }
        }
    }
}
