use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::models::DirectoryUser;

use super::client::{DirectoryClient, SearchError};
use super::debounce::{DEFAULT_WINDOW, Debounced, debounce};
use super::state::{Effect, SearchEvent, SearchState};

type LookupResult = (u64, Result<Vec<DirectoryUser>, SearchError>);

/// Runs the member picker state machine against a directory client.
///
/// Keystrokes go through a debounce; each settled query becomes one lookup
/// spawned on the runtime. [`SearchSession::step`] waits for the next timer
/// or lookup completion and feeds it back into the state machine. Must be
/// created inside a tokio runtime.
pub struct SearchSession<C> {
    client: Arc<C>,
    state: SearchState,
    input: watch::Sender<String>,
    debounced: Debounced<String>,
    responses_tx: mpsc::UnboundedSender<LookupResult>,
    responses_rx: mpsc::UnboundedReceiver<LookupResult>,
}

impl<C: DirectoryClient + 'static> SearchSession<C> {
    pub fn new(client: C) -> Self {
        Self::with_window(client, DEFAULT_WINDOW)
    }

    pub fn with_window(client: C, window: Duration) -> Self {
        let (input, rx) = watch::channel(String::new());
        let (responses_tx, responses_rx) = mpsc::unbounded_channel();
        Self {
            client: Arc::new(client),
            state: SearchState::new(),
            input,
            debounced: debounce(rx, window),
            responses_tx,
            responses_rx,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Value for the `members_json` form field.
    pub fn members_json(&self) -> String {
        self.state.selection().to_members_json()
    }

    pub fn type_query(&mut self, text: &str) {
        self.input.send_replace(text.to_string());
        self.apply(SearchEvent::Keystroke(text.to_string()));
    }

    pub fn select(&mut self, id: &str) {
        self.apply(SearchEvent::Select(id.to_string()));
        // keep the debounce input in line with the cleared query
        self.input.send_replace(String::new());
    }

    pub fn remove(&mut self, id: &str) {
        self.apply(SearchEvent::Remove(id.to_string()));
    }

    pub fn click_outside(&mut self) {
        self.apply(SearchEvent::ClickOutside);
    }

    pub fn focus(&mut self) {
        self.apply(SearchEvent::Focus);
    }

    /// Wait for the next settled query or lookup response and apply it.
    ///
    /// Returns false once the debounce has shut down.
    pub async fn step(&mut self) -> bool {
        tokio::select! {
            changed = self.debounced.changed() => {
                if changed.is_err() {
                    return false;
                }
                let text = self.debounced.borrow_and_update().clone();
                self.apply(SearchEvent::DebounceElapsed(text));
            }
            Some((seq, result)) = self.responses_rx.recv() => {
                self.apply(SearchEvent::ResponseArrived { seq, result });
            }
        }
        true
    }

    fn apply(&mut self, event: SearchEvent) {
        if let Some(Effect::Search { seq, query }) = self.state.handle(event) {
            tracing::debug!(seq, query = %query, "Issuing directory search");
            let client = Arc::clone(&self.client);
            let tx = self.responses_tx.clone();
            tokio::spawn(async move {
                let result = client.search(&query).await;
                let _ = tx.send((seq, result));
            });
        }
    }
}
