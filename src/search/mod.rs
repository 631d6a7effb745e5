//! Search-as-you-type over the user directory.

mod client;
mod debounce;
mod selection;
mod session;
mod state;
pub mod trigram;

pub use client::{DirectoryClient, HttpDirectoryClient, LocalDirectoryClient, SearchError};
pub use debounce::{DEFAULT_WINDOW, Debounced, debounce};
pub use selection::SelectionSet;
pub use session::SearchSession;
pub use state::{Effect, Phase, SearchEvent, SearchState};
