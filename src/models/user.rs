use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, msg};

/// Longest directory search query accepted, in characters after trimming.
pub const MAX_SEARCH_QUERY_LEN: usize = 100;

/// A user record from the external identity provider's directory.
///
/// Read-only from this service's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

impl DirectoryUser {
    /// Name shown on selection badges: the display name, or the email's local part.
    pub fn display_label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }
}

/// Query parameters for `GET /users/search`.
#[derive(Debug, Deserialize, Default)]
pub struct UserSearchQuery {
    #[serde(default)]
    pub q: String,
}

impl UserSearchQuery {
    /// The trimmed query, rejected if longer than [`MAX_SEARCH_QUERY_LEN`].
    pub fn validate(&self) -> Result<&str> {
        let q = self.q.trim();
        if q.chars().count() > MAX_SEARCH_QUERY_LEN {
            return Err(AppError::BadRequest(msg::SEARCH_QUERY_TOO_LONG.into()));
        }
        Ok(q)
    }
}
