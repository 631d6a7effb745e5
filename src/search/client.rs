//! Directory lookups used by the member picker.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::{DbPool, queries};
use crate::models::DirectoryUser;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Directory request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Directory returned status {0}")]
    Status(u16),

    #[error("Directory lookup failed: {0}")]
    Lookup(String),
}

/// Source of fuzzy directory matches.
///
/// Implementations return nothing for a blank query without doing any work.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<DirectoryUser>, SearchError>;
}

/// Calls `GET /users/search` on a running server.
pub struct HttpDirectoryClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpDirectoryClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn search(&self, query: &str) -> Result<Vec<DirectoryUser>, SearchError> {
        let q = query.trim();
        if q.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .get(format!("{}/users/search?q={}", self.base_url, urlencoding::encode(q)))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

/// Queries the directory through the server's own pool.
pub struct LocalDirectoryClient {
    db: DbPool,
}

impl LocalDirectoryClient {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DirectoryClient for LocalDirectoryClient {
    async fn search(&self, query: &str) -> Result<Vec<DirectoryUser>, SearchError> {
        let q = query.trim();
        if q.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self
            .db
            .get()
            .map_err(|e| SearchError::Lookup(e.to_string()))?;
        queries::search_directory(&conn, q).map_err(|e| SearchError::Lookup(e.to_string()))
    }
}
