use axum::extract::{Extension, State};

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{Json, Query};
use crate::middleware::RequestContext;
use crate::models::{DirectoryUser, UserSearchQuery};

/// Fuzzy directory lookup backing the member picker.
pub async fn search_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<UserSearchQuery>,
) -> Result<Json<Vec<DirectoryUser>>> {
    let q = params.validate()?;
    let conn = state.db.get()?;
    let users = queries::search_directory(&conn, q)?;
    tracing::debug!(user_id = %ctx.user_id, results = users.len(), "Directory search");
    Ok(Json(users))
}
