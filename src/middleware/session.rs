use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};
use crate::error::AppError;

/// The authenticated caller, inserted as a request extension by [`session_auth`].
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: String,
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the bearer session to a directory user.
///
/// Missing, unknown and expired tokens all yield 401.
pub async fn session_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or(AppError::Unauthorized)?;

    let user_id = {
        let conn = state.db.get()?;
        queries::get_session_user_id(&conn, token)?
    };
    let user_id = user_id.ok_or_else(|| {
        tracing::debug!("Rejected request with unknown or expired session");
        AppError::Unauthorized
    })?;

    request.extensions_mut().insert(RequestContext { user_id });
    Ok(next.run(request).await)
}
