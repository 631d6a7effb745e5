mod projects;
mod service_orders;
mod users;

pub use projects::*;
pub use service_orders::*;
pub use users::*;

use axum::{
    Json, Router, middleware,
    routing::{delete, get, patch},
};
use serde::Serialize;

use crate::db::AppState;
use crate::error::{AppError, Result, msg};
use crate::id::{EntityType, is_valid_id_for};
use crate::middleware::session_auth;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Reject malformed path ids before they reach the database.
fn check_id(entity: EntityType, id: &str) -> Result<()> {
    if is_valid_id_for(entity, id) {
        Ok(())
    } else {
        Err(AppError::BadRequest(msg::INVALID_ID.into()))
    }
}

/// Full application router. Everything except `/health` requires a session.
pub fn router(state: AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route("/users/search", get(search_users))
        // Projects
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/projects/{id}/members/{user_id}", delete(remove_project_member))
        // Service orders
        .route("/service-orders", get(list_service_orders).post(create_service_order))
        .route(
            "/service-orders/{id}",
            get(get_service_order)
                .put(update_service_order)
                .delete(delete_service_order),
        )
        .route("/service-orders/{id}/status", patch(update_service_order_status))
        .layer(middleware::from_fn_with_state(state, session_auth));

    Router::new().route("/health", get(health)).merge(authenticated)
}
