//! Test utilities and fixtures for orderdesk integration tests

#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::Value;
use std::time::Duration;

pub use orderdesk::db::{AppState, connection_manager, init_db, queries, register_functions};
pub use orderdesk::handlers;
pub use orderdesk::models::*;
pub use orderdesk::views::ViewCache;

pub const SESSION_TTL: i64 = 3600;

/// Create an in-memory test database with schema and search functions
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    register_functions(&conn).expect("Failed to register functions");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an AppState backed by a single in-memory connection.
///
/// Each in-memory connection is its own database, so the pool holds exactly
/// one. Tests must drop any connection they hold before sending a request.
pub fn create_test_app_state() -> AppState {
    let manager = connection_manager(SqliteConnectionManager::memory());
    let pool = Pool::builder()
        .max_size(1)
        .connection_timeout(Duration::from_secs(2))
        .build(manager)
        .unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        views: ViewCache::new(Duration::from_secs(60)),
    }
}

pub fn test_app(state: &AppState) -> Router {
    handlers::router(state.clone()).with_state(state.clone())
}

pub fn create_test_user(conn: &Connection, id: &str, email: &str, name: Option<&str>) -> DirectoryUser {
    let user = DirectoryUser {
        id: id.to_string(),
        email: email.to_string(),
        name: name.map(String::from),
    };
    queries::upsert_directory_user(conn, &user).expect("Failed to create test user");
    user
}

/// Create a directory user and a live session for it, returning the bearer token
pub fn create_test_user_with_session(conn: &Connection, id: &str) -> String {
    create_test_user(conn, id, &format!("{}@example.com", id), None);
    queries::create_session(conn, id, SESSION_TTL).expect("Failed to create test session")
}

pub fn create_test_project(conn: &mut Connection, owner_id: &str, name: &str, members: &[&str]) -> Project {
    let input = ProjectInput {
        name: name.to_string(),
        image_url: None,
        member_ids: members.iter().map(|m| m.to_string()).collect(),
    };
    queries::create_project(conn, owner_id, &input).expect("Failed to create test project")
}

pub fn create_test_service_order(conn: &Connection, name: &str, status: ServiceOrderStatus) -> ServiceOrder {
    let input = ServiceOrderInput {
        name: name.to_string(),
        price: Price::from_cents(10_000),
        description: Some("Test order".to_string()),
        status,
        tag: ServiceOrderTag::Feature,
        delivery_date: None,
    };
    queries::create_service_order(conn, &input).expect("Failed to create test service order")
}

/// URL-encode form fields into a request body
pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn form_request(method: &str, uri: &str, token: &str, fields: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::from(form_body(fields)))
        .unwrap()
}

pub fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}
