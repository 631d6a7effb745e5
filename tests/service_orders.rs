//! Integration tests for service order handlers.

use axum::http::StatusCode;
use serde_json::Value;
use tower::ServiceExt;

mod common;
use common::*;

fn setup() -> (AppState, String) {
    let state = create_test_app_state();
    let token = {
        let conn = state.db.get().unwrap();
        create_test_user_with_session(&conn, "ana")
    };
    (state, token)
}

async fn create(state: &AppState, token: &str, fields: &[(&str, &str)]) -> (StatusCode, Value) {
    let response = test_app(state)
        .oneshot(form_request("POST", "/service-orders", token, fields))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn test_create_applies_defaults() {
    let (state, token) = setup();

    let (status, body) = create(&state, &token, &[("name", " Landing page "), ("price", "1500,5")]).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["id"].as_str().unwrap().starts_with("od_so_"));
    assert_eq!(body["name"], "Landing page");
    assert_eq!(body["price"], "1500.50");
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["tag"], "FEATURE");
    assert!(body["description"].is_null());
    assert!(body["delivery_date"].is_null());
}

#[tokio::test]
async fn test_create_with_all_fields() {
    let (state, token) = setup();

    let (status, body) = create(
        &state,
        &token,
        &[
            ("name", "SEO audit"),
            ("price", "99.9"),
            ("description", "Crawl and report"),
            ("status", "ready_for_dev"),
            ("tag", "SEO"),
            ("delivery_date", "2026-12-01"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], "99.90");
    assert_eq!(body["status"], "ready_for_dev");
    assert_eq!(body["tag"], "SEO");
    assert_eq!(body["delivery_date"], "2026-12-01");
    assert_eq!(body["description"], "Crawl and report");
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let (state, token) = setup();

    let cases: &[&[(&str, &str)]] = &[
        &[("name", "   ")],
        &[("name", "x"), ("price", "abc")],
        &[("name", "x"), ("price", "-10")],
        &[("name", "x"), ("price", "1.999")],
        &[("name", "x"), ("status", "done")],
        &[("name", "x"), ("tag", "marketing")],
        &[("name", "x"), ("delivery_date", "01/12/2026")],
    ];

    for fields in cases {
        let (status, body) = create(&state, &token, fields).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "fields: {:?}", fields);
        assert_eq!(body["error"], "Bad request");
    }

    let conn = state.db.get().unwrap();
    assert!(queries::list_service_orders(&conn, None).unwrap().is_empty());
}

#[tokio::test]
async fn test_status_update_changes_only_status() {
    let (state, token) = setup();
    let original = {
        let conn = state.db.get().unwrap();
        create_test_service_order(&conn, "Checkout flow", ServiceOrderStatus::InProgress)
    };

    let response = test_app(&state)
        .oneshot(form_request(
            "PATCH",
            &format!("/service-orders/{}/status", original.id),
            &token,
            &[("status", "finished")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let conn = state.db.get().unwrap();
    let stored = queries::get_service_order_by_id(&conn, &original.id).unwrap().unwrap();
    assert_eq!(stored.status, ServiceOrderStatus::Finished);
    assert_eq!(stored.name, original.name);
    assert_eq!(stored.price, original.price);
    assert_eq!(stored.description, original.description);
    assert_eq!(stored.tag, original.tag);
    assert_eq!(stored.delivery_date, original.delivery_date);
    assert_eq!(stored.created_at, original.created_at);
}

#[tokio::test]
async fn test_full_update_replaces_fields() {
    let (state, token) = setup();
    let original = {
        let conn = state.db.get().unwrap();
        create_test_service_order(&conn, "Old name", ServiceOrderStatus::Blocked)
    };

    let response = test_app(&state)
        .oneshot(form_request(
            "PUT",
            &format!("/service-orders/{}", original.id),
            &token,
            &[("name", "New name"), ("price", "12"), ("tag", "DESIGN"), ("description", "")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["name"], "New name");
    assert_eq!(body["price"], "12.00");
    assert_eq!(body["tag"], "DESIGN");
    // blank status falls back to the default
    assert_eq!(body["status"], "in_progress");
    assert!(body["description"].is_null());
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let (state, token) = setup();
    let uri = "/service-orders/od_so_00000000000000000000000000000000";

    let response = test_app(&state).oneshot(authed_request("GET", uri, &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = test_app(&state)
        .oneshot(form_request("PATCH", &format!("{}/status", uri), &token, &[("status", "blocked")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = test_app(&state).oneshot(authed_request("DELETE", uri, &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = test_app(&state)
        .oneshot(authed_request("GET", "/service-orders/od_proj_00000000000000000000000000000000", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_is_hard_delete() {
    let (state, token) = setup();
    let order = {
        let conn = state.db.get().unwrap();
        create_test_service_order(&conn, "Temp", ServiceOrderStatus::Canceled)
    };
    let uri = format!("/service-orders/{}", order.id);

    let response = test_app(&state).oneshot(authed_request("DELETE", &uri, &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test_app(&state).oneshot(authed_request("GET", &uri, &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_filters_by_tab_and_counts_all_tabs() {
    let (state, token) = setup();
    {
        let conn = state.db.get().unwrap();
        create_test_service_order(&conn, "a", ServiceOrderStatus::InProgress);
        create_test_service_order(&conn, "b", ServiceOrderStatus::Blocked);
        create_test_service_order(&conn, "c", ServiceOrderStatus::Blocked);
        create_test_service_order(&conn, "d", ServiceOrderStatus::Finished);
    }

    let response = test_app(&state)
        .oneshot(authed_request("GET", "/service-orders?status=blocked", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let names: Vec<&str> = body["items"].as_array().unwrap().iter().map(|o| o["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["c", "b"]);
    assert_eq!(body["counts"]["all"], 4);
    assert_eq!(body["counts"]["blocked"], 2);
    assert_eq!(body["counts"]["in_progress"], 1);
    assert_eq!(body["counts"]["finished"], 1);
    assert_eq!(body["counts"]["canceled"], 0);

    let response = test_app(&state)
        .oneshot(authed_request("GET", "/service-orders?status=all", &token))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 4);

    let response = test_app(&state)
        .oneshot(authed_request("GET", "/service-orders?status=bogus", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mutations_invalidate_listing() {
    let (state, token) = setup();

    let response = test_app(&state)
        .oneshot(authed_request("GET", "/service-orders", &token))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["counts"]["all"], 0);

    let (status, created) = create(&state, &token, &[("name", "New order")]).await;
    assert_eq!(status, StatusCode::OK);

    let response = test_app(&state)
        .oneshot(authed_request("GET", "/service-orders", &token))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["counts"]["all"], 1);
    assert_eq!(body["counts"]["in_progress"], 1);

    let response = test_app(&state)
        .oneshot(form_request(
            "PATCH",
            &format!("/service-orders/{}/status", created["id"].as_str().unwrap()),
            &token,
            &[("status", "canceled")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test_app(&state)
        .oneshot(authed_request("GET", "/service-orders", &token))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["counts"]["in_progress"], 0);
    assert_eq!(body["counts"]["canceled"], 1);
}

#[tokio::test]
async fn test_listing_built_before_a_write_is_not_cached() {
    use orderdesk::views::{Lookup, SERVICE_ORDERS_VIEW};

    let (state, token) = setup();

    // A reader misses and builds the listing from the database.
    let seen = match state.views.get(SERVICE_ORDERS_VIEW, "all") {
        Lookup::Miss(generation) => generation,
        Lookup::Hit(_) => panic!("cache should start empty"),
    };
    let stale = {
        let conn = state.db.get().unwrap();
        let list = ServiceOrderList {
            items: queries::list_service_orders(&conn, None).unwrap(),
            counts: queries::count_service_orders_by_status(&conn).unwrap(),
        };
        serde_json::to_value(&list).unwrap()
    };

    // A write commits and invalidates before the reader stores its body.
    {
        let conn = state.db.get().unwrap();
        create_test_service_order(&conn, "Concurrent order", ServiceOrderStatus::InProgress);
    }
    state.views.invalidate(SERVICE_ORDERS_VIEW);
    state.views.put(SERVICE_ORDERS_VIEW, "all", seen, stale);

    let response = test_app(&state)
        .oneshot(authed_request("GET", "/service-orders", &token))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["counts"]["all"], 1);
}

#[tokio::test]
async fn test_non_form_body_is_a_json_bad_request() {
    let (state, token) = setup();

    let response = test_app(&state)
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/service-orders")
                .header("content-type", "application/json")
                .header("Authorization", format!("Bearer {}", token))
                .body(axum::body::Body::from(r#"{"name":"x"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Bad request");
}
