use axum::extract::{Extension, State};

use super::check_id;
use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Form, Json, Path, Query};
use crate::id::EntityType;
use crate::middleware::RequestContext;
use crate::models::{ServiceOrder, ServiceOrderForm, ServiceOrderList, ServiceOrderListQuery, StatusForm};
use crate::views::{Lookup, SERVICE_ORDERS_VIEW};

/// Orders for the selected tab plus badge counts for every tab.
pub async fn list_service_orders(
    State(state): State<AppState>,
    Query(params): Query<ServiceOrderListQuery>,
) -> Result<Json<serde_json::Value>> {
    let filter = params.status_filter()?;
    let variant = filter.map(|s| s.as_ref().to_string()).unwrap_or_else(|| "all".to_string());

    let generation = match state.views.get(SERVICE_ORDERS_VIEW, &variant) {
        Lookup::Hit(cached) => return Ok(Json(cached)),
        Lookup::Miss(generation) => generation,
    };

    let conn = state.db.get()?;
    let list = ServiceOrderList {
        items: queries::list_service_orders(&conn, filter)?,
        counts: queries::count_service_orders_by_status(&conn)?,
    };
    let body = serde_json::to_value(&list)?;
    state.views.put(SERVICE_ORDERS_VIEW, &variant, generation, body.clone());
    Ok(Json(body))
}

pub async fn create_service_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ServiceOrderForm>,
) -> Result<Json<ServiceOrder>> {
    let input = form.validate()?;

    let conn = state.db.get()?;
    let order = queries::create_service_order(&conn, &input)?;
    state.views.invalidate(SERVICE_ORDERS_VIEW);

    tracing::info!(order_id = %order.id, user_id = %ctx.user_id, "Created service order");
    Ok(Json(order))
}

pub async fn get_service_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServiceOrder>> {
    check_id(EntityType::ServiceOrder, &id)?;
    let conn = state.db.get()?;
    let order = queries::get_service_order_by_id(&conn, &id)?.or_not_found(msg::SERVICE_ORDER_NOT_FOUND)?;
    Ok(Json(order))
}

pub async fn update_service_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Form(form): Form<ServiceOrderForm>,
) -> Result<Json<ServiceOrder>> {
    check_id(EntityType::ServiceOrder, &id)?;
    let input = form.validate()?;

    let conn = state.db.get()?;
    let order = queries::update_service_order(&conn, &id, &input)?
        .or_not_found(msg::SERVICE_ORDER_NOT_FOUND)?;
    state.views.invalidate(SERVICE_ORDERS_VIEW);

    tracing::info!(order_id = %id, user_id = %ctx.user_id, "Updated service order");
    Ok(Json(order))
}

/// Change only the status (status dropdown on the listing).
pub async fn update_service_order_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Json<ServiceOrder>> {
    check_id(EntityType::ServiceOrder, &id)?;
    let status = form.validate()?;

    let conn = state.db.get()?;
    let order = queries::update_service_order_status(&conn, &id, status)?
        .or_not_found(msg::SERVICE_ORDER_NOT_FOUND)?;
    state.views.invalidate(SERVICE_ORDERS_VIEW);

    tracing::info!(order_id = %id, status = status.as_ref(), user_id = %ctx.user_id, "Changed service order status");
    Ok(Json(order))
}

pub async fn delete_service_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    check_id(EntityType::ServiceOrder, &id)?;
    let conn = state.db.get()?;

    if !queries::delete_service_order(&conn, &id)? {
        return Err(AppError::NotFound(msg::SERVICE_ORDER_NOT_FOUND.into()));
    }
    state.views.invalidate(SERVICE_ORDERS_VIEW);

    tracing::info!(order_id = %id, user_id = %ctx.user_id, "Deleted service order");
    Ok(Json(serde_json::json!({ "success": true })))
}
