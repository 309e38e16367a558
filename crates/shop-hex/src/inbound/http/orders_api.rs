use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_cookies::Cookies;

use crate::errors::AppError;
use crate::inbound::http::server::AppState;
use shop_types::domain::order::{NewOrderLine, Order, OrderId, OrderStatus, ShippingInfo};
use shop_types::ports::order_repository::OrderRepository;

#[derive(Deserialize)]
pub struct SubmitOrderRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub lines: Vec<NewOrderLine>,
    #[serde(default)]
    pub shipping: ShippingInfo,
}

#[derive(Serialize)]
struct SubmitOrderResponse {
    success: bool,
    #[serde(rename = "bestellId", skip_serializing_if = "Option::is_none")]
    order_id: Option<OrderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl SubmitOrderResponse {
    fn failed(status: StatusCode, error: String) -> Response {
        let body = Self {
            success: false,
            order_id: None,
            error: Some(error),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// An order as listed for staff, with its total spelled out.
#[derive(Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    order: Order,
    total_cents: i64,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            total_cents: order.total_cents(),
            order,
        }
    }
}

fn parse_order_id(raw: &str) -> Result<OrderId, AppError> {
    raw.parse::<OrderId>()
        .map_err(|e| AppError::BadRequest(format!("invalid order id {raw:?}: {e}")))
}

/// JSON checkout. Answers `{success, bestellId}` or `{success: false, error}`
/// and empties the caller's session cart once the order is stored.
pub async fn submit_order<R>(
    State(state): State<Arc<AppState<R>>>,
    cookies: Cookies,
    payload: Result<Json<SubmitOrderRequest>, JsonRejection>,
) -> Response
where
    R: OrderRepository + Send + Sync + 'static,
{
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            return SubmitOrderResponse::failed(StatusCode::BAD_REQUEST, rejection.body_text())
        }
    };

    let session = state.session(&cookies);
    match state
        .orders
        .submit(session, req.email, req.lines, req.shipping)
        .await
    {
        Ok(placed) => {
            let body = SubmitOrderResponse {
                success: true,
                order_id: Some(placed.order.id),
                error: None,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e) => {
            if e.status_code().is_server_error() {
                tracing::error!(error = ?e, "order submission failed");
            }
            SubmitOrderResponse::failed(e.status_code(), e.public_message())
        }
    }
}

pub async fn list_orders<R>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<Json<Vec<OrderView>>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let orders = state.orders.list_orders().await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

pub async fn get_order<R>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let id = parse_order_id(&id)?;
    let order = state.orders.get_order(id).await?;
    Ok(Json(order.into()))
}

pub async fn update_status<R>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderView>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let id = parse_order_id(&id)?;
    let order = state.orders.update_status(id, req.status).await?;
    Ok(Json(order.into()))
}

pub async fn delete_order<R>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let id = parse_order_id(&id)?;
    state.orders.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
