use axum::{
    routing::{get, patch, post},
    serve, Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_cookies::{CookieManagerLayer, Cookies, Key};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::cart_service::CartService;
use crate::application::inbox_service::InboxService;
use crate::application::order_service::OrderService;
use crate::inbound::http::session::{cookie_key, session_id};
use crate::inbound::http::{orders_api, storefront};
use shop_types::domain::catalog::Catalog;
use shop_types::ports::inventory_oracle::InventoryOracle;
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::session_store::SessionId;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
    pub secure_cookies: bool,
}

/// Everything the handlers share. Only the catalog is global; carts live in
/// the session store and orders in the ledger.
pub struct AppState<R: OrderRepository> {
    pub carts: CartService,
    pub orders: OrderService<R>,
    pub inbox: InboxService,
    pub oracle: Arc<dyn InventoryOracle>,
    cookie_key: Key,
    secure_cookies: bool,
}

impl<R: OrderRepository> AppState<R> {
    pub fn new(
        carts: CartService,
        orders: OrderService<R>,
        inbox: InboxService,
        oracle: Arc<dyn InventoryOracle>,
        session_secret: &str,
    ) -> Self {
        Self {
            carts,
            orders,
            inbox,
            oracle,
            cookie_key: cookie_key(session_secret),
            secure_cookies: true,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.carts.catalog()
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    pub fn session(&self, cookies: &Cookies) -> SessionId {
        session_id(cookies, &self.cookie_key, self.secure_cookies)
    }
}

#[derive(Clone)]
pub struct HttpServer<R>
where
    R: OrderRepository,
{
    pub state: Arc<AppState<R>>,
    pub config: HttpServerConfig,
}

impl<R> HttpServer<R>
where
    R: OrderRepository + Send + Sync + 'static,
{
    pub async fn new(mut state: AppState<R>, config: HttpServerConfig) -> anyhow::Result<Self> {
        state.secure_cookies = config.secure_cookies;
        Ok(Self {
            state: Arc::new(state),
            config,
        })
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        Router::new()
            .route("/health", get(health))
            .route("/", get(storefront::index::<R>))
            .route("/produkt/{id}", get(storefront::product_detail::<R>))
            .route("/add-to-cart", post(storefront::add_to_cart::<R>))
            .route("/cart", get(storefront::cart::<R>))
            .route("/remove-from-cart/{id}", get(storefront::remove_from_cart::<R>))
            .route(
                "/checkout",
                get(storefront::checkout_view::<R>).post(storefront::checkout::<R>),
            )
            .route("/kontakt", get(storefront::contact_view))
            .route("/kontakt-submit", post(storefront::contact_submit::<R>))
            .route("/newsletter", post(storefront::newsletter::<R>))
            .route("/danke", get(storefront::thanks))
            .route("/kontaktdanke", get(storefront::contact_thanks))
            .route("/bestelldanke", get(storefront::order_thanks))
            .route("/bestellung", post(orders_api::submit_order::<R>))
            .route("/bestellungen", get(orders_api::list_orders::<R>))
            .route(
                "/bestellung/{id}",
                get(orders_api::get_order::<R>).delete(orders_api::delete_order::<R>),
            )
            .route("/bestellung/{id}/status", patch(orders_api::update_status::<R>))
            .layer(CookieManagerLayer::new())
            .layer(trace_layer)
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}
