use std::sync::Arc;
use std::time::Duration;

use shop_client::{Credentials, InventoryClient, SendGridMailer};
use shop_hex::application::cart_service::CartService;
use shop_hex::application::inbox_service::InboxService;
use shop_hex::application::order_service::OrderService;
use shop_hex::config::Config;
use shop_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use shop_repo::session::MemorySessionStore;
use shop_repo::{build_repo, Repo};
use shop_types::domain::catalog::Catalog;
use tracing_subscriber::EnvFilter;

/// Stands in for the distributor when no credentials are set; never contacted.
const UNCONFIGURED_INVENTORY_URL: &str = "http://inventory.invalid/";
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for SESSION_SECRET / DATABASE_URL / PORT when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    let catalog = Catalog::load(&config.catalog_path)?;
    if catalog.is_empty() {
        tracing::warn!(path = %config.catalog_path.display(), "catalog is empty");
    } else {
        tracing::info!(products = catalog.len(), "catalog loaded");
    }
    let catalog = Arc::new(catalog);

    let oracle = Arc::new(match &config.inventory {
        Some(inv) => InventoryClient::new(
            &inv.base_url,
            Some(Credentials {
                user: inv.user.clone(),
                password: inv.password.clone(),
            }),
        )?,
        None => InventoryClient::new(UNCONFIGURED_INVENTORY_URL, None)?,
    });
    let mailer = Arc::new(match &config.sendgrid_base_url {
        Some(url) => SendGridMailer::with_base_url(
            url,
            config.sendgrid_api_key.clone(),
            config.email_sender.clone(),
        )?,
        None => SendGridMailer::new(config.sendgrid_api_key.clone(), config.email_sender.clone())?,
    });

    let sessions = MemorySessionStore::with_idle_timeout(config.session_idle_timeout);
    sessions.spawn_sweeper(SESSION_SWEEP_INTERVAL);
    let carts = CartService::new(catalog, Arc::new(sessions));
    let orders = OrderService::new(
        repo,
        carts.clone(),
        oracle.clone(),
        mailer.clone(),
        config.pricing_policy,
    );
    let inbox = InboxService::new(mailer);
    tracing::info!(pricing = ?config.pricing_policy, "storefront ready");

    let state = AppState::new(carts, orders, inbox, oracle, &config.session_secret);
    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
        secure_cookies: config.secure_cookies,
    };

    let http = HttpServer::new(state, server_cfg).await?;
    http.run().await
}
