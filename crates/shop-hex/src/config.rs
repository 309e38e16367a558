use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::pricing::PricingPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    pub base_url: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub session_secret: String,
    pub secure_cookies: bool,
    /// Carts untouched for this long are discarded.
    pub session_idle_timeout: Duration,
    pub catalog_path: PathBuf,
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_base_url: Option<String>,
    pub email_sender: Option<String>,
    pub inventory: Option<InventoryConfig>,
    pub pricing_policy: PricingPolicy,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let Some(session_secret) = var("SESSION_SECRET") else {
            anyhow::bail!("SESSION_SECRET is not set");
        };

        let server_port = var("PORT").unwrap_or_else(|| "5000".into());
        let database_url = var("DATABASE_URL");
        let catalog_path = var("CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("produkte.json"));
        let secure_cookies = match var("SESSION_COOKIE_SECURE") {
            Some(v) => parse_bool(&v)?,
            None => true,
        };

        let session_idle_timeout = match var("SESSION_IDLE_MINUTES") {
            Some(v) => {
                let minutes: u64 = v
                    .parse()
                    .map_err(|e| anyhow::anyhow!("SESSION_IDLE_MINUTES {v:?}: {e}"))?;
                if minutes == 0 {
                    anyhow::bail!("SESSION_IDLE_MINUTES must be positive");
                }
                Duration::from_secs(minutes * 60)
            }
            None => Duration::from_secs(120 * 60),
        };

        let inventory = match (
            var("INVENTORY_API_URL"),
            var("INVENTORY_API_USER"),
            var("INVENTORY_API_PASSWORD"),
        ) {
            (Some(base_url), Some(user), Some(password)) => Some(InventoryConfig {
                base_url,
                user,
                password,
            }),
            (None, None, None) => None,
            _ => {
                tracing::warn!("inventory api partially configured, live lookups disabled");
                None
            }
        };

        let pricing_policy = match var("PRICING_POLICY") {
            Some(v) => v.parse()?,
            None if inventory.is_some() => PricingPolicy::LiveOracle,
            None => PricingPolicy::CartSnapshot,
        };
        if pricing_policy == PricingPolicy::LiveOracle && inventory.is_none() {
            tracing::warn!("live pricing without inventory api: orders with EAN lines will fail");
        }

        let sendgrid_api_key = var("SENDGRID_API_KEY");
        let email_sender = var("EMAIL_SENDER");
        if sendgrid_api_key.is_none() || email_sender.is_none() {
            tracing::warn!("mail provider not configured, outgoing mail is dropped");
        }

        Ok(Self {
            server_port,
            database_url,
            session_secret,
            secure_cookies,
            session_idle_timeout,
            catalog_path,
            sendgrid_api_key,
            sendgrid_base_url: var("SENDGRID_BASE_URL"),
            email_sender,
            inventory,
            pricing_policy,
        })
    }
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}
