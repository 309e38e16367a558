use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shop_types::domain::inventory::{InventoryInfo, ProductContent};
use shop_types::ports::inventory_oracle::InventoryOracle;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone)]
pub struct InventoryClientBuilder {
    base: Url,
    credentials: Option<Credentials>,
    timeout: Duration,
    client: Option<reqwest::Client>,
}

/// Client for the book distributor's EAN lookup API.
///
/// Without credentials every lookup answers `None` without touching the network.
#[derive(Clone)]
pub struct InventoryClient {
    base: Url,
    credentials: Option<Credentials>,
    client: reqwest::Client,
}

impl InventoryClient {
    pub fn new(base_url: &str, credentials: Option<Credentials>) -> anyhow::Result<Self> {
        Self::builder(base_url)?.with_credentials(credentials).build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<InventoryClientBuilder> {
        let mut base = Url::parse(base_url).context("invalid inventory base url")?;
        // Url::join drops the last segment unless the path ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(InventoryClientBuilder {
            base,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, ean: &str) -> Option<T> {
        let Some(creds) = self.credentials.as_ref() else {
            tracing::debug!(ean, "inventory api not configured");
            return None;
        };
        let url = match self.url(path) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(ean, error = %e, "inventory url invalid");
                return None;
            }
        };

        let res = self
            .client
            .get(url)
            .query(&[
                ("ean", ean),
                ("user", creds.user.as_str()),
                ("password", creds.password.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status());
        // without_url keeps the credentials out of the logs.
        let res = match res {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(ean, error = %e.without_url(), "inventory lookup failed");
                return None;
            }
        };

        match res.json::<T>().await {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(ean, error = %e.without_url(), "inventory payload malformed");
                None
            }
        }
    }
}

#[async_trait]
impl InventoryOracle for InventoryClient {
    async fn lookup_price(&self, ean: &str) -> Option<InventoryInfo> {
        let payload: PricePayload = self.fetch("price", ean).await?;
        Some(payload.normalize(ean))
    }

    async fn lookup_content(&self, ean: &str) -> Option<ProductContent> {
        let payload: ContentPayload = self.fetch("content", ean).await?;
        Some(payload.into())
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}

impl InventoryClientBuilder {
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<InventoryClient> {
        let client = match self.client {
            Some(c) => c,
            None => reqwest::Client::builder().timeout(self.timeout).build()?,
        };
        Ok(InventoryClient {
            base: self.base,
            credentials: self.credentials,
            client,
        })
    }
}

/// The distributor sends numbers either as JSON numbers or as German decimal strings.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum LocaleNumber {
    Number(f64),
    Text(String),
}

impl LocaleNumber {
    fn value(&self, field: &str, ean: &str) -> f64 {
        match self {
            LocaleNumber::Number(n) => *n,
            LocaleNumber::Text(s) => parse_locale_decimal(s).unwrap_or_else(|| {
                tracing::warn!(ean, field, raw = %s, "unparseable number, using 0");
                0.0
            }),
        }
    }
}

/// Parses `"12,50"`, `"1.234,50"` and `"12.50"` alike.
///
/// Without a comma, dots are read as thousands separators only when every
/// group after the first has exactly three digits (`"12.500"` is 12500);
/// otherwise the dot is the decimal point.
pub fn parse_locale_decimal(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let normalized = if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else if is_thousands_grouped(s) {
        s.replace('.', "")
    } else {
        s.to_string()
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_thousands_grouped(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let mut groups = digits.split('.');
    let Some(head) = groups.next() else {
        return false;
    };
    let head_ok = (1..=3).contains(&head.len())
        && !head.starts_with('0')
        && head.bytes().all(|b| b.is_ascii_digit());
    let mut tail = groups.peekable();
    head_ok
        && tail.peek().is_some()
        && tail.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Deserialize, Debug)]
struct PricePayload {
    #[serde(default, alias = "preis")]
    price: Option<LocaleNumber>,
    #[serde(default, alias = "bestand")]
    stock: Option<LocaleNumber>,
    #[serde(default, alias = "lieferquote", alias = "fulfillmentRate")]
    fulfillment_rate: Option<LocaleNumber>,
    #[serde(default, alias = "lieferzeit", alias = "handlingTime")]
    handling_time: Option<LocaleNumber>,
}

impl PricePayload {
    fn normalize(self, ean: &str) -> InventoryInfo {
        let num = |v: &Option<LocaleNumber>, field: &str| {
            v.as_ref().map(|n| n.value(field, ean)).unwrap_or(0.0)
        };
        InventoryInfo {
            price: num(&self.price, "price"),
            stock: num(&self.stock, "stock"),
            fulfillment_rate: num(&self.fulfillment_rate, "fulfillment_rate"),
            handling_time: num(&self.handling_time, "handling_time"),
        }
    }
}

#[derive(Deserialize, Debug)]
struct ContentPayload {
    #[serde(default, alias = "titel")]
    title: Option<String>,
    #[serde(default, alias = "autor")]
    author: Option<String>,
    #[serde(default, alias = "beschreibung")]
    description: Option<String>,
    #[serde(default, alias = "cover", alias = "coverUrl")]
    cover_url: Option<String>,
}

impl From<ContentPayload> for ProductContent {
    fn from(p: ContentPayload) -> Self {
        Self {
            title: p.title,
            author: p.author,
            description: p.description,
            cover_url: p.cover_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn creds() -> Option<Credentials> {
        Some(Credentials {
            user: "shop".into(),
            password: "geheim".into(),
        })
    }

    #[test]
    fn locale_decimals() {
        assert_eq!(parse_locale_decimal("12,50"), Some(12.5));
        assert_eq!(parse_locale_decimal("1.234,50"), Some(1234.5));
        assert_eq!(parse_locale_decimal(" 7.25 "), Some(7.25));
        assert_eq!(parse_locale_decimal(""), None);
        assert_eq!(parse_locale_decimal("n/a"), None);
    }

    #[test]
    fn dot_grouped_thousands() {
        assert_eq!(parse_locale_decimal("12.500"), Some(12500.0));
        assert_eq!(parse_locale_decimal("1.234.567"), Some(1234567.0));
        assert_eq!(parse_locale_decimal("-2.000"), Some(-2000.0));
        // Not three-digit groups, so the dot is a decimal point.
        assert_eq!(parse_locale_decimal("12.50"), Some(12.5));
        assert_eq!(parse_locale_decimal("0.125"), Some(0.125));
        assert_eq!(parse_locale_decimal("1234.500"), Some(1234.5));
    }

    #[tokio::test]
    async fn price_lookup_normalizes_fields() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/price")
                .query_param("ean", "9783000000001")
                .query_param("user", "shop")
                .query_param("password", "geheim");
            then.status(200).json_body(json!({
                "preis": "12,50",
                "bestand": 3,
                "lieferquote": "97,5"
            }));
        });

        let client = InventoryClient::new(&server.url("/api"), creds()).unwrap();
        let info = client.lookup_price("9783000000001").await.unwrap();
        assert_eq!(info.price, 12.5);
        assert_eq!(info.price_cents(), 1250);
        assert_eq!(info.stock, 3.0);
        assert_eq!(info.fulfillment_rate, 97.5);
        assert_eq!(info.handling_time, 0.0);
        mock.assert();
    }

    #[tokio::test]
    async fn content_lookup() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/content").query_param("ean", "978");
            then.status(200).json_body(json!({
                "titel": "Der Grüffelo",
                "autor": "Julia Donaldson"
            }));
        });

        let client = InventoryClient::new(&server.base_url(), creds()).unwrap();
        let content = client.lookup_content("978").await.unwrap();
        assert_eq!(content.title.as_deref(), Some("Der Grüffelo"));
        assert_eq!(content.author.as_deref(), Some("Julia Donaldson"));
        assert_eq!(content.cover_url, None);
    }

    #[tokio::test]
    async fn failures_are_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/price").query_param("ean", "500");
            then.status(500);
        });
        server.mock(|when, then| {
            when.method(GET).path("/price").query_param("ean", "bad");
            then.status(200).body("<html>wartung</html>");
        });
        server.mock(|when, then| {
            when.method(GET).path("/price").query_param("ean", "slow");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(json!({ "price": 1.0 }));
        });

        let client = InventoryClient::builder(&server.base_url())
            .unwrap()
            .with_credentials(creds())
            .with_timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        assert!(client.lookup_price("500").await.is_none());
        assert!(client.lookup_price("bad").await.is_none());
        assert!(client.lookup_price("slow").await.is_none());
    }

    #[tokio::test]
    async fn unconfigured_client_never_calls_out() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/price");
            then.status(200).json_body(json!({ "price": 1.0 }));
        });

        let client = InventoryClient::new(&server.base_url(), None).unwrap();
        assert!(!client.is_configured());
        assert!(client.lookup_price("978").await.is_none());
        mock.assert_hits(0);
    }
}
