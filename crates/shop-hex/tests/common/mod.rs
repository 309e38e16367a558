#![allow(dead_code)]

use async_trait::async_trait;
use shop_hex::application::cart_service::CartService;
use shop_hex::application::inbox_service::InboxService;
use shop_hex::application::order_service::OrderService;
use shop_hex::application::pricing::PricingPolicy;
use shop_repo::memory::InMemoryRepo;
use shop_repo::session::MemorySessionStore;
use shop_types::domain::catalog::Catalog;
use shop_types::domain::inventory::{InventoryInfo, ProductContent};
use shop_types::ports::inventory_oracle::InventoryOracle;
use shop_types::ports::notifier::{Email, Notifier, NotifyError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CATALOG: &str = r#"[
    {"id": 1, "name": "Jacominus Gainsborough", "kategorie": "Klassiker", "preis": 10.0, "ean": "9783314104316"},
    {"id": 2, "name": "Der Grüffelo", "kategorie": "Monstergeschichten", "preis": 5.5},
    {"id": 3, "name": "Die kleine Raupe Nimmersatt", "kategorie": "Klassiker", "preis": 8.99, "ean": "9783806749902"}
]"#;

pub fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_json(CATALOG).unwrap())
}

/// Distributor stand-in answering from a fixed price table.
#[derive(Default)]
pub struct FakeOracle {
    pub prices: HashMap<String, f64>,
    pub configured: bool,
}

impl FakeOracle {
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn with_prices(prices: &[(&str, f64)]) -> Self {
        Self {
            prices: prices.iter().map(|(e, p)| (e.to_string(), *p)).collect(),
            configured: true,
        }
    }
}

#[async_trait]
impl InventoryOracle for FakeOracle {
    async fn lookup_price(&self, ean: &str) -> Option<InventoryInfo> {
        self.prices.get(ean).map(|&price| InventoryInfo {
            price,
            stock: 3.0,
            fulfillment_rate: 98.5,
            handling_time: 2.0,
        })
    }

    async fn lookup_content(&self, ean: &str) -> Option<ProductContent> {
        self.prices.get(ean).map(|_| ProductContent {
            title: Some("Titel".into()),
            author: Some("Autorin".into()),
            description: Some("Beschreibung".into()),
            cover_url: None,
        })
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

/// Notifier that keeps every mail it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Email>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }

    /// Confirmation mails are sent from a background task.
    pub async fn wait_for(&self, count: usize) -> Vec<Email> {
        for _ in 0..100 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, email: Email) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Transport("connection refused".into()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }

    fn shop_address(&self) -> Option<&str> {
        Some("shop@example.com")
    }
}

pub struct Shop {
    pub repo: InMemoryRepo,
    pub carts: CartService,
    pub orders: OrderService<InMemoryRepo>,
    pub inbox: InboxService,
    pub oracle: Arc<FakeOracle>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn shop(oracle: FakeOracle, notifier: RecordingNotifier, pricing: PricingPolicy) -> Shop {
    let repo = InMemoryRepo::new();
    let oracle = Arc::new(oracle);
    let notifier = Arc::new(notifier);
    let carts = CartService::new(catalog(), Arc::new(MemorySessionStore::new()));
    let orders = OrderService::new(
        repo.clone(),
        carts.clone(),
        oracle.clone(),
        notifier.clone(),
        pricing,
    );
    let inbox = InboxService::new(notifier.clone());
    Shop {
        repo,
        carts,
        orders,
        inbox,
        oracle,
        notifier,
    }
}

pub fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}
