use std::fmt::Write as _;
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use shop_types::domain::cancel_token::CancelToken;
use shop_types::domain::cart::CartLine;
use shop_types::domain::money::format_eur;
use shop_types::domain::order::{
    NewOrder, NewOrderLine, Order, OrderId, OrderStatus, ShippingInfo,
};
use shop_types::ports::inventory_oracle::InventoryOracle;
use shop_types::ports::notifier::{Attachment, Email, Notifier};
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::session_store::SessionId;

use crate::application::cart_service::CartService;
use crate::application::pricing::{reprice, PricingPolicy};
use crate::errors::AppError;

const CANCEL_TOKEN_LEN: usize = 32;

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    /// `None` if the order was stored but the token could not be.
    pub cancel_token: Option<CancelToken>,
}

/// What happens to the session's cart once an order is stored.
enum Settlement {
    /// Lines came from outside the cart; empty it.
    ClearCart,
    /// Lines came from the cart; take away only what was ordered.
    Ordered(Vec<CartLine>),
}

pub struct OrderService<R: OrderRepository> {
    repo: R,
    carts: CartService,
    oracle: Arc<dyn InventoryOracle>,
    notifier: Arc<dyn Notifier>,
    pricing: PricingPolicy,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(
        repo: R,
        carts: CartService,
        oracle: Arc<dyn InventoryOracle>,
        notifier: Arc<dyn Notifier>,
        pricing: PricingPolicy,
    ) -> Self {
        Self {
            repo,
            carts,
            oracle,
            notifier,
            pricing,
        }
    }

    pub fn pricing(&self) -> PricingPolicy {
        self.pricing
    }

    /// Turns the session's cart into an order.
    pub async fn checkout(
        &self,
        session: SessionId,
        email: String,
        shipping: ShippingInfo,
    ) -> Result<PlacedOrder, AppError> {
        let cart = self.carts.get(session).await?;
        if cart.is_empty() {
            return Err(AppError::BadRequest("cart is empty".into()));
        }
        let catalog = self.carts.catalog();
        let lines = cart
            .lines()
            .iter()
            .map(|l| NewOrderLine {
                ean: catalog.get(l.id).and_then(|p| p.ean.clone()),
                description: l.title.clone(),
                quantity: l.quantity,
                unit_price_cents: l.price_cents,
            })
            .collect();
        let ordered = cart.lines().to_vec();
        self.place(session, email, lines, shipping, Settlement::Ordered(ordered))
            .await
    }

    /// Validates, prices and stores an order in one transaction.
    ///
    /// Nothing is written and the session's cart is left alone unless the
    /// whole order is stored. Afterwards the cart is emptied, a cancel token
    /// is issued and a confirmation mail is sent in the background; failures
    /// in those steps are logged and do not undo the order.
    pub async fn submit(
        &self,
        session: SessionId,
        email: String,
        lines: Vec<NewOrderLine>,
        shipping: ShippingInfo,
    ) -> Result<PlacedOrder, AppError> {
        self.place(session, email, lines, shipping, Settlement::ClearCart)
            .await
    }

    async fn place(
        &self,
        session: SessionId,
        email: String,
        lines: Vec<NewOrderLine>,
        shipping: ShippingInfo,
        settlement: Settlement,
    ) -> Result<PlacedOrder, AppError> {
        let mut order = NewOrder::new(email, lines, shipping)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        order.lines = reprice(self.pricing, self.oracle.as_ref(), order.lines)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "checkout aborted while pricing");
                AppError::OrderFailed(anyhow::Error::new(e))
            })?;

        let order = self.repo.create(order).await.map_err(|e| {
            tracing::error!(error = %e, "order transaction rolled back");
            AppError::OrderFailed(anyhow::Error::new(e))
        })?;
        tracing::info!(
            order_id = order.id,
            lines = order.lines.len(),
            total_cents = order.total_cents(),
            "order placed"
        );

        // Settled against the cart as it is now, not the checkout snapshot.
        let settled = match settlement {
            Settlement::ClearCart => self.carts.clear(session).await,
            Settlement::Ordered(lines) => self.carts.settle(session, &lines).await.map(|_| ()),
        };
        if let Err(e) = settled {
            tracing::warn!(order_id = order.id, error = %e, "cart not cleared after order");
        }

        let cancel_token = match self
            .repo
            .issue_cancel_token(order.id, generate_cancel_token())
            .await
        {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::error!(order_id = order.id, error = %e, "cancel token not stored");
                None
            }
        };

        self.send_confirmation(&order, cancel_token.as_ref());

        Ok(PlacedOrder {
            order,
            cancel_token,
        })
    }

    fn send_confirmation(&self, order: &Order, token: Option<&CancelToken>) {
        let email = confirmation_email(order, token);
        let notifier = self.notifier.clone();
        let order_id = order.id;
        tokio::spawn(async move {
            if let Err(e) = notifier.send(email).await {
                tracing::warn!(order_id, error = %e, "order confirmation not sent");
            }
        });
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order, AppError> {
        match self.repo.get(id).await? {
            Some(o) => Ok(o),
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.list().await?)
    }

    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, AppError> {
        match self.repo.update_status(id, status).await? {
            Some(o) => {
                tracing::info!(order_id = id, %status, "order status changed");
                Ok(o)
            }
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    pub async fn delete_order(&self, id: OrderId) -> Result<(), AppError> {
        if self.repo.delete(id).await? {
            tracing::info!(order_id = id, "order deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("order {}", id)))
        }
    }
}

fn generate_cancel_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CANCEL_TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn order_summary(order: &Order) -> String {
    let mut out = format!("Bestellnummer: {}\n\n", order.id);
    for line in &order.lines {
        let _ = writeln!(
            out,
            "{} x {} à {} = {}",
            line.quantity,
            line.description,
            format_eur(line.unit_price_cents),
            format_eur(line.line_total_cents())
        );
    }
    let _ = writeln!(out, "\nGesamt: {}", format_eur(order.total_cents()));
    out
}

pub(crate) fn confirmation_email(order: &Order, token: Option<&CancelToken>) -> Email {
    let summary = order_summary(order);
    let mut body = format!("Vielen Dank für Ihre Bestellung!\n\n{summary}");
    if let Some(t) = token {
        let _ = write!(
            body,
            "\nFalls Sie die Bestellung stornieren möchten, geben Sie bitte diesen Code an: {}\n",
            t.token
        );
    }
    Email {
        subject: format!("Ihre Bestellung Nr. {}", order.id),
        body,
        recipient: order.email.clone(),
        attachment: Some(Attachment {
            filename: format!("bestellung-{}.txt", order.id),
            mime_type: "text/plain".into(),
            content: summary.into_bytes(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shop_repo::memory::InMemoryRepo;
    use shop_repo::session::MemorySessionStore;
    use shop_types::domain::catalog::Catalog;
    use shop_types::domain::inventory::{InventoryInfo, ProductContent};
    use shop_types::ports::notifier::NotifyError;
    use uuid::Uuid;

    struct DownOracle;

    #[async_trait]
    impl InventoryOracle for DownOracle {
        async fn lookup_price(&self, _ean: &str) -> Option<InventoryInfo> {
            None
        }

        async fn lookup_content(&self, _ean: &str) -> Option<ProductContent> {
            None
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Notifier for FailingMailer {
        async fn send(&self, _email: Email) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("connection refused".into()))
        }

        fn shop_address(&self) -> Option<&str> {
            None
        }
    }

    /// Adds to the visitor's cart while the price lookup is in flight.
    struct BusyShopperOracle {
        carts: CartService,
        session: Uuid,
    }

    #[async_trait]
    impl InventoryOracle for BusyShopperOracle {
        async fn lookup_price(&self, _ean: &str) -> Option<InventoryInfo> {
            self.carts.add(self.session, 1).await.ok()?;
            self.carts.add(self.session, 2).await.ok()?;
            Some(InventoryInfo {
                price: 10.0,
                ..Default::default()
            })
        }

        async fn lookup_content(&self, _ean: &str) -> Option<ProductContent> {
            None
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::from_json(
                r#"[
                    {"id": 1, "name": "Jacominus", "kategorie": "Klassiker", "preis": 10.0, "ean": "123"},
                    {"id": 2, "name": "Grüffelo", "kategorie": "Monstergeschichten", "preis": 5.5}
                ]"#,
            )
            .unwrap(),
        )
    }

    fn service(repo: InMemoryRepo, pricing: PricingPolicy) -> OrderService<InMemoryRepo> {
        let carts = CartService::new(catalog(), Arc::new(MemorySessionStore::new()));
        OrderService::new(repo, carts, Arc::new(DownOracle), Arc::new(FailingMailer), pricing)
    }

    #[tokio::test]
    async fn lines_added_during_pricing_stay_in_cart() {
        let carts = CartService::new(catalog(), Arc::new(MemorySessionStore::new()));
        let s = Uuid::new_v4();
        let oracle = BusyShopperOracle {
            carts: carts.clone(),
            session: s,
        };
        let svc = OrderService::new(
            InMemoryRepo::new(),
            carts.clone(),
            Arc::new(oracle),
            Arc::new(FailingMailer),
            PricingPolicy::LiveOracle,
        );
        carts.add(s, 1).await.unwrap();

        let placed = svc.checkout(s, "a@b.com".into(), ShippingInfo::default()).await.unwrap();
        assert_eq!(placed.order.lines.len(), 1);
        assert_eq!(placed.order.lines[0].quantity, 1);

        let left = carts.get(s).await.unwrap();
        assert_eq!(left.lines().len(), 2);
        assert_eq!((left.lines()[0].id, left.lines()[0].quantity), (1, 1));
        assert_eq!((left.lines()[1].id, left.lines()[1].quantity), (2, 1));
    }

    #[tokio::test]
    async fn checkout_with_snapshot_prices_survives_mail_failure() {
        let repo = InMemoryRepo::new();
        let svc = service(repo.clone(), PricingPolicy::CartSnapshot);
        let s = Uuid::new_v4();
        svc.carts.add(s, 1).await.unwrap();
        svc.carts.add(s, 1).await.unwrap();
        svc.carts.add(s, 2).await.unwrap();

        let placed = svc.checkout(s, "a@b.com".into(), ShippingInfo::default()).await.unwrap();
        assert_eq!(placed.order.total_cents(), 2550);
        assert_eq!(placed.order.lines[0].ean.as_deref(), Some("123"));
        assert!(placed.cancel_token.is_some());
        assert!(svc.carts.get(s).await.unwrap().is_empty());

        let got = svc.get_order(placed.order.id).await.unwrap();
        assert_eq!(got.lines.len(), 2);
    }

    #[tokio::test]
    async fn unavailable_oracle_leaves_no_trace() {
        let repo = InMemoryRepo::new();
        let svc = service(repo.clone(), PricingPolicy::LiveOracle);
        let s = Uuid::new_v4();
        svc.carts.add(s, 1).await.unwrap();

        let res = svc.checkout(s, "a@b.com".into(), ShippingInfo::default()).await;
        assert!(matches!(res, Err(AppError::OrderFailed(_))));
        assert!(repo.orders.is_empty());
        assert!(repo.tokens.is_empty());
        assert_eq!(svc.carts.get(s).await.unwrap().lines().len(), 1);
    }

    #[tokio::test]
    async fn empty_lines_or_missing_email_write_nothing() {
        let repo = InMemoryRepo::new();
        let svc = service(repo.clone(), PricingPolicy::CartSnapshot);
        let s = Uuid::new_v4();

        let res = svc.submit(s, "a@b.com".into(), vec![], ShippingInfo::default()).await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));

        let res = svc.checkout(s, "a@b.com".into(), ShippingInfo::default()).await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));

        svc.carts.add(s, 2).await.unwrap();
        let res = svc.checkout(s, "".into(), ShippingInfo::default()).await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
        assert!(repo.orders.is_empty());
        assert_eq!(svc.carts.get(s).await.unwrap().lines().len(), 1);
    }

    #[tokio::test]
    async fn not_found_paths() {
        let svc = service(InMemoryRepo::new(), PricingPolicy::CartSnapshot);
        assert!(matches!(svc.get_order(7).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            svc.update_status(7, OrderStatus::Shipped).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(svc.delete_order(7).await, Err(AppError::NotFound(_))));
    }

    #[test]
    fn confirmation_mail_lists_lines_and_token() {
        let order = Order {
            id: 12,
            email: "kunde@example.com".into(),
            status: OrderStatus::Open,
            created_at: chrono::Utc::now(),
            shipping: ShippingInfo::default(),
            lines: vec![shop_types::domain::order::OrderLine {
                id: 1,
                order_id: 12,
                ean: None,
                description: "Jacominus".into(),
                quantity: 2,
                unit_price_cents: 1000,
            }],
        };
        let token = CancelToken {
            id: 1,
            order_id: 12,
            token: "ABC".into(),
            created_at: chrono::Utc::now(),
        };
        let mail = confirmation_email(&order, Some(&token));
        assert_eq!(mail.recipient, "kunde@example.com");
        assert!(mail.body.contains("2 x Jacominus à 10,00 € = 20,00 €"));
        assert!(mail.body.contains("Gesamt: 20,00 €"));
        assert!(mail.body.contains("ABC"));
        let attachment = mail.attachment.unwrap();
        assert_eq!(attachment.filename, "bestellung-12.txt");
        assert!(!String::from_utf8(attachment.content).unwrap().contains("ABC"));
    }

    #[test]
    fn tokens_are_random_alphanumerics() {
        let a = generate_cancel_token();
        let b = generate_cancel_token();
        assert_eq!(a.len(), CANCEL_TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
