use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use shop_types::domain::cancel_token::CancelToken;
use shop_types::domain::order::{NewOrder, Order, OrderId, OrderLine, OrderStatus};
use shop_types::ports::order_repository::{OrderRepository, RepoError};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub orders: Arc<DashMap<OrderId, Order>>,
    pub tokens: Arc<DashMap<i64, CancelToken>>,
    ids: Arc<Ids>,
}

#[derive(Default)]
struct Ids {
    order: AtomicI64,
    line: AtomicI64,
    token: AtomicI64,
}

impl Ids {
    fn next(counter: &AtomicI64) -> i64 {
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(DashMap::new()),
            tokens: Arc::new(DashMap::new()),
            ids: Arc::new(Ids::default()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create(&self, order: NewOrder) -> Result<Order, RepoError> {
        let id = Ids::next(&self.ids.order);
        let lines = order
            .lines
            .into_iter()
            .map(|l| OrderLine {
                id: Ids::next(&self.ids.line),
                order_id: id,
                ean: l.ean,
                description: l.description,
                quantity: l.quantity,
                unit_price_cents: l.unit_price_cents,
            })
            .collect();
        let stored = Order {
            id,
            email: order.email,
            status: OrderStatus::Open,
            created_at: Utc::now(),
            shipping: order.shipping,
            lines,
        };
        self.orders.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(&id).map(|r| r.clone()))
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        let mut all: Vec<Order> = self.orders.iter().map(|kv| kv.value().clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(all)
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        if let Some(mut v) = self.orders.get_mut(&id) {
            v.status = status;
            return Ok(Some(v.clone()));
        }
        Ok(None)
    }

    async fn delete(&self, id: OrderId) -> Result<bool, RepoError> {
        let removed = self.orders.remove(&id).is_some();
        if removed {
            self.tokens.retain(|_, t| t.order_id != id);
        }
        Ok(removed)
    }

    async fn issue_cancel_token(
        &self,
        order_id: OrderId,
        token: String,
    ) -> Result<CancelToken, RepoError> {
        if !self.orders.contains_key(&order_id) {
            return Err(RepoError::DbError(format!("order {order_id} does not exist")));
        }
        if self.tokens.iter().any(|t| t.token == token) {
            return Err(RepoError::DbError("duplicate cancel token".into()));
        }
        let issued = CancelToken {
            id: Ids::next(&self.ids.token),
            order_id,
            token,
            created_at: Utc::now(),
        };
        self.tokens.insert(issued.id, issued.clone());
        Ok(issued)
    }

    async fn cancel_tokens(&self, order_id: OrderId) -> Result<Vec<CancelToken>, RepoError> {
        let mut tokens: Vec<CancelToken> = self
            .tokens
            .iter()
            .filter(|t| t.order_id == order_id)
            .map(|t| t.value().clone())
            .collect();
        tokens.sort_by_key(|t| t.id);
        Ok(tokens)
    }
}
