use async_trait::async_trait;

use crate::domain::cancel_token::CancelToken;
use crate::domain::order::{NewOrder, Order, OrderId, OrderStatus};

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),
}

/// The order ledger.
///
/// `create` is all-or-nothing: either the header and every line are stored
/// and the returned order carries the generated id, or nothing is stored.
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn create(&self, order: NewOrder) -> Result<Order, RepoError>;
    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepoError>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Order>, RepoError>;
    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError>;
    /// Removes the order with its lines and tokens. `false` if it never existed.
    async fn delete(&self, id: OrderId) -> Result<bool, RepoError>;
    async fn issue_cancel_token(
        &self,
        order_id: OrderId,
        token: String,
    ) -> Result<CancelToken, RepoError>;
    async fn cancel_tokens(&self, order_id: OrderId) -> Result<Vec<CancelToken>, RepoError>;
}
