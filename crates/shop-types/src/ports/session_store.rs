use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::ports::order_repository::RepoError;

pub type SessionId = Uuid;

/// Server-side storage for per-visitor carts.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// The stored cart, or an empty one for unknown sessions.
    async fn load(&self, session: SessionId) -> Result<Cart, RepoError>;
    /// Replaces the whole cart of `session`.
    async fn save(&self, session: SessionId, cart: Cart) -> Result<(), RepoError>;
}
