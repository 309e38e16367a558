use std::sync::Arc;

use shop_types::domain::cart::{Cart, CartLine};
use shop_types::domain::catalog::Catalog;
use shop_types::domain::product::ProductId;
use shop_types::ports::session_store::{SessionId, SessionStore};

use crate::errors::AppError;

/// Session-scoped cart operations. Every mutation writes the whole cart back.
#[derive(Clone)]
pub struct CartService {
    catalog: Arc<Catalog>,
    sessions: Arc<dyn SessionStore>,
}

impl CartService {
    pub fn new(catalog: Arc<Catalog>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { catalog, sessions }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn get(&self, session: SessionId) -> Result<Cart, AppError> {
        Ok(self.sessions.load(session).await?)
    }

    pub async fn add(&self, session: SessionId, product_id: ProductId) -> Result<Cart, AppError> {
        let product = self
            .catalog
            .get(product_id)
            .ok_or_else(|| AppError::NotFound(format!("product {}", product_id)))?;
        let cart = self.get(session).await?.add(product);
        self.sessions.save(session, cart.clone()).await?;
        tracing::debug!(%session, product_id, "added to cart");
        Ok(cart)
    }

    pub async fn remove(
        &self,
        session: SessionId,
        product_id: ProductId,
    ) -> Result<Cart, AppError> {
        let cart = self.get(session).await?.remove(product_id);
        self.sessions.save(session, cart.clone()).await?;
        Ok(cart)
    }

    pub async fn total(&self, session: SessionId) -> Result<i64, AppError> {
        Ok(self.get(session).await?.total_cents())
    }

    /// Removes the ordered quantities from the session's current cart.
    pub async fn settle(&self, session: SessionId, ordered: &[CartLine]) -> Result<Cart, AppError> {
        let cart = self.get(session).await?.settle(ordered);
        self.sessions.save(session, cart.clone()).await?;
        Ok(cart)
    }

    pub async fn clear(&self, session: SessionId) -> Result<(), AppError> {
        self.sessions.save(session, Cart::new()).await?;
        Ok(())
    }
}
