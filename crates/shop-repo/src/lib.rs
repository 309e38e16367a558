#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use shop_types::domain::cancel_token::CancelToken;
use shop_types::domain::order::*;
use shop_types::ports::order_repository::{OrderRepository, RepoError};

#[cfg(feature = "memory")]
pub mod memory;
pub mod session;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://ibk-shop.db";

/// The ledger adapter selected at build time. SQLite wins when both features are on.
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(not(feature = "sqlite"))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        tracing::info!("using in-memory order ledger");
        Ok(Self::Memory(memory::InMemoryRepo::new()))
    }

    #[cfg(feature = "sqlite")]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_DATABASE_URL);
        tracing::info!(url, "using sqlite order ledger");
        let sqlite = sqlite::SqliteRepo::new(url).await?;
        Ok(Self::Sqlite(sqlite))
    }
}

macro_rules! delegate {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memory")]
            Repo::Memory($repo) => $call,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite($repo) => $call,
        }
    };
}

#[async_trait::async_trait]
impl OrderRepository for Repo {
    async fn create(&self, order: NewOrder) -> Result<Order, RepoError> {
        delegate!(self, r => r.create(order).await)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        delegate!(self, r => r.get(id).await)
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        delegate!(self, r => r.list().await)
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        delegate!(self, r => r.update_status(id, status).await)
    }

    async fn delete(&self, id: OrderId) -> Result<bool, RepoError> {
        delegate!(self, r => r.delete(id).await)
    }

    async fn issue_cancel_token(
        &self,
        order_id: OrderId,
        token: String,
    ) -> Result<CancelToken, RepoError> {
        delegate!(self, r => r.issue_cancel_token(order_id, token).await)
    }

    async fn cancel_tokens(&self, order_id: OrderId) -> Result<Vec<CancelToken>, RepoError> {
        delegate!(self, r => r.cancel_tokens(order_id).await)
    }
}
