use async_trait::async_trait;
use dashmap::DashMap;
use shop_types::domain::cart::Cart;
use shop_types::ports::order_repository::RepoError;
use shop_types::ports::session_store::{SessionId, SessionStore};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

struct Entry {
    cart: Cart,
    touched: Instant,
}

impl Entry {
    fn is_expired(&self, idle_timeout: Duration) -> bool {
        self.touched.elapsed() >= idle_timeout
    }
}

/// Process-local session storage. Carts vanish on restart and after
/// `idle_timeout` without a load or save.
#[derive(Clone)]
pub struct MemorySessionStore {
    carts: Arc<DashMap<SessionId, Entry>>,
    idle_timeout: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            carts: Arc::new(DashMap::new()),
            idle_timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.carts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carts.is_empty()
    }

    /// Drops every idle cart, returning how many went.
    pub fn purge_expired(&self) -> usize {
        let before = self.carts.len();
        self.carts.retain(|_, e| !e.is_expired(self.idle_timeout));
        before.saturating_sub(self.carts.len())
    }

    /// Purges idle carts every `every` until the runtime shuts down.
    pub fn spawn_sweeper(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(every);
            loop {
                ticks.tick().await;
                let purged = store.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = store.len(), "idle carts purged");
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session: SessionId) -> Result<Cart, RepoError> {
        if let Some(mut entry) = self.carts.get_mut(&session) {
            if !entry.is_expired(self.idle_timeout) {
                entry.touched = Instant::now();
                return Ok(entry.cart.clone());
            }
        }
        self.carts
            .remove_if(&session, |_, e| e.is_expired(self.idle_timeout));
        Ok(Cart::default())
    }

    async fn save(&self, session: SessionId, cart: Cart) -> Result<(), RepoError> {
        if cart.is_empty() {
            self.carts.remove(&session);
        } else {
            self.carts.insert(
                session,
                Entry {
                    cart,
                    touched: Instant::now(),
                },
            );
        }
        Ok(())
    }
}
