use async_trait::async_trait;

use crate::domain::inventory::{InventoryInfo, ProductContent};

/// The distributor's EAN-keyed stock, price and content feed.
///
/// Lookups never fail: any transport or payload problem is reported as
/// `None` and callers decide what an unknown answer means for them.
#[async_trait]
pub trait InventoryOracle: Send + Sync + 'static {
    async fn lookup_price(&self, ean: &str) -> Option<InventoryInfo>;
    async fn lookup_content(&self, ean: &str) -> Option<ProductContent>;
    /// Whether credentials are present, i.e. whether lookups can succeed at all.
    fn is_configured(&self) -> bool;
}
