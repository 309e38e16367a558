use serde::{Deserialize, Serialize};

use crate::domain::money::to_cents;

/// Live stock and price data for one EAN, as reported by the distributor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InventoryInfo {
    pub price: f64,
    pub stock: f64,
    pub fulfillment_rate: f64,
    pub handling_time: f64,
}

impl InventoryInfo {
    pub fn price_cents(&self) -> i64 {
        to_cents(self.price)
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductContent {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
}
