use serde::Deserialize;
use shop_types::domain::order::NewOrderLine;
use shop_types::ports::inventory_oracle::InventoryOracle;
use std::str::FromStr;

/// Where the unit price of an order line comes from at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PricingPolicy {
    /// Every line with an EAN takes the distributor's current price. An
    /// unknown price aborts the checkout.
    LiveOracle,
    /// The price captured in the cart is final.
    CartSnapshot,
}

impl FromStr for PricingPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" | "oracle" => Ok(PricingPolicy::LiveOracle),
            "snapshot" | "cart" => Ok(PricingPolicy::CartSnapshot),
            other => anyhow::bail!("unknown pricing policy {other:?}"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PricingError {
    #[error("inventory unavailable for EAN {0}")]
    Unavailable(String),
    #[error("no valid price for EAN {0}")]
    NoPrice(String),
}

/// Applies `policy` to `lines`, returning them with their final unit prices.
pub async fn reprice(
    policy: PricingPolicy,
    oracle: &dyn InventoryOracle,
    lines: Vec<NewOrderLine>,
) -> Result<Vec<NewOrderLine>, PricingError> {
    if policy == PricingPolicy::CartSnapshot {
        return Ok(lines);
    }

    let mut priced = Vec::with_capacity(lines.len());
    for mut line in lines {
        if let Some(ean) = line.ean.as_deref() {
            let info = oracle
                .lookup_price(ean)
                .await
                .ok_or_else(|| PricingError::Unavailable(ean.to_string()))?;
            let cents = info.price_cents();
            if cents <= 0 {
                return Err(PricingError::NoPrice(ean.to_string()));
            }
            if cents != line.unit_price_cents {
                tracing::info!(
                    ean,
                    old = line.unit_price_cents,
                    new = cents,
                    "line repriced from inventory"
                );
            }
            line.unit_price_cents = cents;
        }
        priced.push(line);
    }
    Ok(priced)
}
