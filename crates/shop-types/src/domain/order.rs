use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type OrderId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Open,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(OrderStatus::Open),
            "shipped" => Ok(OrderStatus::Shipped),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => anyhow::bail!("unknown order status {other:?}"),
        }
    }
}

/// Optional delivery details captured at checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShippingInfo {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl ShippingInfo {
    /// Blank form fields become `None`.
    pub fn normalized(self) -> Self {
        fn clean(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        Self {
            name: clean(self.name),
            address: clean(self.address),
            phone: clean(self.phone),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewOrderLine {
    pub ean: Option<String>,
    pub description: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

/// A validated order that has not been written to the ledger yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub email: String,
    pub lines: Vec<NewOrderLine>,
    pub shipping: ShippingInfo,
}

impl NewOrder {
    pub fn new(
        email: String,
        lines: Vec<NewOrderLine>,
        shipping: ShippingInfo,
    ) -> anyhow::Result<Self> {
        let email = email.trim().to_string();
        if email.is_empty() {
            anyhow::bail!("email empty");
        }
        if !email.contains('@') {
            anyhow::bail!("invalid email");
        }
        if lines.is_empty() {
            anyhow::bail!("lines empty");
        }
        for line in &lines {
            if line.quantity == 0 {
                anyhow::bail!("line quantity must be > 0");
            }
            if line.unit_price_cents < 0 {
                anyhow::bail!("line price must not be negative");
            }
        }
        Ok(Self {
            email,
            lines,
            shipping: shipping.normalized(),
        })
    }

    pub fn total_cents(&self) -> i64 {
        self.lines
            .iter()
            .map(|l| l.quantity as i64 * l.unit_price_cents)
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: OrderId,
    pub ean: Option<String>,
    pub description: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl OrderLine {
    pub fn line_total_cents(&self) -> i64 {
        self.quantity as i64 * self.unit_price_cents
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub email: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub shipping: ShippingInfo,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// The order total. Derived from the lines on every call, never stored.
    pub fn total_cents(&self) -> i64 {
        self.lines.iter().map(OrderLine::line_total_cents).sum()
    }
}
