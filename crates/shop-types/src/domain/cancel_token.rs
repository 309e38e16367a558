use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::order::OrderId;

/// Opaque credential issued once per confirmed order.
///
/// Nothing redeems it yet; it is handed to the customer in the confirmation
/// mail and stored alongside the order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancelToken {
    pub id: i64,
    pub order_id: OrderId,
    pub token: String,
    pub created_at: DateTime<Utc>,
}
