//! Outbound HTTP adapters: the distributor's inventory API and the mail provider.

pub mod inventory;
pub mod mailer;

pub use inventory::{Credentials, InventoryClient};
pub use mailer::SendGridMailer;
