pub mod inventory_oracle;
pub mod notifier;
pub mod order_repository;
pub mod session_store;
