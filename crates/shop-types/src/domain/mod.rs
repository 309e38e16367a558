pub mod cancel_token;
pub mod cart;
pub mod catalog;
pub mod inventory;
pub mod money;
pub mod order;
pub mod product;
