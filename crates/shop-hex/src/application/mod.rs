pub mod cart_service;
pub mod inbox_service;
pub mod order_service;
pub mod pricing;
