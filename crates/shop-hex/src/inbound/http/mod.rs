pub mod flash;
pub mod orders_api;
pub mod server;
pub mod session;
pub mod storefront;

pub use server::{AppState, HttpServer, HttpServerConfig};
