//! HTTP front-end over the key-value client

pub mod http;
pub mod params;
pub mod server;
pub mod views;

pub use http::{create_router, AppState};
pub use params::{FormValues, QueryValues};
pub use server::Frontend;
pub use views::Views;
