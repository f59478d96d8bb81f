pub mod agent;
pub mod server;

pub use server::config::{configure_app, serve, AppState, Config};
pub use server::errors::ApiError;
