//! HTTP transport layer

pub mod routes;
pub mod server_core;
pub mod types;

pub use server_core::{create_router, AppState, Server};
