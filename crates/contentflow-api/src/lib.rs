//! HTTP surface for the workflow engine.
//!
//! Exposes workflow start and status endpoints, the SSE event stream,
//! record store passthrough routes, and a health check.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use server::{ApiServer, ServerConfig};
pub use state::AppState;
