//! HTTP API layer for worklink.
//!
//! - **Endpoints**: tickets, notifications, moderation, gate, sync
//! - **Extractors**: bearer-token authentication
//! - **Middleware**: auth resolution, account access gate
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware, gate_middleware};
