//! API endpoints.

mod gate;
mod moderation;
mod notifications;
mod sync;
mod tickets;

use axum::{Router, middleware as axum_middleware};

use crate::middleware::{AppState, gate_middleware};

/// Create the API router.
///
/// Every route except `/gate` sits behind the access gate, so a ban or
/// suspension cuts the account off on its next request while leaving
/// the gate status readable.
pub fn router() -> Router<AppState> {
    let gated = Router::new()
        .nest("/tickets", tickets::router())
        .nest("/notifications", notifications::router())
        .nest("/moderation", moderation::router())
        .nest("/sync", sync::router())
        .layer(axum_middleware::from_fn(gate_middleware));

    Router::new().nest("/gate", gate::router()).merge(gated)
}
