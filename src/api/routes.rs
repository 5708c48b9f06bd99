//! API route configuration.

use crate::api::handlers::{shorten_handler, stats_handler};
use crate::api::middleware::rate_limit;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Link management routes.
///
/// # Endpoints
///
/// - `POST /shorten`       - Create a short link (rate limited per client IP)
/// - `GET  /stats/{code}`  - Durable statistics for a link
///
/// `behind_proxy` selects the rate limiter key: forwarded headers when true,
/// the socket peer otherwise.
pub fn link_routes(behind_proxy: bool) -> Router<AppState> {
    let shorten = Router::new().route("/shorten", post(shorten_handler));
    let shorten = if behind_proxy {
        shorten.layer(rate_limit::proxy_layer())
    } else {
        shorten.layer(rate_limit::layer())
    };

    Router::new()
        .merge(shorten)
        .route("/stats/{code}", get(stats_handler))
}
