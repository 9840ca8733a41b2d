//! Rocket Shoes Storefront library.
//!
//! This crate provides the storefront functionality as a library, allowing it
//! to be tested and reused. [`app`] builds the full router around an
//! [`AppState`](state::AppState).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
mod filters;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{Router, middleware::from_fn};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the storefront router with its middleware stack (Sentry layers excluded).
pub fn app(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(middleware::make_request_span))
}
