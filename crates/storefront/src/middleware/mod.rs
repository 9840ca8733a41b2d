//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, outermost)
//! 2. `TraceLayer` (request span, see [`make_request_span`])
//! 3. Request ID (records the ID into that span)

pub mod request_id;

pub use request_id::{make_request_span, request_id_middleware};
