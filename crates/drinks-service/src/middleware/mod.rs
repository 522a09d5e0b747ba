//! Middleware for the drinks service.
//!
//! # Components
//!
//! - `auth` - Permission guard for protected routes
//! - `http_metrics` - Request metrics for every response

pub mod auth;
pub mod http_metrics;

pub use auth::{guarded, require_permission, PermissionGuard};
pub use http_metrics::http_metrics_middleware;
