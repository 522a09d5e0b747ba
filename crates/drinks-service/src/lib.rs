//! Drinks Service Library
//!
//! A small HTTP service exposing CRUD operations over drinks, with write
//! access and the detailed listing delegated to permissions carried in
//! bearer tokens from an external issuer.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs (guard) -> handlers/*.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - JWKS client and token verification
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Permission guard and HTTP metrics
//! - `models` - Drink entity, projections and API bodies
//! - `observability` - Prometheus metrics
//! - `repositories` - Drink persistence
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
