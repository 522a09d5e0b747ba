//! # Drinks Test Utilities
//!
//! Shared test utilities for the drinks service.
//!
//! This crate provides:
//! - Signing keys (deterministic Ed25519, fixed RSA) with their JWKs
//! - A token builder for permission-bearing bearer tokens
//! - A mock token issuer serving the JWKS (`MockIssuer`)
//! - A server harness spawning the real router on a random port
//!   (`TestDrinksServer`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use drinks_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestDrinksServer::spawn().await?;
//!     let token = server.token().with_permissions(&["post:drinks"]).sign();
//!
//!     let response = reqwest::Client::new()
//!         .post(format!("{}/drinks", server.url()))
//!         .bearer_auth(token)
//!         .json(&serde_json::json!({"title": "Water", "recipe": []}))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod keys;
pub mod mock_issuer;
pub mod server_harness;
pub mod token_builders;

pub use keys::*;
pub use mock_issuer::*;
pub use server_harness::*;
pub use token_builders::*;
