//! Common utilities shared across the coffee shop services.

#![warn(clippy::pedantic)]

/// Module for bearer credential extraction from `Authorization` headers
pub mod bearer;

/// Module for JWT utilities (size limits, header inspection, iat validation)
pub mod jwt;
