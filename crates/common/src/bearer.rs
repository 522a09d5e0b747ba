//! Bearer credential extraction.
//!
//! Accepts `Authorization` header values of the form `Bearer <token>`. The
//! scheme is matched case-insensitively and the value must consist of exactly
//! two whitespace-separated parts.

use thiserror::Error;

/// Authentication scheme accepted by [`extract_bearer`].
pub const BEARER_SCHEME: &str = "bearer";

/// Reasons a header value was rejected as a bearer credential.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerError {
    /// No `Authorization` header was supplied.
    #[error("Authorization header is expected")]
    Missing,

    /// The scheme is not `Bearer`.
    #[error("Authorization header must start with \"Bearer\"")]
    WrongScheme,

    /// Only the scheme was supplied.
    #[error("Token not found")]
    MissingToken,

    /// More than two parts were supplied.
    #[error("Authorization header must be bearer token")]
    TooManyParts,

    /// The header value is not visible ASCII and cannot carry a token.
    #[error("Authorization header contains invalid characters")]
    InvalidCharacters,
}

/// Extract the token from an optional `Authorization` header value.
///
/// # Errors
///
/// Returns a [`BearerError`] describing why the value is not a usable bearer
/// credential.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, BearerError> {
    let header = header.ok_or(BearerError::Missing)?;

    let mut parts = header.split_whitespace();
    let scheme = parts.next().ok_or(BearerError::Missing)?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        tracing::debug!(target: "common.bearer", "Rejected non-bearer authorization scheme");
        return Err(BearerError::WrongScheme);
    }

    let token = parts.next().ok_or(BearerError::MissingToken)?;
    if parts.next().is_some() {
        return Err(BearerError::TooManyParts);
    }

    Ok(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_valid() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_extract_bearer_scheme_is_case_insensitive() {
        assert_eq!(extract_bearer(Some("bearer tok")), Ok("tok"));
        assert_eq!(extract_bearer(Some("BEARER tok")), Ok("tok"));
        assert_eq!(extract_bearer(Some("bEaReR tok")), Ok("tok"));
    }

    #[test]
    fn test_extract_bearer_missing_header() {
        assert_eq!(extract_bearer(None), Err(BearerError::Missing));
    }

    #[test]
    fn test_extract_bearer_blank_header() {
        assert_eq!(extract_bearer(Some("   ")), Err(BearerError::Missing));
    }

    #[test]
    fn test_extract_bearer_wrong_scheme() {
        assert_eq!(
            extract_bearer(Some("Basic dXNlcjpwYXNz")),
            Err(BearerError::WrongScheme)
        );
    }

    #[test]
    fn test_extract_bearer_scheme_only() {
        assert_eq!(extract_bearer(Some("Bearer")), Err(BearerError::MissingToken));
    }

    #[test]
    fn test_extract_bearer_three_parts() {
        assert_eq!(
            extract_bearer(Some("Bearer tok extra")),
            Err(BearerError::TooManyParts)
        );
    }

    #[test]
    fn test_extract_bearer_token_without_scheme() {
        // A bare token is a single part whose "scheme" is not bearer.
        assert_eq!(
            extract_bearer(Some("abc.def.ghi")),
            Err(BearerError::WrongScheme)
        );
    }
}
