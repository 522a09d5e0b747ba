//! Verified token claims.
//!
//! The `sub` field is redacted in Debug output to keep user identifiers out
//! of logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims of a verified bearer token.
///
/// Audience and expiry are checked during verification and are not kept.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user or client identifier) - redacted in Debug output.
    pub sub: String,

    /// Issuer.
    #[serde(default)]
    pub iss: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default)]
    pub iat: i64,

    /// Permission strings granted by the issuer. `None` when the issuer
    /// omitted the claim entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("iss", &self.iss)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("permissions", &self.permissions)
            .finish()
    }
}

impl Claims {
    /// Check whether the token grants `permission` (exact match).
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_deref()
            .is_some_and(|granted| granted.iter().any(|p| p == permission))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn claims_with(permissions: Option<Vec<&str>>) -> Claims {
        Claims {
            sub: "auth0|barista-7".to_string(),
            iss: "https://issuer.example.com/".to_string(),
            exp: 1_900_000_000,
            iat: 1_800_000_000,
            permissions: permissions.map(|p| p.into_iter().map(String::from).collect()),
        }
    }

    #[test]
    fn test_claims_debug_redacts_sub() {
        let debug_str = format!("{:?}", claims_with(None));

        assert!(!debug_str.contains("barista-7"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_has_permission_exact_match() {
        let claims = claims_with(Some(vec!["get:drinks-detail", "post:drinks"]));

        assert!(claims.has_permission("get:drinks-detail"));
        assert!(claims.has_permission("post:drinks"));
        assert!(!claims.has_permission("patch:drinks"));
        assert!(!claims.has_permission("post:drink"));
        assert!(!claims.has_permission("get:drinks"));
    }

    #[test]
    fn test_has_permission_absent_claim() {
        assert!(!claims_with(None).has_permission("post:drinks"));
    }

    #[test]
    fn test_has_permission_empty_claim() {
        assert!(!claims_with(Some(vec![])).has_permission("post:drinks"));
    }

    #[test]
    fn test_deserialize_without_permissions() {
        let json = r#"{"sub":"u","iss":"i","exp":1,"iat":0,"aud":["drinks","other"]}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();

        assert!(claims.permissions.is_none());
    }

    #[test]
    fn test_deserialize_with_permissions() {
        let json = r#"{"sub":"u","iss":"i","exp":1,"iat":0,"permissions":["delete:drinks"]}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();

        assert_eq!(claims.permissions, Some(vec!["delete:drinks".to_string()]));
    }
}
