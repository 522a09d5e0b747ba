//! Builder for test bearer tokens.

use crate::keys::TestKeypair;
use chrono::{Duration, Utc};
use serde_json::json;

/// Builder for signed test tokens.
///
/// Defaults to a token valid for one hour, issued now, with no
/// `permissions` claim.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new(keypair, "https://issuer.test/", "drinks")
///     .for_user("auth0|barista")
///     .with_permissions(&["get:drinks-detail", "post:drinks"])
///     .sign();
/// ```
pub struct TestTokenBuilder {
    keypair: TestKeypair,
    kid: Option<String>,
    sub: String,
    iss: Option<String>,
    aud: Option<serde_json::Value>,
    exp: i64,
    iat: i64,
    permissions: Option<Vec<String>>,
}

impl TestTokenBuilder {
    pub fn new(keypair: TestKeypair, issuer: &str, audience: &str) -> Self {
        let now = Utc::now();
        Self {
            keypair,
            kid: None,
            sub: "test-subject".to_string(),
            iss: Some(issuer.to_string()),
            aud: Some(json!(audience)),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            permissions: None,
        }
    }

    /// Set the subject.
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set the `permissions` claim.
    pub fn with_permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = Some(permissions.iter().map(ToString::to_string).collect());
        self
    }

    /// Set the issuer.
    pub fn issued_by(mut self, issuer: &str) -> Self {
        self.iss = Some(issuer.to_string());
        self
    }

    /// Set a single audience.
    pub fn for_audience(mut self, audience: &str) -> Self {
        self.aud = Some(json!(audience));
        self
    }

    /// Set a list of audiences.
    pub fn for_audiences(mut self, audiences: &[&str]) -> Self {
        self.aud = Some(json!(audiences));
        self
    }

    /// Omit the `aud` claim.
    pub fn without_audience(mut self) -> Self {
        self.aud = None;
        self
    }

    /// Set expiration in seconds from now (negative for already expired).
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set issued-at timestamp.
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Advertise a different `kid` than the signing key's.
    pub fn with_kid(mut self, kid: &str) -> Self {
        self.kid = Some(kid.to_string());
        self
    }

    /// The claims as a JSON value.
    pub fn claims(&self) -> serde_json::Value {
        let mut claims = json!({
            "sub": self.sub,
            "exp": self.exp,
            "iat": self.iat,
        });
        if let Some(iss) = &self.iss {
            claims["iss"] = json!(iss);
        }
        if let Some(aud) = &self.aud {
            claims["aud"] = aud.clone();
        }
        if let Some(permissions) = &self.permissions {
            claims["permissions"] = json!(permissions);
        }
        claims
    }

    /// Sign and encode the token.
    pub fn sign(self) -> String {
        let claims = self.claims();
        match &self.kid {
            Some(kid) => self.keypair.sign_with_kid(&claims, kid),
            None => self.keypair.sign(&claims),
        }
    }
}
