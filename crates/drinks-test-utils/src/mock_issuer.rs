//! Mock token issuer.
//!
//! Serves a JWKS document from a `wiremock` server and hands out token
//! builders for its keys.

use crate::keys::TestKeypair;
use crate::token_builders::TestTokenBuilder;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path at which the JWKS document is served.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Audience expected by test servers.
pub const TEST_AUDIENCE: &str = "drinks";

/// A token issuer backed by a mock HTTP server.
pub struct MockIssuer {
    server: MockServer,
    keypair: TestKeypair,
}

impl MockIssuer {
    /// Start an issuer publishing one Ed25519 key.
    pub async fn start() -> Self {
        Self::start_with_keys(TestKeypair::ed25519(1, "test-key-01"), Vec::new()).await
    }

    /// Start an issuer signing with `keypair` and additionally publishing
    /// `extra_keys`.
    pub async fn start_with_keys(keypair: TestKeypair, extra_keys: Vec<TestKeypair>) -> Self {
        let server = MockServer::start().await;
        let issuer = Self { server, keypair };

        let mut keys = vec![issuer.keypair.clone()];
        keys.extend(extra_keys);
        issuer.publish(&keys).await;

        issuer
    }

    /// Replace the published JWKS with `keys`.
    pub async fn publish(&self, keys: &[TestKeypair]) {
        self.server.reset().await;

        let jwks = serde_json::json!({
            "keys": keys.iter().map(TestKeypair::jwk_json).collect::<Vec<_>>()
        });
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
            .mount(&self.server)
            .await;
    }

    /// Make the JWKS endpoint fail.
    pub async fn fail_jwks(&self) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&self.server)
            .await;
    }

    /// Issuer identifier (`iss`), with a trailing slash like hosted issuers.
    pub fn issuer(&self) -> String {
        format!("{}/", self.server.uri())
    }

    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    pub fn keypair(&self) -> &TestKeypair {
        &self.keypair
    }

    /// Token builder for this issuer's signing key and the test audience.
    pub fn token(&self) -> TestTokenBuilder {
        self.token_signed_by(self.keypair.clone())
    }

    /// Token builder with this issuer's `iss`/`aud` but a different key.
    pub fn token_signed_by(&self, keypair: TestKeypair) -> TestTokenBuilder {
        TestTokenBuilder::new(keypair, &self.issuer(), TEST_AUDIENCE)
    }
}
