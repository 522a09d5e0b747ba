//! JWKS client for fetching and caching the token issuer's public keys.
//!
//! Keys are fetched from the issuer's JWKS endpoint and cached with a TTL.
//! A `kid` that is missing from a still-valid cache triggers one early
//! refresh (the issuer may have rotated keys), throttled by
//! [`MIN_FORCED_REFRESH_INTERVAL`].

use crate::errors::AuthError;
use crate::observability::metrics;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Default cache TTL in seconds (5 minutes).
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Minimum time between refreshes caused by unknown `kid` values.
pub const MIN_FORCED_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// JSON Web Key from the JWKS endpoint.
///
/// Holds RSA (`n`, `e`) or OKP (`crv`, `x`) members depending on `kty`.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" or "OKP").
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Algorithm ("RS256" or "EdDSA").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig").
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,

    /// OKP curve name ("Ed25519").
    #[serde(default)]
    pub crv: Option<String>,

    /// OKP public key (base64url).
    #[serde(default)]
    pub x: Option<String>,
}

/// JWKS document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<Jwk>,
}

struct CachedJwks {
    keys: HashMap<String, Jwk>,
    fetched_at: Instant,
    expires_at: Instant,
}

/// Outcome of looking a `kid` up in the cache.
enum CacheLookup {
    Hit(Jwk),
    /// Known-stale or missing cache, or an unknown `kid` whose last fetch is
    /// old enough to try again.
    Refresh,
    /// Unknown `kid` and the keys were fetched too recently to retry.
    Miss,
}

/// JWKS client for fetching and caching public keys.
pub struct JwksClient {
    jwks_url: String,
    http_client: reqwest::Client,
    cache: RwLock<Option<CachedJwks>>,
    /// Serializes fetches so concurrent misses share one request.
    refresh_lock: Mutex<()>,
    cache_ttl: Duration,
}

impl JwksClient {
    /// Create a new JWKS client with the default cache TTL.
    pub fn new(jwks_url: String) -> Self {
        Self::with_ttl(jwks_url, Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS))
    }

    /// Create a new JWKS client with a custom cache TTL.
    pub fn with_ttl(jwks_url: String, cache_ttl: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "drinks.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            cache_ttl,
        }
    }

    /// URL of the JWKS endpoint this client reads.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Get a JWK by key ID.
    ///
    /// At most one fetch is in flight at a time. Callers that queued behind
    /// it re-check the cache before fetching again, so a burst of lookups
    /// (cold cache, expired cache, or unknown `kid`s) costs one request.
    ///
    /// # Errors
    ///
    /// - `AuthError::KeySetUnavailable` if the JWKS cannot be fetched
    /// - `AuthError::InvalidSignature` if no key carries `kid`
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        match self.lookup(kid).await {
            CacheLookup::Hit(key) => {
                tracing::debug!(target: "drinks.auth.jwks", "JWKS cache hit");
                return Ok(key);
            }
            CacheLookup::Miss => return Err(key_not_found()),
            CacheLookup::Refresh => {}
        }

        let _refresh_guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we waited for the lock.
        match self.lookup(kid).await {
            CacheLookup::Hit(key) => return Ok(key),
            CacheLookup::Miss => return Err(key_not_found()),
            CacheLookup::Refresh => {}
        }

        self.refresh_cache().await?;

        // Just fetched: use the keys even if a very short TTL has lapsed.
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .and_then(|cached| cached.keys.get(kid))
            .cloned()
            .ok_or_else(key_not_found)
    }

    async fn lookup(&self, kid: &str) -> CacheLookup {
        let cache = self.cache.read().await;
        match cache.as_ref() {
            Some(cached) if cached.expires_at > Instant::now() => match cached.keys.get(kid) {
                Some(key) => CacheLookup::Hit(key.clone()),
                None if cached.fetched_at.elapsed() >= MIN_FORCED_REFRESH_INTERVAL => {
                    CacheLookup::Refresh
                }
                None => CacheLookup::Miss,
            },
            _ => CacheLookup::Refresh,
        }
    }

    /// Fetch the JWKS and replace the cache.
    #[instrument(skip(self))]
    async fn refresh_cache(&self) -> Result<(), AuthError> {
        tracing::debug!(target: "drinks.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "drinks.auth.jwks", error = %e, "Failed to fetch JWKS");
                metrics::record_jwks_refresh("error");
                AuthError::KeySetUnavailable
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "drinks.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            metrics::record_jwks_refresh("error");
            return Err(AuthError::KeySetUnavailable);
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "drinks.auth.jwks", error = %e, "Failed to parse JWKS response");
            metrics::record_jwks_refresh("error");
            AuthError::KeySetUnavailable
        })?;

        let keys: HashMap<String, Jwk> = jwks
            .keys
            .into_iter()
            .filter(|key| key.key_use.as_deref().map_or(true, |u| u == "sig"))
            .map(|key| (key.kid.clone(), key))
            .collect();

        tracing::info!(
            target: "drinks.auth.jwks",
            key_count = keys.len(),
            "JWKS cache refreshed"
        );
        metrics::record_jwks_refresh("success");

        let now = Instant::now();
        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            keys,
            fetched_at: now,
            expires_at: now + self.cache_ttl,
        });

        Ok(())
    }
}

fn key_not_found() -> AuthError {
    tracing::warn!(target: "drinks.auth.jwks", "Key not found in JWKS");
    AuthError::InvalidSignature
}
