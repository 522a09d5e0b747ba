//! Bearer token verification.
//!
//! Tokens are verified against public keys from the issuer's JWKS endpoint.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (via `common::jwt`)
//! - The algorithm is fixed by the JWK key type (RSA => RS256, OKP => EdDSA);
//!   the token header cannot pick a different one
//! - Issuer, audience, expiry and issued-at are validated with clock skew
//!   tolerance

use crate::auth::claims::Claims;
use crate::auth::jwks::{Jwk, JwksClient};
use crate::errors::AuthError;
use common::jwt::{decode_ed25519_public_key_jwk, inspect_header, validate_iat, JwtValidationError};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Verifies bearer tokens for a single issuer and audience.
pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    audience: String,
    clock_skew: Duration,
}

impl JwtValidator {
    /// Create a new validator.
    ///
    /// Negative `clock_skew_seconds` is treated as zero.
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        clock_skew_seconds: i64,
    ) -> Self {
        let clock_skew = Duration::from_secs(u64::try_from(clock_skew_seconds).unwrap_or(0));
        Self {
            jwks_client,
            issuer,
            audience,
            clock_skew,
        }
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// - `MalformedHeader` - oversized token, unparseable header, or no `kid`
    /// - `InvalidSignature` - unknown key, unsupported key, or bad signature
    /// - `ExpiredToken` - `exp` is in the past (beyond clock skew)
    /// - `InvalidClaims` - wrong issuer or audience, missing claims, or
    ///   `iat` in the future
    /// - `KeySetUnavailable` - the JWKS could not be fetched
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let header = inspect_header(token).map_err(|e| {
            tracing::debug!(target: "drinks.auth.jwt", error = ?e, "Token header inspection failed");
            match e {
                JwtValidationError::MissingKid => {
                    AuthError::MalformedHeader("Authorization malformed".to_string())
                }
                _ => AuthError::MalformedHeader("Unable to parse authentication token".to_string()),
            }
        })?;

        let jwk = self.jwks_client.get_key(&header.kid).await?;

        let claims = verify_token(token, &jwk, &self.issuer, &self.audience, self.clock_skew)?;

        if let Err(e) = validate_iat(claims.iat, self.clock_skew) {
            tracing::debug!(target: "drinks.auth.jwt", error = ?e, "Token iat validation failed");
            return Err(AuthError::InvalidClaims(
                "token was issued in the future".to_string(),
            ));
        }

        tracing::debug!(target: "drinks.auth.jwt", "Token validated successfully");
        Ok(claims)
    }
}

/// Build a decoding key from a JWK, returning the only algorithm it may verify.
fn decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), AuthError> {
    let (expected_alg, algorithm) = match jwk.kty.as_str() {
        "RSA" => ("RS256", Algorithm::RS256),
        "OKP" => ("EdDSA", Algorithm::EdDSA),
        other => {
            tracing::warn!(target: "drinks.auth.jwt", kty = %other, "Unsupported JWK key type");
            return Err(AuthError::InvalidSignature);
        }
    };

    if let Some(alg) = &jwk.alg {
        if alg != expected_alg {
            tracing::warn!(target: "drinks.auth.jwt", kty = %jwk.kty, alg = %alg, "JWK algorithm does not match key type");
            return Err(AuthError::InvalidSignature);
        }
    }

    let key = match algorithm {
        Algorithm::RS256 => {
            let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
                tracing::error!(target: "drinks.auth.jwt", kid = %jwk.kid, "RSA JWK missing n or e");
                return Err(AuthError::InvalidSignature);
            };
            DecodingKey::from_rsa_components(n, e).map_err(|e| {
                tracing::error!(target: "drinks.auth.jwt", error = %e, "Invalid RSA key components");
                AuthError::InvalidSignature
            })?
        }
        _ => {
            if jwk.crv.as_deref().is_some_and(|crv| crv != "Ed25519") {
                tracing::warn!(target: "drinks.auth.jwt", kid = %jwk.kid, "Unsupported OKP curve");
                return Err(AuthError::InvalidSignature);
            }
            let x = jwk.x.as_deref().ok_or_else(|| {
                tracing::error!(target: "drinks.auth.jwt", kid = %jwk.kid, "JWK missing x field");
                AuthError::InvalidSignature
            })?;
            let public_key_bytes = decode_ed25519_public_key_jwk(x).map_err(|e| {
                tracing::error!(target: "drinks.auth.jwt", error = %e, "Invalid public key encoding");
                AuthError::InvalidSignature
            })?;
            DecodingKey::from_ed_der(&public_key_bytes)
        }
    };

    Ok((key, algorithm))
}

/// Verify the signature and registered claims, returning the token claims.
fn verify_token(
    token: &str,
    jwk: &Jwk,
    issuer: &str,
    audience: &str,
    clock_skew: Duration,
) -> Result<Claims, AuthError> {
    let (key, algorithm) = decoding_key(jwk)?;

    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.leeway = clock_skew.as_secs();
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);
    validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        tracing::debug!(target: "drinks.auth.jwt", error = %e, "Token verification failed");
        map_jwt_error(e.kind())
    })?;

    Ok(token_data.claims)
}

fn map_jwt_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        ErrorKind::InvalidIssuer => AuthError::InvalidClaims("check the issuer".to_string()),
        ErrorKind::InvalidAudience => AuthError::InvalidClaims("check the audience".to_string()),
        ErrorKind::ImmatureSignature => {
            AuthError::InvalidClaims("token is not valid yet".to_string())
        }
        ErrorKind::MissingRequiredClaim(claim) => {
            AuthError::InvalidClaims(format!("missing {claim}"))
        }
        ErrorKind::Json(_) => AuthError::InvalidClaims("unreadable claims".to_string()),
        _ => AuthError::InvalidSignature,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn okp_jwk(alg: Option<&str>, x: Option<&str>) -> Jwk {
        Jwk {
            kty: "OKP".to_string(),
            kid: "test-key".to_string(),
            alg: alg.map(String::from),
            key_use: Some("sig".to_string()),
            n: None,
            e: None,
            crv: Some("Ed25519".to_string()),
            x: x.map(String::from),
        }
    }

    fn unsigned_token() -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"EdDSA","typ":"JWT","kid":"test-key"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            r#"{"sub":"u","iss":"https://issuer/","aud":"drinks","exp":9999999999,"iat":1}"#,
        );
        format!("{header}.{payload}.fake_signature")
    }

    fn verify(jwk: &Jwk) -> Result<Claims, AuthError> {
        verify_token(
            &unsigned_token(),
            jwk,
            "https://issuer/",
            "drinks",
            Duration::from_secs(0),
        )
    }

    #[test]
    fn test_rejects_unsupported_key_type() {
        let mut jwk = okp_jwk(Some("EdDSA"), Some("dGVzdA"));
        jwk.kty = "oct".to_string();

        assert_eq!(verify(&jwk).unwrap_err(), AuthError::InvalidSignature);
    }

    #[test]
    fn test_rejects_algorithm_not_matching_key_type() {
        let jwk = okp_jwk(Some("RS256"), Some("dGVzdA"));

        assert_eq!(verify(&jwk).unwrap_err(), AuthError::InvalidSignature);
    }

    #[test]
    fn test_rejects_okp_key_without_x() {
        let jwk = okp_jwk(Some("EdDSA"), None);

        assert_eq!(verify(&jwk).unwrap_err(), AuthError::InvalidSignature);
    }

    #[test]
    fn test_rejects_rsa_key_without_components() {
        let jwk = Jwk {
            kty: "RSA".to_string(),
            kid: "rsa".to_string(),
            alg: Some("RS256".to_string()),
            key_use: None,
            n: None,
            e: Some("AQAB".to_string()),
            crv: None,
            x: None,
        };

        assert_eq!(verify(&jwk).unwrap_err(), AuthError::InvalidSignature);
    }

    #[test]
    fn test_rejects_forged_signature() {
        let x = URL_SAFE_NO_PAD.encode([7u8; 32]);
        let jwk = okp_jwk(Some("EdDSA"), Some(&x));

        assert_eq!(verify(&jwk).unwrap_err(), AuthError::InvalidSignature);
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            map_jwt_error(&ErrorKind::ExpiredSignature),
            AuthError::ExpiredToken
        );
        assert!(matches!(
            map_jwt_error(&ErrorKind::InvalidIssuer),
            AuthError::InvalidClaims(msg) if msg.contains("issuer")
        ));
        assert!(matches!(
            map_jwt_error(&ErrorKind::InvalidAudience),
            AuthError::InvalidClaims(msg) if msg.contains("audience")
        ));
        assert!(matches!(
            map_jwt_error(&ErrorKind::MissingRequiredClaim("aud".to_string())),
            AuthError::InvalidClaims(msg) if msg == "missing aud"
        ));
        assert_eq!(
            map_jwt_error(&ErrorKind::InvalidSignature),
            AuthError::InvalidSignature
        );
        assert_eq!(
            map_jwt_error(&ErrorKind::InvalidAlgorithm),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn test_negative_clock_skew_is_zero() {
        let client = Arc::new(JwksClient::new("http://localhost:1/jwks".to_string()));
        let validator = JwtValidator::new(client, "iss".to_string(), "aud".to_string(), -5);

        assert_eq!(validator.clock_skew, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_validate_rejects_token_without_kid() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let token = format!("{header}.e30.sig");
        let client = Arc::new(JwksClient::new("http://localhost:1/jwks".to_string()));
        let validator = JwtValidator::new(client, "iss".to_string(), "aud".to_string(), 0);

        let err = validator.validate(&token).await.unwrap_err();
        assert_eq!(
            err,
            AuthError::MalformedHeader("Authorization malformed".to_string())
        );
    }

    #[tokio::test]
    async fn test_validate_rejects_garbage_token() {
        let client = Arc::new(JwksClient::new("http://localhost:1/jwks".to_string()));
        let validator = JwtValidator::new(client, "iss".to_string(), "aud".to_string(), 0);

        let err = validator.validate("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedHeader(_)));
    }
}
