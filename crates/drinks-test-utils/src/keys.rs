//! Signing keys for test tokens.
//!
//! Ed25519 keys are derived deterministically from a one-byte seed. The RSA
//! key is a fixed 2048-bit fixture; ring cannot generate RSA keys.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde::Serialize;

/// PKCS#1 PEM of the RSA test key.
const TEST_RSA_PRIVATE_KEY_PEM: &str = include_str!("fixtures/test_rsa_private.pem");

/// Base64url modulus of the RSA test key.
const TEST_RSA_MODULUS: &str = "raBzhRV7J2JVD0FgrcR538iC8aEQ3kzI_kZ7Gsd8m3jZN2pDeKCmMbjCbnQLH5DfLzPW2vZnHi6XFS7blVuDISp7h2-C8X_0FwplhvA8tPzZfRue5868iO2oy1uCOZZkVTsQqdPZGlq6VsAIJu3e0gQj0frHQdTNT5gm7OQArC6lwaz_u7XxBx1DPja-cWHHrkVkIw3cSHMzwme9DxqXKNTDBEa6IYFKAQjx41CVwzqmueMmKxU2rLxw3RDC7tA1THPtk7tw6tOw4Fwc2pRmT-oh_YYu6gd3Ma0anH-0C_Eah_oC2dF_zWhK4NeU_Q2o6kz1SnicpvGnnMzNf9iuvQ";

/// Base64url public exponent (65537) of the RSA test key.
const TEST_RSA_EXPONENT: &str = "AQAB";

/// A keypair able to sign tokens and publish its JWK.
#[derive(Clone)]
pub struct TestKeypair {
    kid: String,
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    jwk: serde_json::Value,
}

impl TestKeypair {
    /// Deterministic Ed25519 keypair (EdDSA).
    pub fn ed25519(seed: u8, kid: &str) -> Self {
        let mut seed_bytes = [0u8; 32];
        seed_bytes[0] = seed;
        for (i, byte) in seed_bytes.iter_mut().enumerate().skip(1) {
            *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
        }

        let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
            .expect("Failed to create test keypair");
        let public_key_bytes = key_pair.public_key().as_ref().to_vec();

        Self {
            kid: kid.to_string(),
            algorithm: Algorithm::EdDSA,
            encoding_key: EncodingKey::from_ed_der(&build_pkcs8_from_seed(&seed_bytes)),
            jwk: serde_json::json!({
                "kty": "OKP",
                "kid": kid,
                "crv": "Ed25519",
                "x": URL_SAFE_NO_PAD.encode(&public_key_bytes),
                "alg": "EdDSA",
                "use": "sig"
            }),
        }
    }

    /// The fixed RSA keypair (RS256), as most hosted issuers use.
    pub fn rsa(kid: &str) -> Self {
        Self {
            kid: kid.to_string(),
            algorithm: Algorithm::RS256,
            encoding_key: EncodingKey::from_rsa_pem(TEST_RSA_PRIVATE_KEY_PEM.as_bytes())
                .expect("Failed to load RSA test key"),
            jwk: serde_json::json!({
                "kty": "RSA",
                "kid": kid,
                "n": TEST_RSA_MODULUS,
                "e": TEST_RSA_EXPONENT,
                "alg": "RS256",
                "use": "sig"
            }),
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Public JWK for the issuer's JWKS document.
    pub fn jwk_json(&self) -> serde_json::Value {
        self.jwk.clone()
    }

    /// Sign `claims` with this key, setting `kid` in the header.
    pub fn sign<T: Serialize>(&self, claims: &T) -> String {
        self.sign_with_kid(claims, &self.kid)
    }

    /// Sign `claims` but advertise a different `kid`.
    pub fn sign_with_kid<T: Serialize>(&self, claims: &T, kid: &str) -> String {
        let mut header = Header::new(self.algorithm);
        header.typ = Some("JWT".to_string());
        header.kid = Some(kid.to_string());

        encode(&header, claims, &self.encoding_key).expect("Failed to sign token")
    }
}

/// Build a PKCS#8 v1 document from an Ed25519 seed.
pub fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    let mut pkcs8 = Vec::with_capacity(48);

    // Outer SEQUENCE, 46 bytes
    pkcs8.extend_from_slice(&[0x30, 0x2e]);
    // Version: INTEGER 0
    pkcs8.extend_from_slice(&[0x02, 0x01, 0x00]);
    // AlgorithmIdentifier: SEQUENCE { OID 1.3.101.112 }
    pkcs8.extend_from_slice(&[0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70]);
    // PrivateKey: OCTET STRING { OCTET STRING (32 bytes) seed }
    pkcs8.extend_from_slice(&[0x04, 0x22, 0x04, 0x20]);
    pkcs8.extend_from_slice(seed);

    pkcs8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkcs8_length() {
        assert_eq!(build_pkcs8_from_seed(&[1u8; 32]).len(), 48);
    }

    #[test]
    fn test_ed25519_is_deterministic() {
        let a = TestKeypair::ed25519(1, "k1");
        let b = TestKeypair::ed25519(1, "k1");
        let c = TestKeypair::ed25519(2, "k2");

        assert_eq!(a.jwk_json()["x"], b.jwk_json()["x"]);
        assert_ne!(a.jwk_json()["x"], c.jwk_json()["x"]);
    }

    #[test]
    fn test_sign_sets_kid_and_alg() {
        for keypair in [TestKeypair::ed25519(1, "ed-key"), TestKeypair::rsa("rsa-key")] {
            let token = keypair.sign(&serde_json::json!({"sub": "x"}));
            let header = jsonwebtoken::decode_header(&token).unwrap();

            assert_eq!(header.kid.as_deref(), Some(keypair.kid()));
            assert_eq!(header.alg, keypair.algorithm());
        }
    }
}
