//! Session token signing and verification.
//!
//! # Purpose
//! HS256 JWTs over a single shared secret. Tokens carry the subject's `uid`
//! and nothing else.
//!
//! # Key invariants
//! - Tokens carry no expiry. That is a deliberate, documented limitation of
//!   this system, not an oversight; verification disables `exp` validation
//!   accordingly.
//! - Verification fails closed: malformed input or a signature mismatch
//!   yields `None`, never an error crossing into the caller.
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Decoded payload of a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub uid: String,
}

/// Signs and verifies session tokens with one shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign claims into a token.
    pub fn issue(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
    }

    /// Verify a token and decode its claims. Any failure yields `None`; the
    /// cause is logged at debug level since invalid tokens are routine.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens never expire in this system, and jsonwebtoken otherwise
        // rejects tokens without an `exp` claim.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                tracing::debug!(error = %err, "token verification failed");
                None
            }
        }
    }
}
