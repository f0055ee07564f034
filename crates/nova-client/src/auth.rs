//! Request signing
//!
//! SenseNova authenticates each request with a short-lived HS256 JWT whose
//! issuer is the access key id, signed with the secret access key.

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use nova_core::{Error, Result};

/// Token lifetime in seconds
const TOKEN_TTL_SECS: i64 = 1800;
/// Backdate `nbf` to tolerate clock skew
const NOT_BEFORE_SKEW_SECS: i64 = 5;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub iss: String,
    pub exp: i64,
    pub nbf: i64,
}

/// Mint a bearer token for the given credentials
pub fn generate_token(access_key_id: &str, secret_access_key: &str) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        iss: access_key_id.to_string(),
        exp: now + TOKEN_TTL_SECS,
        nbf: now - NOT_BEFORE_SKEW_SECS,
    };

    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    encode(
        &header,
        &claims,
        &EncodingKey::from_secret(secret_access_key.as_bytes()),
    )
    .map_err(|e| Error::Authentication(format!("Failed to sign token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    #[test]
    fn test_token_round_trips_with_secret() {
        let token = generate_token("ak-test", "sk-test").unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&["ak-test"]);
        validation.validate_nbf = true;
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"sk-test"),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.claims.iss, "ak-test");
        assert_eq!(decoded.claims.exp - decoded.claims.nbf, TOKEN_TTL_SECS + NOT_BEFORE_SKEW_SECS);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let token = generate_token("ak-test", "sk-test").unwrap();

        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &Validation::new(Algorithm::HS256),
        );

        assert!(result.is_err());
    }
}
