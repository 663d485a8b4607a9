//! Bearer-token verification shared by the REST surface, the messaging gateway,
//! and the voice signaling hub.
//!
//! Token *issuance* is an external collaborator (§1, "Deliberately out of scope"):
//! this module only ever verifies a signed opaque string against the shared
//! signing secret.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by the bearer credential, per §6: `{sub, exp}`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject — the principal's id, as a string.
    pub sub: String,
    /// Expiration, Unix timestamp seconds.
    pub exp: i64,
}

impl Claims {
    pub fn principal_id(&self) -> Result<Uuid, uuid::Error> {
        self.sub.parse()
    }
}

/// Verify signature and expiry; reject anything else.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn make_token(secret: &str, exp: i64) -> String {
        let claims = Claims { sub: Uuid::nil().to_string(), exp };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_decodes() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let token = make_token("secret", exp);
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.principal_id().unwrap(), Uuid::nil());
    }

    #[test]
    fn expired_token_rejected() {
        let token = make_token("secret", chrono::Utc::now().timestamp() - 10);
        assert!(validate_token(&token, "secret").is_err());
    }

    #[test]
    fn wrong_secret_rejected() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let token = make_token("secret", exp);
        assert!(validate_token(&token, "other").is_err());
    }
}
