use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::users::repo_types::{Role, User};

/// Identity payload carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    pub id: String,
    pub email: String,
    pub role: Role,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Issues and validates session tokens.
///
/// A token is the base64 encoding of the JSON claims object. It carries no
/// signature; possession of a well-formed, unexpired token is treated as
/// proof of identity.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.token_ttl_hours)
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let exp = OffsetDateTime::now_utc() + self.ttl;
        let claims = TokenClaims {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            exp: exp.unix_timestamp(),
        };
        let token = Base64::encode_string(serde_json::to_string(&claims)?.as_bytes());
        debug!(user_id = %claims.id, "token issued");
        Ok(token)
    }

    /// Decodes and checks expiry. Malformed and expired tokens both come
    /// back as authentication failures; there is no signature to check.
    pub fn validate(&self, token: &str) -> Result<TokenClaims> {
        let bytes = Base64::decode_vec(token)
            .map_err(|_| Error::Unauthorized("invalid token".into()))?;
        let claims: TokenClaims = serde_json::from_slice(&bytes)
            .map_err(|_| Error::Unauthorized("invalid token".into()))?;
        if claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
            debug!(user_id = %claims.id, "token expired");
            return Err(Error::Unauthorized("token expired".into()));
        }
        Ok(claims)
    }
}
