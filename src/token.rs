//! Signed, self-describing magic link tokens
//!
//! Tokens are HS256 JWTs carrying the opaque user payload in a `user` claim
//! together with `iat` and `exp`. Nothing is stored server side: a token is
//! valid exactly when its signature verifies against the secret and the
//! current time is before `exp`.

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::fmt;

use crate::error::TokenError;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    user: Value,
    iat: i64,
    exp: i64,
}

/// Mint a token for `identity`, issued now and valid for `ttl_seconds`
///
/// # Errors
///
/// Returns `TokenError::Signing` if the secret is empty, the TTL does not fit
/// a timestamp, or the claims cannot be encoded.
pub fn mint(identity: &Value, ttl_seconds: u64, secret: &str) -> Result<String, TokenError> {
    mint_at(identity, ttl_seconds, secret, chrono::Utc::now().timestamp())
}

/// Mint a token with an explicit issue time (seconds since the epoch)
///
/// # Errors
///
/// Same as [`mint`].
pub fn mint_at(
    identity: &Value,
    ttl_seconds: u64,
    secret: &str,
    issued_at: i64,
) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::Signing("secret must not be empty".to_string()));
    }

    let ttl = i64::try_from(ttl_seconds)
        .map_err(|_| TokenError::Signing(format!("ttl of {ttl_seconds}s is out of range")))?;
    let exp = issued_at
        .checked_add(ttl)
        .ok_or_else(|| TokenError::Signing("expiration overflows".to_string()))?;

    let header = TokenHeader {
        alg: ALGORITHM.to_string(),
        typ: Some("JWT".to_string()),
    };
    let claims = TokenClaims {
        user: identity.clone(),
        iat: issued_at,
        exp,
    };

    let header_json =
        serde_json::to_vec(&header).map_err(|e| TokenError::Signing(e.to_string()))?;
    let claims_json =
        serde_json::to_vec(&claims).map_err(|e| TokenError::Signing(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        general_purpose::URL_SAFE_NO_PAD.encode(header_json),
        general_purpose::URL_SAFE_NO_PAD.encode(claims_json)
    );

    let mut mac = new_mac(secret).map_err(TokenError::Signing)?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();

    Ok(format!(
        "{signing_input}.{}",
        general_purpose::URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Verify `token` against `secret` and return the embedded user payload
///
/// # Errors
///
/// - `TokenError::Invalid` for malformed tokens, unsupported algorithms,
///   signature mismatches, or undecodable claims
/// - `TokenError::Expired` when the signature is valid but the token expired
pub fn verify(token: &str, secret: &str) -> Result<Value, TokenError> {
    verify_at(token, secret, chrono::Utc::now().timestamp())
}

/// Verify `token` as of `now` (seconds since the epoch)
///
/// # Errors
///
/// Same as [`verify`].
pub fn verify_at(token: &str, secret: &str, now: i64) -> Result<Value, TokenError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Invalid("jwt malformed".to_string()));
    };

    let header: TokenHeader = decode_segment(header_b64, "header")?;
    if header.alg != ALGORITHM {
        return Err(TokenError::Invalid(format!(
            "unsupported algorithm: {}",
            header.alg
        )));
    }

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|e| TokenError::Invalid(format!("invalid signature encoding: {e}")))?;

    let mut mac = new_mac(secret).map_err(TokenError::Invalid)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claims_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::Invalid("invalid signature".to_string()))?;

    let claims: TokenClaims = decode_segment(claims_b64, "claims")?;
    if now >= claims.exp {
        return Err(TokenError::Expired {
            expired_at: claims.exp,
        });
    }

    Ok(claims.user)
}

fn new_mac(secret: &str) -> Result<HmacSha256, String> {
    if secret.is_empty() {
        return Err("secret must not be empty".to_string());
    }
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| e.to_string())
}

fn decode_segment<T: serde::de::DeserializeOwned>(
    segment: &str,
    name: &str,
) -> Result<T, TokenError> {
    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::Invalid(format!("invalid {name} encoding: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::Invalid(format!("invalid {name} JSON: {e}")))
}

/// Secret and TTL bundled for the strategy
#[derive(Clone)]
pub struct TokenCodec {
    secret: String,
    ttl_seconds: u64,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: impl Into<String>, ttl_seconds: u64) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds,
        }
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// # Errors
    ///
    /// See [`mint`].
    pub fn mint(&self, identity: &Value) -> Result<String, TokenError> {
        mint(identity, self.ttl_seconds, &self.secret)
    }

    /// # Errors
    ///
    /// See [`verify`].
    pub fn verify(&self, token: &str) -> Result<Value, TokenError> {
        verify(token, &self.secret)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}
