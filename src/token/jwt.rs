use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "HS256";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claim sets that carry an absolute expiry in unix seconds.
pub trait Expiring {
    fn expires_at(&self) -> i64;
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid signing key")]
    InvalidKey,
    #[error("failed to encode token")]
    Encode(#[source] serde_json::Error),
    #[error("malformed token: {0}")]
    Malformed(&'static str),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value).map_err(Error::Encode)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: DeserializeOwned>(s: &str, what: &'static str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Malformed(what))?;
    serde_json::from_slice(&bytes).map_err(|_| Error::Malformed(what))
}

fn mac(secret: &[u8]) -> Result<HmacSha256, Error> {
    if secret.is_empty() {
        return Err(Error::InvalidKey);
    }
    HmacSha256::new_from_slice(secret).map_err(|_| Error::InvalidKey)
}

/// Create an HS256 signed token (JWT) over `claims`.
///
/// # Errors
///
/// Returns an error if the secret is empty or the claims cannot be encoded.
pub fn sign_hs256<C: Serialize>(secret: &[u8], claims: &C) -> Result<String, Error> {
    let mut mac = mac(secret)?;
    let header_b64 = b64e_json(&TokenHeader::hs256())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    mac.update(signing_input.as_bytes());
    let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verify an HS256 token and return its decoded claims.
///
/// The signature is checked before the claims are parsed, and expiry is only
/// evaluated once both pass.
///
/// # Errors
///
/// - [`Error::Malformed`] when the token is not three base64url segments,
///   the header or claims are not the expected JSON, or the algorithm is not HS256,
/// - [`Error::InvalidSignature`] when the MAC does not match `secret`,
/// - [`Error::Expired`] when `exp <= now_unix_seconds`.
pub fn verify_hs256<C>(token: &str, secret: &[u8], now_unix_seconds: i64) -> Result<C, Error>
where
    C: DeserializeOwned + Expiring,
{
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(Error::Malformed("missing header"))?;
    let claims_b64 = parts.next().ok_or(Error::Malformed("missing claims"))?;
    let sig_b64 = parts.next().ok_or(Error::Malformed("missing signature"))?;
    if parts.next().is_some() {
        return Err(Error::Malformed("too many segments"));
    }

    let header: TokenHeader = b64d_json(header_b64, "invalid header")?;
    if header.alg != ALGORITHM {
        return Err(Error::Malformed("unsupported algorithm"));
    }

    let signature = Base64UrlUnpadded::decode_vec(sig_b64)
        .map_err(|_| Error::Malformed("invalid signature encoding"))?;
    let mut mac = mac(secret)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claims_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| Error::InvalidSignature)?;

    let claims: C = b64d_json(claims_b64, "invalid claims")?;
    if claims.expires_at() <= now_unix_seconds {
        return Err(Error::Expired);
    }

    Ok(claims)
}
