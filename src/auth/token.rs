//! Access token decoding.
//!
//! Tokens are decoded, never verified: the server is the only party that
//! checks signatures. The client only needs the header (`alg`, `typ`) and the
//! `exp` / `user` claims to describe the current session.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde::de::DeserializeOwned;

use crate::error::{FastSchemaError, Result};
use crate::models::{AuthData, TokenHeader, TokenPayload};

/// URL-safe base64 that accepts segments with or without `=` padding.
pub(crate) const JWT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Split a token into its decoded header and payload.
pub fn decode_token(token: &str) -> Result<(TokenHeader, TokenPayload)> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(FastSchemaError::decode(format!(
            "Invalid token: expected 3 segments, found {}",
            parts.len()
        )));
    }

    let header = decode_segment::<TokenHeader>(parts[0], "header")?;
    let payload = decode_segment::<TokenPayload>(parts[1], "payload")?;
    Ok((header, payload))
}

/// Build [`AuthData`] from a token alone. `expires` is left empty.
pub fn parse_auth_data(token: &str) -> Result<AuthData> {
    let (header, payload) = decode_token(token)?;
    Ok(AuthData {
        alg: header.alg,
        typ: header.typ,
        exp: payload.exp,
        user: payload.user,
        token: token.trim().to_string(),
        expires: String::new(),
    })
}

fn decode_segment<T: DeserializeOwned>(segment: &str, part: &str) -> Result<T> {
    let bytes = JWT_BASE64
        .decode(segment)
        .map_err(|e| FastSchemaError::decode(format!("Invalid token {} base64: {}", part, e)))?;

    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| FastSchemaError::decode(format!("Invalid token {} JSON: {}", part, e)))?;
    if !value.is_object() {
        return Err(FastSchemaError::decode(format!("Invalid token {}: not an object", part)));
    }

    serde_json::from_value(value)
        .map_err(|e| FastSchemaError::decode(format!("Invalid token {}: {}", part, e)))
}

#[cfg(test)]
pub(crate) fn encode_token(header: &serde_json::Value, payload: &serde_json::Value) -> String {
    format!(
        "{}.{}.signature",
        JWT_BASE64.encode(header.to_string()),
        JWT_BASE64.encode(payload.to_string())
    )
}
