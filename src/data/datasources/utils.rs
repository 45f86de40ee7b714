use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::de::DeserializeOwned;

use crate::errors::{MalformedNativePurchase, PurchaseError};

/// Decodes the payload from a compact JWS, without performing any signature
/// verification.
pub(crate) fn decode_jws_payload<T: DeserializeOwned>(jws: &str) -> Result<T, PurchaseError> {
    let mut segments = jws.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(MalformedNativePurchase::new("JWS is not in compact form.")),
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| MalformedNativePurchase::with_debug("JWS payload is not base64url.", &e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| MalformedNativePurchase::with_debug("failed to parse JWS payload", &e))
}

#[cfg(test)]
pub(crate) fn encode_test_jws(payload: &serde_json::Value) -> String {
    format!(
        "eyJhbGciOiJFUzI1NiJ9.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}
