//! Webhook signature verification (HMAC-SHA256).
//!
//! GitHub signs each delivery with the shared webhook secret and sends the
//! result in `X-Hub-Signature-256` as `sha256=<hex>`. A delivery whose
//! signature does not verify is dropped before its body is parsed.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature (`X-Hub-Signature-256`).
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Decodes a `sha256=<hex>` header value into raw signature bytes.
///
/// Returns `None` for a missing prefix, another algorithm, or invalid hex.
///
/// ```
/// use ballot_bot::webhooks::parse_signature_header;
///
/// assert_eq!(parse_signature_header("sha256=00ff"), Some(vec![0x00, 0xff]));
/// assert!(parse_signature_header("sha1=00ff").is_none());
/// assert!(parse_signature_header("sha256=zz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha256=")?;
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA256 of `payload` under `secret`.
///
/// HMAC accepts keys of any length, so this only returns `None` if the
/// underlying implementation rejects the key.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Formats signature bytes as a header value (`sha256=<hex>`).
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Signs `payload` and returns the header value GitHub would send.
pub fn sign_payload(payload: &[u8], secret: &[u8]) -> Option<String> {
    compute_signature(payload, secret).map(|sig| format_signature_header(&sig))
}

/// Verifies a delivery against the shared secret.
///
/// The comparison is constant-time. Malformed headers fail verification.
///
/// ```
/// use ballot_bot::webhooks::{sign_payload, verify_signature};
///
/// let body = br#"{"action":"opened"}"#;
/// let header = sign_payload(body, b"shh").unwrap();
///
/// assert!(verify_signature(body, &header, b"shh"));
/// assert!(!verify_signature(body, &header, b"not-the-secret"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
