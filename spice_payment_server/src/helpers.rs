use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 of `data`, keyed with `secret`. Returns the raw MAC bytes.
pub fn hmac_sha256(secret: &str, data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take a key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Base64 encoded HMAC-SHA256 signature.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    base64::encode(hmac_sha256(secret, data))
}

/// Checks a signature header against the body. Gateways differ in how they encode the digest, so lower-case hex,
/// base64 and a `sha256=` prefix are all accepted.
pub fn signature_matches(secret: &str, data: &[u8], signature: &str) -> bool {
    let signature = signature.trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);
    let mac = hmac_sha256(secret, data);
    let hex_sig = hex::encode(&mac);
    constant_time_eq(&hex_sig, &signature.to_ascii_lowercase()) || constant_time_eq(&base64::encode(&mac), signature)
}

pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().iter().zip(b.as_bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
