//! Private-REST request signing for the two venues the Execution Engine
//! trades on directly (spec.md §4.7.3).

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};

/// Bybit V5: `sign = HMAC_SHA256(secret, ts + key + recvWindow + payload)`,
/// where `payload` is the sorted-and-urlencoded query string for GET or the
/// compact JSON body for POST.
pub fn bybit_rest_signature(secret: &str, timestamp_ms: i64, api_key: &str, recv_window_ms: u64, payload: &str) -> String {
    let sign_payload = format!("{timestamp_ms}{api_key}{recv_window_ms}{payload}");
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(sign_payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Gate v4: `SIGN = HMAC_SHA512(secret, method + '\n' + path + '\n' +
/// query + '\n' + sha512(body) + '\n' + timestamp)`. For GET requests
/// `body` is empty, so `sha512(body)` is the hash of the empty string.
pub fn gate_rest_signature(secret: &str, method: &str, path: &str, query: &str, body: &str, timestamp_s: i64) -> String {
    let body_hash = sha512_hex(body);
    let sign_str = format!("{method}\n{path}\n{query}\n{body_hash}\n{timestamp_s}");
    let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(sign_str.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn sha512_hex(body: &str) -> String {
    use sha2::Digest;
    let mut hasher = Sha512::new();
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bybit_signature_is_deterministic_64_hex_chars() {
        let sig1 = bybit_rest_signature("secret", 1_700_000_000_000, "key", 5000, "category=linear&symbol=BTCUSDT");
        let sig2 = bybit_rest_signature("secret", 1_700_000_000_000, "key", 5000, "category=linear&symbol=BTCUSDT");
        assert_eq!(sig1, sig2);
        assert_eq!(sig1.len(), 64);
    }

    #[test]
    fn gate_signature_of_empty_body_matches_empty_string_hash() {
        let sig = gate_rest_signature("secret", "GET", "/api/v4/futures/usdt/orders/1", "contract=BTC_USDT", "", 1_700_000_000);
        assert_eq!(sig.len(), 128); // SHA-512 hex digest
    }

    #[test]
    fn gate_signature_changes_with_body() {
        let empty = gate_rest_signature("secret", "POST", "/api/v4/futures/usdt/orders", "", "", 1_700_000_000);
        let nonempty = gate_rest_signature("secret", "POST", "/api/v4/futures/usdt/orders", "", "{\"size\":1}", 1_700_000_000);
        assert_ne!(empty, nonempty);
    }
}
