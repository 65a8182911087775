use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs the query-string portion of an ERP request.
///
/// `query` is everything after the `?` (never the `?` itself), byte for byte
/// as it appears in the request URL; POST requests sign the empty string.
/// Any difference between the signed and the sent query string gets the
/// request rejected with 403.
pub fn sign(query: &str, api_key: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(api_key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(query.as_bytes());
    general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}
