use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 of `order_id|payment_id`, as the gateway signs callbacks.
pub(crate) fn expected_signature(secret: &str, order_id: &str, payment_id: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison of the provided signature against the expected one.
pub(crate) fn verify_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    provided: &str,
) -> bool {
    expected_signature(secret, order_id, payment_id)
        .is_some_and(|expected| expected.as_bytes().ct_eq(provided.trim().as_bytes()).into())
}
