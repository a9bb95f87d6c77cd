//! Checkout against the payment gateway and the payment log.
//!
//! Checkout creates a gateway order whose notes remember where the browser
//! should land afterwards. The gateway then posts the order id, payment id and
//! an HMAC-SHA256 signature back to `/api/paymentverification`; only payments
//! with a valid signature are recorded.

pub(crate) mod checkout;
mod gateway;
pub(crate) mod list;
mod signature;
mod state;
pub(crate) mod storage;
pub(crate) mod types;
pub(crate) mod verify;

pub use gateway::{Credentials, GatewayError, OrderRequest, PaymentGateway, RazorpayGateway};
pub use state::{PaymentConfig, PaymentState};

pub(crate) const DEFAULT_RETURN_PATH: &str = "/dashboard";

/// Accept only same-origin paths (`/x`, never `//host`).
pub(crate) fn safe_return_path(candidate: Option<&str>) -> String {
    match candidate.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => DEFAULT_RETURN_PATH.to_string(),
    }
}

#[cfg(test)]
mod tests;
