//! Payment configuration and the shared gateway handle.

use secrecy::SecretString;
use std::sync::Arc;

use super::gateway::{Credentials, PaymentGateway, RazorpayGateway};

const DEFAULT_API_URL: &str = "https://api.razorpay.com";
const DEFAULT_CURRENCY: &str = "INR";

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    api_url: String,
    frontend_base_url: String,
    key_id: Option<String>,
    key_secret: Option<SecretString>,
    currency: String,
}

impl PaymentConfig {
    #[must_use]
    pub fn new(api_url: String, frontend_base_url: String) -> Self {
        let api_url = if api_url.trim().is_empty() {
            DEFAULT_API_URL.to_string()
        } else {
            api_url
        };
        Self {
            api_url,
            frontend_base_url: frontend_base_url.trim_end_matches('/').to_string(),
            key_id: None,
            key_secret: None,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    #[must_use]
    pub fn with_key_id(mut self, key_id: Option<String>) -> Self {
        self.key_id = key_id;
        self
    }

    #[must_use]
    pub fn with_key_secret(mut self, key_secret: Option<SecretString>) -> Self {
        self.key_secret = key_secret;
        self
    }

    #[must_use]
    pub fn with_currency(mut self, currency: String) -> Self {
        self.currency = currency;
        self
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(crate) fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    pub(crate) fn currency(&self) -> &str {
        &self.currency
    }

    /// Both halves of the key pair, or `None` when either is missing.
    pub(crate) fn credentials(&self) -> Option<Credentials> {
        match (&self.key_id, &self.key_secret) {
            (Some(key_id), Some(key_secret)) => Some(Credentials {
                key_id: key_id.clone(),
                key_secret: key_secret.clone(),
            }),
            _ => None,
        }
    }
}

pub struct PaymentState {
    config: PaymentConfig,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentState {
    /// Build state backed by the HTTP gateway client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: PaymentConfig) -> anyhow::Result<Self> {
        let gateway = Arc::new(RazorpayGateway::new(config.api_url())?);
        Ok(Self::with_gateway(config, gateway))
    }

    #[must_use]
    pub fn with_gateway(config: PaymentConfig, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { config, gateway }
    }

    #[must_use]
    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }

    pub(crate) fn gateway(&self) -> &dyn PaymentGateway {
        self.gateway.as_ref()
    }
}

impl std::fmt::Debug for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
