use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_PAYMENT_KEY_ID: &str = "payment-key-id";
pub const ARG_PAYMENT_KEY_SECRET: &str = "payment-key-secret";
pub const ARG_PAYMENT_API_URL: &str = "payment-api-url";
pub const ARG_PAYMENT_CURRENCY: &str = "payment-currency";

#[derive(Debug, Clone)]
pub struct Options {
    pub key_id: Option<String>,
    pub key_secret: Option<SecretString>,
    pub api_url: String,
    pub currency: String,
}

impl Options {
    /// Parse payment gateway arguments from matches.
    ///
    /// Credentials stay optional: checkout endpoints report a misconfiguration
    /// at request time instead of refusing to boot.
    ///
    /// # Errors
    /// Returns an error if the currency code is malformed.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let currency = get_non_empty(ARG_PAYMENT_CURRENCY)
            .unwrap_or_else(|| "INR".to_string())
            .to_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            anyhow::bail!("--{ARG_PAYMENT_CURRENCY} must be a 3-letter ISO code");
        }

        Ok(Self {
            key_id: get_non_empty(ARG_PAYMENT_KEY_ID),
            key_secret: get_non_empty(ARG_PAYMENT_KEY_SECRET).map(SecretString::from),
            api_url: get_non_empty(ARG_PAYMENT_API_URL)
                .unwrap_or_else(|| "https://api.razorpay.com".to_string()),
            currency,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PAYMENT_KEY_ID)
                .long(ARG_PAYMENT_KEY_ID)
                .help("Payment gateway key id (public)")
                .env("USERDESK_PAYMENT_KEY_ID"),
        )
        .arg(
            Arg::new(ARG_PAYMENT_KEY_SECRET)
                .long(ARG_PAYMENT_KEY_SECRET)
                .help("Payment gateway key secret, also used for callback signatures")
                .env("USERDESK_PAYMENT_KEY_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_PAYMENT_API_URL)
                .long(ARG_PAYMENT_API_URL)
                .help("Payment gateway API base URL")
                .env("USERDESK_PAYMENT_API_URL")
                .default_value("https://api.razorpay.com"),
        )
        .arg(
            Arg::new(ARG_PAYMENT_CURRENCY)
                .long(ARG_PAYMENT_CURRENCY)
                .help("Currency used for checkout orders")
                .env("USERDESK_PAYMENT_CURRENCY")
                .default_value("INR"),
        )
}
