use crate::api;
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub jwt_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub payment_key_id: Option<String>,
    pub payment_key_secret: Option<SecretString>,
    pub payment_api_url: String,
    pub payment_currency: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config =
        api::handlers::auth::AuthConfig::new(args.jwt_secret, args.frontend_base_url.clone())
            .with_session_ttl_seconds(args.session_ttl_seconds);

    let payment_config = api::handlers::payments::PaymentConfig::new(
        args.payment_api_url,
        args.frontend_base_url,
    )
    .with_key_id(args.payment_key_id)
    .with_key_secret(args.payment_key_secret)
    .with_currency(args.payment_currency);

    api::new(args.port, args.dsn, auth_config, payment_config).await
}
