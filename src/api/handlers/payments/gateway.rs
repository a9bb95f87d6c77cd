//! Payment gateway client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct Credentials {
    pub key_id: String,
    pub key_secret: SecretString,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderNotes {
    #[serde(rename = "returnUrl")]
    pub return_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Minor currency units (paise for INR).
    pub amount: i64,
    pub currency: String,
    pub notes: OrderNotes,
}

#[derive(Debug)]
pub enum GatewayError {
    /// The gateway answered with a non-success status.
    Status { status: u16, description: String },
    /// The request never produced a usable answer.
    Transport(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status {
                status,
                description,
            } => write!(f, "gateway returned {status}: {description}"),
            Self::Transport(message) => write!(f, "gateway request failed: {message}"),
        }
    }
}

impl std::error::Error for GatewayError {}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order and return the gateway's order object.
    async fn create_order(
        &self,
        credentials: &Credentials,
        request: &OrderRequest,
    ) -> Result<Value, GatewayError>;

    /// Fetch a previously created order.
    async fn fetch_order(
        &self,
        credentials: &Credentials,
        order_id: &str,
    ) -> Result<Value, GatewayError>;
}

/// Razorpay-compatible REST client (`/v1/orders`, HTTP basic auth).
#[derive(Debug, Clone)]
pub struct RazorpayGateway {
    client: Client,
    api_url: String,
}

impl RazorpayGateway {
    /// Build the client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn orders_url(&self) -> String {
        format!("{}/v1/orders", self.api_url)
    }

    async fn read_response(response: reqwest::Response) -> Result<Value, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|err| GatewayError::Transport(err.to_string()));
        }

        // Error bodies are not always JSON.
        let body = response.text().await.unwrap_or_default();
        let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        Err(GatewayError::Status {
            status: status.as_u16(),
            description: error_description(&body, status),
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[instrument(skip(self, credentials, request), fields(amount = request.amount))]
    async fn create_order(
        &self,
        credentials: &Credentials,
        request: &OrderRequest,
    ) -> Result<Value, GatewayError> {
        let response = self
            .client
            .post(self.orders_url())
            .basic_auth(&credentials.key_id, Some(credentials.key_secret.expose_secret()))
            .json(request)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        debug!(status = %response.status(), "create order response");
        Self::read_response(response).await
    }

    #[instrument(skip(self, credentials))]
    async fn fetch_order(
        &self,
        credentials: &Credentials,
        order_id: &str,
    ) -> Result<Value, GatewayError> {
        let url = format!("{}/{}", self.orders_url(), urlencode(order_id));
        let response = self
            .client
            .get(url)
            .basic_auth(&credentials.key_id, Some(credentials.key_secret.expose_secret()))
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Self::read_response(response).await
    }
}

fn urlencode(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

fn error_description(body: &Value, status: StatusCode) -> String {
    body.pointer("/error/description")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Failed to create order")
                .to_string()
        })
}
