use super::token_cache::TokenCache;
use crate::config::PaymentHubConfig;
use crate::domain::gateway::{DispatchOutcome, GatewayRequest};
use crate::domain::ports::Gateway;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Characters left untouched by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Session id sent in the `BrokerProperties` header of every message.
pub const BROKER_SESSION_ID: &str = "123";

pub fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// Builds a `SharedAccessSignature` token valid until `expiry` (epoch seconds).
pub fn generate_sas_token(
    resource_uri: &str,
    key_name: &str,
    key: &str,
    expiry: i64,
) -> Result<String> {
    let encoded_uri = encode_uri_component(resource_uri);
    let string_to_sign = format!("{encoded_uri}\n{expiry}");

    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|err| PaymentError::Configuration(format!("invalid payment hub key: {err}")))?;
    mac.update(string_to_sign.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    Ok(format!(
        "SharedAccessSignature sr={encoded_uri}&sig={}&se={expiry}&skn={key_name}",
        encode_uri_component(&signature)
    ))
}

/// Sends payment instructions to the Payment Hub service bus.
///
/// One `PaymentHubClient` is built at startup; its token cache is shared by
/// every dispatch of every run.
pub struct PaymentHubClient {
    config: PaymentHubConfig,
    http: reqwest::Client,
    tokens: Arc<TokenCache>,
}

impl PaymentHubClient {
    pub fn new(config: PaymentHubConfig, tokens: Arc<TokenCache>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .build()?;
        Ok(Self {
            config,
            http,
            tokens,
        })
    }

    pub fn messages_url(&self) -> String {
        format!("{}/messages", self.config.uri.trim_end_matches('/'))
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (self.config.key_name.as_deref(), self.config.key.as_deref()) {
            (Some(name), Some(key)) if !name.is_empty() && !key.is_empty() => Ok((name, key)),
            _ => Err(PaymentError::Configuration(
                "Payment Hub key name or key is not set".to_string(),
            )),
        }
    }

    async fn access_token(&self) -> Result<String> {
        let (key_name, key) = self.credentials()?;
        let uri = self.config.uri.as_str();
        let ttl = self.tokens.ttl();
        self.tokens
            .get_or_generate(|| {
                let expiry = chrono::Utc::now().timestamp() + ttl.as_secs() as i64;
                generate_sas_token(uri, key_name, key, expiry)
            })
            .await
    }
}

#[async_trait]
impl Gateway for PaymentHubClient {
    fn check_configuration(&self) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        self.credentials().map(|_| ())
    }

    async fn dispatch(&self, request: &GatewayRequest) -> Result<DispatchOutcome> {
        if !self.config.enabled {
            let payload = serde_json::to_string(request)?;
            warn!(
                %payload,
                "The PaymentHub feature flag is disabled. The request has not been sent to payment hub"
            );
            return Ok(DispatchOutcome::disabled(request.clone()));
        }

        let token = self.access_token().await?;
        let broker_properties = serde_json::json!({ "SessionId": BROKER_SESSION_ID }).to_string();
        let body = serde_json::to_vec(request)?;

        let send = self
            .http
            .post(self.messages_url())
            .header(reqwest::header::AUTHORIZATION, token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("BrokerProperties", broker_properties)
            .body(body)
            .send();

        let response = tokio::time::timeout(self.config.timeout, send)
            .await
            .map_err(|_| PaymentError::DispatchTimeout(self.config.timeout))??;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.tokens.invalidate().await;
            }
            return Err(PaymentError::DispatchFailed(status.to_string()));
        }

        info!(invoice_number = %request.invoice_number, "The PaymentHub request sent successfully");
        Ok(DispatchOutcome::sent(request.clone(), status.as_u16()))
    }
}
