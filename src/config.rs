use clap::{ArgAction, Args};
use std::time::Duration;

/// Runtime settings, read from CLI flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Base URI of the Payment Hub service bus
    #[arg(long, env = "PAYMENT_HUB_URI", default_value = "https://paymenthub/")]
    pub payment_hub_uri: String,

    /// Lifetime of a Payment Hub access token, in seconds
    #[arg(long, env = "PAYMENT_HUB_TTL", default_value_t = 86_400)]
    pub payment_hub_ttl: u64,

    /// Shared access key name used to sign tokens
    #[arg(long, env = "PAYMENT_HUB_SA_KEY_NAME")]
    pub payment_hub_key_name: Option<String>,

    /// Shared access key used to sign tokens
    #[arg(long, env = "PAYMENT_HUB_SA_KEY", hide_env_values = true)]
    pub payment_hub_key: Option<String>,

    /// Send requests to the Payment Hub. When false, payloads are only logged.
    #[arg(long, env = "ENABLE_PAYMENT_HUB", default_value_t = false, action = ArgAction::Set)]
    pub enable_payment_hub: bool,

    /// Upper bound for a single Payment Hub call, in seconds
    #[arg(long, env = "PAYMENT_HUB_TIMEOUT_SECS", default_value_t = 30)]
    pub payment_hub_timeout_secs: u64,

    /// Maximum number of payments processed at once (unbounded if unset)
    #[arg(long, env = "PAYMENT_CONCURRENCY")]
    pub concurrency: Option<usize>,
}

impl Settings {
    pub fn payment_hub(&self) -> PaymentHubConfig {
        PaymentHubConfig {
            uri: self.payment_hub_uri.clone(),
            ttl: Duration::from_secs(self.payment_hub_ttl),
            key_name: self.payment_hub_key_name.clone(),
            key: self.payment_hub_key.clone(),
            enabled: self.enable_payment_hub,
            timeout: Duration::from_secs(self.payment_hub_timeout_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentHubConfig {
    pub uri: String,
    pub ttl: Duration,
    pub key_name: Option<String>,
    pub key: Option<String>,
    pub enabled: bool,
    pub timeout: Duration,
}
