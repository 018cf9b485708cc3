use std::{collections::HashMap, env, fmt::Display, str::FromStr};

use chrono::Duration;
use log::*;
use notification_tools::NotificationConfig;
use spg_common::{Cents, Secret};
use spice_payment_engine::{MatchingRules, PaymentGateway};

use crate::errors::ServerError;

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/spice_store.db";
const DEFAULT_VERIFICATION_INTERVAL_MINUTES: u64 = 15;
const DEFAULT_STALE_ORDER_HOURS: i64 = 24;
const DEFAULT_MATCH_TOLERANCE_CENTS: i64 = 2;
const DEFAULT_MIN_CONFIDENCE: u8 = 70;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// When set, the admin routes require this key in the `x-api-key` header.
    pub admin_api_key: Secret<String>,
    /// How often the background worker runs the pending payment sweep. `None` disables the worker.
    pub verification_interval: Option<std::time::Duration>,
    /// Pending orders older than this are flagged during the sweep.
    pub stale_order_threshold: Duration,
    pub matching_rules: MatchingRules,
    pub webhooks: WebhookConfig,
    pub notifications: NotificationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            admin_api_key: Secret::default(),
            verification_interval: Some(std::time::Duration::from_secs(DEFAULT_VERIFICATION_INTERVAL_MINUTES * 60)),
            stale_order_threshold: Duration::hours(DEFAULT_STALE_ORDER_HOURS),
            matching_rules: MatchingRules::default(),
            webhooks: WebhookConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPG_HOST").ok().unwrap_or_else(|| DEFAULT_SPG_HOST.into());
        let port = parse_env_or("SPG_PORT", DEFAULT_SPG_PORT);
        let database_url = env::var("SPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SPG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let admin_api_key = Secret::new(env::var("SPG_ADMIN_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SPG_ADMIN_API_KEY is not set. The admin routes are NOT protected.");
            String::default()
        }));
        let interval = parse_env_or("SPG_VERIFICATION_INTERVAL_MINUTES", DEFAULT_VERIFICATION_INTERVAL_MINUTES);
        let verification_interval = if interval == 0 {
            info!("🪛️ The scheduled payment verification worker is disabled.");
            None
        } else {
            Some(std::time::Duration::from_secs(interval * 60))
        };
        let stale_order_threshold = Duration::hours(parse_env_or("SPG_STALE_ORDER_HOURS", DEFAULT_STALE_ORDER_HOURS));
        let tolerance = Cents::from(parse_env_or("SPG_MATCH_TOLERANCE_CENTS", DEFAULT_MATCH_TOLERANCE_CENTS));
        let min_confidence = parse_env_or("SPG_MIN_CONFIDENCE", DEFAULT_MIN_CONFIDENCE).min(100);
        let matching_rules = MatchingRules::default().with_tolerance(tolerance).with_min_confidence(min_confidence);
        let webhooks = WebhookConfig::from_env_or_default();
        let notifications = NotificationConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            admin_api_key,
            verification_interval,
            stale_order_threshold,
            matching_rules,
            webhooks,
            notifications,
        }
    }
}

/// Reads and parses an environment variable, logging and falling back to `default` when it is missing or invalid.
fn parse_env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

//-------------------------------------------------  Webhooks  ---------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebhookAuthMode {
    /// The header carries an HMAC-SHA256 of the raw request body, keyed with the secret (hex or base64 encoded).
    Hmac,
    /// The header carries the shared secret itself.
    Token,
    None,
}

impl FromStr for WebhookAuthMode {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hmac" => Ok(Self::Hmac),
            "token" => Ok(Self::Token),
            "none" | "off" | "false" | "0" => Ok(Self::None),
            other => Err(ServerError::ConfigurationError(format!("Unknown webhook auth mode: {other}"))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct WebhookAuth {
    pub mode: WebhookAuthMode,
    pub header: String,
    pub secret: Secret<String>,
}

impl WebhookAuth {
    pub fn none() -> Self {
        Self { mode: WebhookAuthMode::None, header: String::default(), secret: Secret::default() }
    }

    pub fn hmac<S: Into<String>>(header: &str, secret: S) -> Self {
        Self { mode: WebhookAuthMode::Hmac, header: header.to_ascii_lowercase(), secret: Secret::new(secret.into()) }
    }

    pub fn token<S: Into<String>>(header: &str, secret: S) -> Self {
        Self { mode: WebhookAuthMode::Token, header: header.to_ascii_lowercase(), secret: Secret::new(secret.into()) }
    }

    pub fn is_enabled(&self) -> bool {
        self.mode != WebhookAuthMode::None
    }

    /// The header and mode each gateway uses when only a secret is configured.
    fn gateway_default(gateway: PaymentGateway) -> (&'static str, WebhookAuthMode) {
        match gateway {
            PaymentGateway::InfinitePay => ("x-infinitepay-signature", WebhookAuthMode::Hmac),
            PaymentGateway::PagSeguro => ("x-authenticity-token", WebhookAuthMode::Token),
            PaymentGateway::Asaas => ("asaas-access-token", WebhookAuthMode::Token),
        }
    }

    pub fn from_env_for(gateway: PaymentGateway) -> Self {
        let prefix = format!("SPG_{}_WEBHOOK", gateway.as_str().to_ascii_uppercase());
        let (default_header, default_mode) = Self::gateway_default(gateway);
        let secret = env::var(format!("{prefix}_SECRET")).ok().filter(|s| !s.is_empty());
        let header = env::var(format!("{prefix}_HEADER")).ok().unwrap_or_else(|| default_header.to_string());
        let mode = match env::var(format!("{prefix}_AUTH")) {
            Ok(s) => s.parse::<WebhookAuthMode>().unwrap_or_else(|e| {
                error!("🪛️ {e} [{prefix}_AUTH]. Falling back to {default_mode:?}.");
                default_mode
            }),
            Err(_) if secret.is_some() => default_mode,
            Err(_) => WebhookAuthMode::None,
        };
        match (mode, secret) {
            (WebhookAuthMode::None, _) => {
                warn!("🪛️ Webhook authentication for {gateway} is disabled. Set {prefix}_SECRET to enable it.");
                Self::none()
            },
            (mode, None) => {
                error!(
                    "🪛️ {prefix}_AUTH is {mode:?} but {prefix}_SECRET is not set. All {gateway} webhooks will be \
                     rejected."
                );
                Self { mode, header: header.to_ascii_lowercase(), secret: Secret::default() }
            },
            (mode, Some(secret)) => {
                info!("🪛️ {gateway} webhooks are authenticated with {mode:?} in the '{header}' header");
                Self { mode, header: header.to_ascii_lowercase(), secret: Secret::new(secret) }
            },
        }
    }
}

/// Webhook authentication settings, per gateway.
#[derive(Clone, Debug, Default)]
pub struct WebhookConfig {
    gateways: HashMap<PaymentGateway, WebhookAuth>,
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let gateways = [PaymentGateway::InfinitePay, PaymentGateway::PagSeguro, PaymentGateway::Asaas]
            .into_iter()
            .map(|g| (g, WebhookAuth::from_env_for(g)))
            .collect();
        Self { gateways }
    }

    pub fn with_auth(mut self, gateway: PaymentGateway, auth: WebhookAuth) -> Self {
        self.gateways.insert(gateway, auth);
        self
    }

    pub fn auth_for(&self, gateway: PaymentGateway) -> Option<&WebhookAuth> {
        self.gateways.get(&gateway).filter(|a| a.is_enabled())
    }
}
