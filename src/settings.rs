use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::wallet::fees::FeePolicy;

/// Timing knobs for the top-up confirmation poller.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PollerSettings {
    /// Delay before the first status check, giving the payment gateway
    /// time to register the intent.
    #[serde(default = "default_initial_delay", with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Spacing between consecutive status checks.
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Attempt budget; the session fails once this many checks have run
    /// without reaching a terminal status.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// How long the success phase stays observable before the session
    /// resets to idle.
    #[serde(default = "default_success_linger", with = "humantime_serde")]
    pub success_linger: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            initial_delay: default_initial_delay(),
            poll_interval: default_poll_interval(),
            max_attempts: default_max_attempts(),
            success_linger: default_success_linger(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct WalletSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub fee_policy: FeePolicy,
    #[serde(default = "default_min_topup_amount")]
    pub min_topup_amount: u64,
    #[serde(default = "default_max_topup_amount")]
    pub max_topup_amount: u64,
    #[serde(default)]
    pub poller: PollerSettings,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: default_timeout_ms(),
            fee_policy: FeePolicy::default(),
            min_topup_amount: default_min_topup_amount(),
            max_topup_amount: default_max_topup_amount(),
            poller: PollerSettings::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub wallet: WalletSettings,
}

impl Config {
    /// Load from config.toml (if present) and environment variables.
    /// Environment variables override file values.
    /// Supported env keys: WALLET_BASE_URL, WALLET_TIMEOUT_MS,
    /// WALLET_FEE_POLICY (tiered|free), WALLET_MIN_TOPUP, WALLET_MAX_TOPUP,
    /// WALLET_POLL_INITIAL_DELAY, WALLET_POLL_INTERVAL,
    /// WALLET_POLL_MAX_ATTEMPTS, WALLET_SUCCESS_LINGER
    pub fn load() -> Self {
        // 1) Start with defaults + config.toml only if it exists
        let base: Config = Default::default();
        let mut fig = Figment::from(Serialized::defaults(base));
        if std::path::Path::new("config.toml").exists() {
            fig = fig.merge(Toml::file("config.toml"));
        }
        let mut cfg: Config = fig.extract().unwrap_or_default();

        // 2) Overlay environment variables explicitly
        if let Ok(v) = std::env::var("WALLET_BASE_URL") {
            cfg.wallet.base_url = v;
        }
        if let Ok(v) = std::env::var("WALLET_TIMEOUT_MS") {
            cfg.wallet.timeout_ms = v.parse().unwrap_or(cfg.wallet.timeout_ms);
        }
        if let Ok(v) = std::env::var("WALLET_FEE_POLICY") {
            match v.to_ascii_lowercase().as_str() {
                "free" => cfg.wallet.fee_policy = FeePolicy::Free,
                "tiered" => {
                    if !matches!(cfg.wallet.fee_policy, FeePolicy::Tiered { .. }) {
                        cfg.wallet.fee_policy = FeePolicy::default();
                    }
                }
                _ => {}
            }
        }
        if let Ok(v) = std::env::var("WALLET_MIN_TOPUP") {
            cfg.wallet.min_topup_amount = v.parse().unwrap_or(cfg.wallet.min_topup_amount);
        }
        if let Ok(v) = std::env::var("WALLET_MAX_TOPUP") {
            cfg.wallet.max_topup_amount = v.parse().unwrap_or(cfg.wallet.max_topup_amount);
        }
        if let Ok(v) = std::env::var("WALLET_POLL_INITIAL_DELAY") {
            cfg.wallet.poller.initial_delay =
                parse_duration_env(&v, cfg.wallet.poller.initial_delay);
        }
        if let Ok(v) = std::env::var("WALLET_POLL_INTERVAL") {
            cfg.wallet.poller.poll_interval =
                parse_duration_env(&v, cfg.wallet.poller.poll_interval);
        }
        if let Ok(v) = std::env::var("WALLET_POLL_MAX_ATTEMPTS") {
            cfg.wallet.poller.max_attempts = v.parse().unwrap_or(cfg.wallet.poller.max_attempts);
        }
        if let Ok(v) = std::env::var("WALLET_SUCCESS_LINGER") {
            cfg.wallet.poller.success_linger =
                parse_duration_env(&v, cfg.wallet.poller.success_linger);
        }

        cfg
    }

    pub fn from_env() -> Self {
        Self::load()
    }
}

fn parse_duration_env(value: &str, current: Duration) -> Duration {
    humantime::parse_duration(value).unwrap_or(current)
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_min_topup_amount() -> u64 {
    10_000
}

fn default_max_topup_amount() -> u64 {
    10_000_000
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_max_attempts() -> u32 {
    36 // up to ~3 minutes at 5-second spacing
}

fn default_success_linger() -> Duration {
    Duration::from_secs(3)
}
