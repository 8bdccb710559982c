use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use chrono::{Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::alert::rules::Thresholds;
use crate::errors::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub morpho: MorphoConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_entities")]
    pub entities: Vec<TrackedEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_digest_hour")]
    pub digest_hour: u32,
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(flatten)]
    pub thresholds: Thresholds,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_true")]
    pub enable_stdout: bool,
    #[serde(default)]
    pub discord_webhook: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RpcConfig {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorphoConfig {
    #[serde(default = "default_morpho_api_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

/// One monitored pool or vault. Immutable after startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedEntity {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub adapter: AdapterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AdapterConfig {
    Aave {
        pool: String,
        asset: String,
        #[serde(default)]
        decimals: Option<u8>,
    },
    Morpho {
        vault: String,
        #[serde(default = "default_morpho_chain_id")]
        chain_id: u64,
        #[serde(default = "default_token_decimals")]
        decimals: u8,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Aave,
    Morpho,
}

impl SourceKind {
    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Aave => "aave",
            Self::Morpho => "morpho",
        }
    }
}

impl AdapterConfig {
    pub fn source(&self) -> SourceKind {
        match self {
            Self::Aave { .. } => SourceKind::Aave,
            Self::Morpho { .. } => SourceKind::Morpho,
        }
    }

}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/liquidity-watch/config.toml")
    }

    /// Read the TOML file (defaults when it does not exist), apply env
    /// overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse the file as-is, without env overrides or validation.
    pub fn read(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        let config = if path.exists() {
            let data = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            Self::from_toml(&data).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?
        } else {
            Self::default()
        };
        Ok(config)
    }

    pub fn from_toml(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }

    /// Only non-empty values take effect.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get("RPC_URL") {
            info!("env override: RPC_URL");
            self.rpc.url = url;
        }
        if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
            info!("env override: TELEGRAM_BOT_TOKEN");
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = get("TELEGRAM_CHAT_ID") {
            info!("env override: TELEGRAM_CHAT_ID");
            self.telegram.chat_id = chat_id;
        }
        if let Some(webhook) = get("DISCORD_WEBHOOK") {
            info!("env override: DISCORD_WEBHOOK");
            self.alerts.discord_webhook = webhook;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.alerts.thresholds.warning >= self.alerts.thresholds.critical {
            return invalid(format!(
                "warning threshold {} must be below critical threshold {}",
                self.alerts.thresholds.warning, self.alerts.thresholds.critical
            ));
        }
        if self.schedule.poll_interval_secs == 0 {
            return invalid("schedule.poll_interval_secs must be positive".to_string());
        }
        if self.schedule.fetch_timeout_secs == 0 {
            return invalid("schedule.fetch_timeout_secs must be positive".to_string());
        }
        if self.cooldown().is_none() {
            return invalid(format!(
                "alerts.cooldown_secs out of range: {}",
                self.alerts.cooldown_secs
            ));
        }
        if self.schedule.digest_hour >= 24 {
            return invalid(format!(
                "schedule.digest_hour must be 0-23, got {}",
                self.schedule.digest_hour
            ));
        }
        if self.utc_offset().is_none() {
            return invalid(format!(
                "schedule.utc_offset_minutes out of range: {}",
                self.schedule.utc_offset_minutes
            ));
        }

        let mut seen = BTreeSet::new();
        for entity in &self.entities {
            if entity.id.trim().is_empty() {
                return invalid(format!("entity '{}' has an empty id", entity.name));
            }
            if !seen.insert(entity.id.as_str()) {
                return invalid(format!("duplicate entity id: {}", entity.id));
            }
            match &entity.adapter {
                AdapterConfig::Aave { pool, asset, .. } => {
                    if self.rpc.url.trim().is_empty() {
                        return invalid(format!(
                            "entity {} needs rpc.url (or RPC_URL)",
                            entity.id
                        ));
                    }
                    parse_address(&entity.id, "pool", pool)?;
                    parse_address(&entity.id, "asset", asset)?;
                }
                AdapterConfig::Morpho { vault, .. } => {
                    parse_address(&entity.id, "vault", vault)?;
                }
            }
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.schedule.utc_offset_minutes.checked_mul(60)?)
    }

    /// `None` when `cooldown_secs` does not fit a chrono duration.
    pub fn cooldown(&self) -> Option<Duration> {
        Duration::try_seconds(i64::try_from(self.alerts.cooldown_secs).ok()?)
    }

    /// Copy safe to print: the bot token is masked, the webhook and RPC URLs
    /// keep only scheme and host.
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if !shown.telegram.bot_token.is_empty() {
            shown.telegram.bot_token = REDACTED.to_string();
        }
        shown.alerts.discord_webhook = redact_url(&shown.alerts.discord_webhook);
        shown.rpc.url = redact_url(&shown.rpc.url);
        shown
    }

    pub fn telegram_enabled(&self) -> bool {
        !self.telegram.bot_token.trim().is_empty() && !self.telegram.chat_id.trim().is_empty()
    }

    pub fn write_template(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, Self::default_template())
    }

    pub fn default_template() -> String {
        let template = r#"[schedule]
poll_interval_secs = 600
digest_hour = 9
utc_offset_minutes = 480
fetch_timeout_secs = 30

[alerts]
warning = 90.0
critical = 95.0
cooldown_secs = 3600
enable_stdout = true
discord_webhook = ""

[telegram]
bot_token = ""
chat_id = ""

[rpc]
url = ""

[morpho]
api_url = "https://api.morpho.org/graphql"

[logging]
filter = "liquidity_watch=info,warn"
json = false

[[entities]]
id = "aave-v3-usdc"
name = "AAVE V3 USDC"
source = "aave"
pool = "0x87870Bca3F3fD6335C3F4ce8392D69350B4fA4E2"
asset = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
decimals = 6

[[entities]]
id = "morpho-gauntlet-usdc-prime"
name = "Gauntlet USDC Prime"
source = "morpho"
vault = "0xeE8F4eC5672F09119b96Ab6fB59C27E1b7e44b61"
chain_id = 8453
decimals = 6

[[entities]]
id = "morpho-steakhouse-prime-usdc"
name = "Steakhouse Prime USDC"
source = "morpho"
vault = "0xBEEFE94c8aD530842bfE7d8B397938fFc1cb83b2"
chain_id = 8453
decimals = 6
"#;
        template.to_string()
    }
}

const REDACTED: &str = "<redacted>";

fn redact_url(raw: &str) -> String {
    if raw.trim().is_empty() {
        return raw.to_string();
    }
    match reqwest::Url::parse(raw.trim()) {
        Ok(url) => match url.host_str() {
            Some(host) => format!("{}://{host}/{REDACTED}", url.scheme()),
            None => REDACTED.to_string(),
        },
        Err(_) => REDACTED.to_string(),
    }
}

pub fn parse_address(entity: &str, field: &str, raw: &str) -> Result<Address, ConfigError> {
    raw.trim().parse::<Address>().map_err(|e| {
        ConfigError::Invalid(format!("entity {entity}: invalid {field} address {raw}: {e}"))
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            alerts: AlertsConfig::default(),
            telegram: TelegramConfig::default(),
            rpc: RpcConfig::default(),
            morpho: MorphoConfig::default(),
            logging: LoggingConfig::default(),
            entities: default_entities(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            digest_hour: default_digest_hour(),
            utc_offset_minutes: default_utc_offset_minutes(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            cooldown_secs: default_cooldown_secs(),
            enable_stdout: true,
            discord_webhook: String::new(),
        }
    }
}

impl Default for MorphoConfig {
    fn default() -> Self {
        Self {
            api_url: default_morpho_api_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_entities() -> Vec<TrackedEntity> {
    vec![
        TrackedEntity {
            id: "aave-v3-usdc".to_string(),
            name: "AAVE V3 USDC".to_string(),
            adapter: AdapterConfig::Aave {
                pool: "0x87870Bca3F3fD6335C3F4ce8392D69350B4fA4E2".to_string(),
                asset: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
                decimals: Some(6),
            },
        },
        TrackedEntity {
            id: "morpho-gauntlet-usdc-prime".to_string(),
            name: "Gauntlet USDC Prime".to_string(),
            adapter: AdapterConfig::Morpho {
                vault: "0xeE8F4eC5672F09119b96Ab6fB59C27E1b7e44b61".to_string(),
                chain_id: 8453,
                decimals: 6,
            },
        },
        TrackedEntity {
            id: "morpho-steakhouse-prime-usdc".to_string(),
            name: "Steakhouse Prime USDC".to_string(),
            adapter: AdapterConfig::Morpho {
                vault: "0xBEEFE94c8aD530842bfE7d8B397938fFc1cb83b2".to_string(),
                chain_id: 8453,
                decimals: 6,
            },
        },
    ]
}

fn default_poll_interval_secs() -> u64 {
    600
}

fn default_digest_hour() -> u32 {
    9
}

fn default_utc_offset_minutes() -> i32 {
    480
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_cooldown_secs() -> u64 {
    3600
}

fn default_morpho_api_url() -> String {
    "https://api.morpho.org/graphql".to_string()
}

fn default_morpho_chain_id() -> u64 {
    8453
}

fn default_token_decimals() -> u8 {
    6
}

fn default_log_filter() -> String {
    "liquidity_watch=info,warn".to_string()
}

fn default_true() -> bool {
    true
}
