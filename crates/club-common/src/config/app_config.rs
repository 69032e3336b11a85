//! Application configuration structs
//!
//! Loads configuration from environment variables (and an optional `.env`
//! file) once at startup. The resulting value is immutable and handed to the
//! rest of the application; nothing below this layer reads the environment.

use serde::Deserialize;
use std::env;
use std::str::FromStr;

use club_core::{
    Community, CommunityDefinition, CommunityRegistry, GroupId, RenewalDuration,
};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub telegram: TelegramConfig,
    pub subscription: SubscriptionConfig,
    pub communities: Vec<CommunitySettings>,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Messaging platform (Bot API) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
    /// Long-poll timeout for `getUpdates`
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Upper bound on every outbound messenger call
    #[serde(default = "default_messenger_timeout")]
    pub request_timeout_secs: u64,
}

/// Lifecycle timing
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    /// Renewal length when a community has none of its own
    pub default_duration: RenewalDuration,
    pub invite_ttl_secs: i64,
    pub warning_lead_secs: i64,
    pub expiry_sweep_interval_secs: u64,
    pub removal_retry_interval_secs: u64,
    pub warning_sweep_interval_secs: u64,
    pub status_report_interval_secs: u64,
}

/// Per-community settings before they are frozen into the registry
#[derive(Debug, Clone, Deserialize)]
pub struct CommunitySettings {
    pub community: Community,
    pub display_name: String,
    pub price: i64,
    pub group_id: GroupId,
    pub duration_secs: Option<i64>,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_app_name() -> String {
    "club-server".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_messenger_timeout() -> u64 {
    10
}

fn default_duration_secs() -> i64 {
    2_592_000 // 30 days
}

fn default_invite_ttl() -> i64 {
    86_400
}

fn default_warning_lead() -> i64 {
    86_400
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst() -> u32 {
    50
}

fn default_display_name(community: Community) -> &'static str {
    match community {
        Community::Nikotin => "Вільні від нікотину",
        Community::Food => "Вільні від їжі",
        Community::Social => "Вільні від думки інших",
    }
}

fn default_price(community: Community) -> i64 {
    match community {
        Community::Nikotin => 800,
        Community::Food | Community::Social => 600,
    }
}

/// Reads variables from some source; the process environment in production,
/// a map in tests
struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::MissingVar(key))
    }

    /// Absent is `None`; present but malformed is an error
    fn parsed<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| ConfigError::InvalidValue(key, raw))
            })
            .transpose()
    }

    /// Tolerant numeric read: absent or unparsable falls back to `None`
    fn lenient<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|s| s.parse().ok())
    }

    /// Positive seconds, falling back when absent, unparsable or non-positive
    fn positive_secs(&self, key: &str, fallback: i64) -> i64 {
        self.lenient::<i64>(key)
            .filter(|secs| *secs > 0)
            .unwrap_or(fallback)
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    ///
    /// # Errors
    /// Returns an error if required variables are missing or malformed
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let default_duration = RenewalDuration::from_secs(
            vars.positive_secs("SUBSCRIPTION_DEFAULT_DURATION_SECONDS", default_duration_secs()),
        )
        .ok_or(ConfigError::InvalidValue(
            "SUBSCRIPTION_DEFAULT_DURATION_SECONDS",
            "out of range".to_string(),
        ))?;

        let communities = Community::ALL
            .iter()
            .map(|&community| load_community(&vars, community))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            app: AppSettings {
                name: vars.get("APP_NAME").unwrap_or_else(default_app_name),
                env: vars
                    .get("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            api: ServerConfig {
                host: vars.get("API_HOST").unwrap_or_else(default_host),
                port: vars
                    .parsed("API_PORT")?
                    .ok_or(ConfigError::MissingVar("API_PORT"))?,
            },
            database: DatabaseConfig {
                url: vars.required("DATABASE_URL")?,
                max_connections: vars
                    .lenient("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(default_max_connections),
                min_connections: vars
                    .lenient("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(default_min_connections),
            },
            telegram: TelegramConfig {
                bot_token: vars.required("TELEGRAM_BOT_TOKEN")?,
                api_url: vars
                    .get("TELEGRAM_API_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(default_telegram_api_url),
                poll_timeout_secs: vars
                    .lenient("TELEGRAM_POLL_TIMEOUT_SECONDS")
                    .unwrap_or_else(default_poll_timeout),
                request_timeout_secs: vars
                    .lenient::<u64>("MESSENGER_TIMEOUT_SECONDS")
                    .filter(|secs| *secs > 0)
                    .unwrap_or_else(default_messenger_timeout),
            },
            subscription: SubscriptionConfig {
                default_duration,
                invite_ttl_secs: vars.positive_secs("INVITE_TTL_SECONDS", default_invite_ttl()),
                warning_lead_secs: vars
                    .positive_secs("EXPIRY_WARNING_LEAD_SECONDS", default_warning_lead()),
                expiry_sweep_interval_secs: interval(&vars, "EXPIRY_SWEEP_INTERVAL_SECONDS", 10),
                removal_retry_interval_secs: interval(&vars, "REMOVAL_RETRY_INTERVAL_SECONDS", 30),
                warning_sweep_interval_secs: interval(&vars, "WARNING_SWEEP_INTERVAL_SECONDS", 60),
                status_report_interval_secs: interval(&vars, "STATUS_REPORT_INTERVAL_SECONDS", 300),
            },
            communities,
            rate_limit: RateLimitConfig {
                requests_per_second: vars
                    .lenient("RATE_LIMIT_REQUESTS_PER_SECOND")
                    .unwrap_or_else(default_requests_per_second),
                burst: vars.lenient("RATE_LIMIT_BURST").unwrap_or_else(default_burst),
            },
            cors: CorsConfig {
                allowed_origins: vars
                    .get("CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        })
    }

    /// Freeze the community settings into the immutable registry
    #[must_use]
    pub fn registry(&self) -> CommunityRegistry {
        CommunityRegistry::new(
            self.subscription.default_duration,
            self.communities.iter().map(|settings| {
                CommunityDefinition::new(
                    settings.community,
                    settings.display_name.clone(),
                    settings.price,
                    settings.group_id,
                )
                .with_duration_secs(settings.duration_secs)
            }),
        )
    }
}

fn interval<F>(vars: &Vars<F>, key: &str, fallback: i64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    vars.positive_secs(key, fallback).unsigned_abs()
}

fn load_community<F>(vars: &Vars<F>, community: Community) -> Result<CommunitySettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (group_key, price_key) = match community {
        Community::Nikotin => ("NIKOTIN_GROUP_ID", "NIKOTIN_PRICE"),
        Community::Food => ("FOOD_GROUP_ID", "FOOD_PRICE"),
        Community::Social => ("SOCIAL_GROUP_ID", "SOCIAL_PRICE"),
    };
    let duration_key = format!("SUBSCRIPTION_DURATION_{}_SECONDS", community.env_key());

    let group_id = vars
        .parsed::<GroupId>(group_key)?
        .ok_or(ConfigError::MissingVar(group_key))?;

    let price = vars
        .parsed::<i64>(price_key)?
        .unwrap_or_else(|| default_price(community));
    if price < 0 {
        return Err(ConfigError::InvalidValue(price_key, price.to_string()));
    }

    Ok(CommunitySettings {
        community,
        display_name: default_display_name(community).to_string(),
        price,
        group_id,
        // Non-positive values are dropped by the registry, which then falls back
        duration_secs: vars.lenient(&duration_key),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
