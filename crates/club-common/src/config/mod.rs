//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, CommunitySettings, ConfigError, CorsConfig, DatabaseConfig,
    Environment, RateLimitConfig, ServerConfig, SubscriptionConfig, TelegramConfig,
};
