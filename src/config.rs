use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;

use crate::domain::payout::CommissionSettings;
use crate::error::{AppError, AppResult};
use crate::utils::percent_to_bp;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub commission: CommissionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

/// 全局佣金默认值，数据库中没有设置行时使用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionConfig {
    #[serde(default = "default_commission_enabled")]
    pub enabled: bool,
    #[serde(default = "default_commission_percent")]
    pub percent: Decimal,
}

fn default_commission_enabled() -> bool {
    true
}

fn default_commission_percent() -> Decimal {
    Decimal::TEN
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            enabled: default_commission_enabled(),
            percent: default_commission_percent(),
        }
    }
}

impl CommissionConfig {
    pub fn settings(&self) -> AppResult<CommissionSettings> {
        let percent_bp = percent_to_bp(self.percent)
            .map_err(|e| AppError::ConfigError(format!("commission.percent: {e}")))?;
        Ok(CommissionSettings {
            enabled: self.enabled,
            percent_bp,
        })
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => Self::from_toml_str(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and config.toml was not found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                    },
                    commission: CommissionConfig {
                        enabled: get_env_parse("COMMISSION_ENABLED", default_commission_enabled()),
                        percent: get_env_parse("COMMISSION_PERCENT", default_commission_percent()),
                    },
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("COMMISSION_ENABLED")
            && let Ok(b) = v.parse()
        {
            config.commission.enabled = b;
        }
        if let Ok(v) = env::var("COMMISSION_PERCENT")
            && let Ok(p) = v.parse()
        {
            config.commission.percent = p;
        }

        config.commission.settings()?;

        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Config =
            toml::from_str(raw).map_err(|e| format!("Failed to parse config file: {e}"))?;
        Ok(config)
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
