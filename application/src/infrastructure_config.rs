use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::billing::retry::MAX_BACKOFF_MS;
use crate::error::{AppError, AppResult};
use domain::account::{AccountId, DEFAULT_ACCOUNT};
use domain::charge::{DEFAULT_CHARGE_DIVISOR, DEFAULT_STARTING_BALANCE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub billing: BillingConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
    pub environment: EnvironmentConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    #[serde(rename = "redis")]
    Redis,
    #[serde(rename = "memory")]
    Memory,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub endpoint: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<SecretString>,
    pub pool_size: usize,
    pub acquire_timeout_ms: u64,
}

impl Serialize for StoreConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("StoreConfig", 7)?;
        state.serialize_field("backend", &self.backend)?;
        state.serialize_field("endpoint", &self.endpoint)?;
        state.serialize_field("port", &self.port)?;
        state.serialize_field("db", &self.db)?;
        state.serialize_field(
            "password",
            &self.password.as_ref().map(|_| "[REDACTED]"),
        )?;
        state.serialize_field("pool_size", &self.pool_size)?;
        state.serialize_field("acquire_timeout_ms", &self.acquire_timeout_ms)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for StoreConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct StoreConfigHelper {
            backend: StoreBackend,
            endpoint: String,
            port: u16,
            db: i64,
            #[serde(default)]
            password: Option<String>,
            pool_size: usize,
            acquire_timeout_ms: u64,
        }

        let helper = StoreConfigHelper::deserialize(deserializer)?;
        Ok(StoreConfig {
            backend: helper.backend,
            endpoint: helper.endpoint,
            port: helper.port,
            db: helper.db,
            password: helper
                .password
                .filter(|password| !password.is_empty())
                .map(SecretString::from),
            pool_size: helper.pool_size,
            acquire_timeout_ms: helper.acquire_timeout_ms,
        })
    }
}

impl StoreConfig {
    pub fn redis_url(&self) -> AppResult<String> {
        let url = self.base_url()?;
        match &self.password {
            Some(password) => Self::with_password(url, password.expose_secret()),
            None => Ok(url.to_string()),
        }
    }

    #[must_use]
    pub fn redacted_url(&self) -> String {
        match self.base_url() {
            Ok(url) if self.password.is_some() => Self::with_password(url, "***")
                .unwrap_or_else(|_| "[INVALID_URL]".to_string()),
            Ok(url) => url.to_string(),
            Err(_) => "[INVALID_URL]".to_string(),
        }
    }

    fn base_url(&self) -> AppResult<Url> {
        Url::parse(&format!(
            "redis://{}:{}/{}",
            self.endpoint, self.port, self.db
        ))
        .map_err(|e| AppError::ConfigError {
            message: format!("Invalid store endpoint '{}': {e}", self.endpoint),
        })
    }

    fn with_password(mut url: Url, password: &str) -> AppResult<String> {
        url.set_password(Some(password))
            .map_err(|()| AppError::ConfigError {
                message: "Store URL cannot carry a password".to_string(),
            })?;
        Ok(url.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    pub default_balance: i64,
    pub charge_divisor: i64,
    pub default_account: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub jitter_max_percent: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_location: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "pretty")]
    Pretty,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                backend: StoreBackend::Redis,
                endpoint: "127.0.0.1".to_string(),
                port: 6379,
                db: 0,
                password: None,
                pool_size: 16,
                acquire_timeout_ms: 1000,
            },
            billing: BillingConfig {
                default_balance: DEFAULT_STARTING_BALANCE,
                charge_divisor: DEFAULT_CHARGE_DIVISOR,
                default_account: DEFAULT_ACCOUNT.to_string(),
            },
            retry: RetryConfig {
                max_attempts: 1,
                backoff_ms: 50,
                jitter_max_percent: 20,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
                include_location: false,
            },
            environment: EnvironmentConfig {
                env: "development".to_string(),
            },
        }
    }
}

impl Config {
    pub fn validate(&self) -> AppResult<()> {
        if self.store.endpoint.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "store endpoint cannot be empty".to_string(),
            });
        }

        if self.store.port == 0 {
            return Err(AppError::ConfigError {
                message: "store port must be greater than 0".to_string(),
            });
        }

        if self.store.db < 0 {
            return Err(AppError::ConfigError {
                message: "store db must be non-negative".to_string(),
            });
        }

        if self.store.pool_size == 0 {
            return Err(AppError::ConfigError {
                message: "store pool_size must be greater than 0".to_string(),
            });
        }

        if self.store.acquire_timeout_ms == 0 {
            return Err(AppError::ConfigError {
                message: "store acquire_timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.store.backend == StoreBackend::Redis {
            self.store.redis_url()?;
        }

        if self.billing.default_balance < 0 {
            return Err(AppError::ConfigError {
                message: "default_balance must be non-negative".to_string(),
            });
        }

        if self.billing.charge_divisor <= 0 {
            return Err(AppError::ConfigError {
                message: "charge_divisor must be greater than 0".to_string(),
            });
        }

        AccountId::new(self.billing.default_account.as_str()).map_err(|e| {
            AppError::ConfigError {
                message: format!("default_account is invalid: {e}"),
            }
        })?;

        if self.retry.max_attempts == 0 {
            return Err(AppError::ConfigError {
                message: "retry max_attempts must be greater than 0".to_string(),
            });
        }

        if self.retry.jitter_max_percent > 100 {
            return Err(AppError::ConfigError {
                message: "retry jitter_max_percent must be <= 100".to_string(),
            });
        }

        if self.retry.backoff_ms > MAX_BACKOFF_MS {
            return Err(AppError::ConfigError {
                message: format!("retry backoff_ms must be <= {MAX_BACKOFF_MS}"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_url_targets_local_store() -> AppResult<()> {
        let config = Config::default();
        assert_eq!(config.store.redis_url()?, "redis://127.0.0.1:6379/0");
        Ok(())
    }

    #[test]
    fn password_is_embedded_but_redacted_in_logs() -> AppResult<()> {
        let mut config = Config::default();
        config.store.endpoint = "cache.internal".to_string();
        config.store.password = Some(SecretString::from("hunter2"));

        assert_eq!(
            config.store.redis_url()?,
            "redis://:hunter2@cache.internal:6379/0"
        );
        assert_eq!(
            config.store.redacted_url(),
            "redis://:***@cache.internal:6379/0"
        );
        Ok(())
    }

    #[test]
    fn rejects_invalid_sections() {
        let mut config = Config::default();
        config.billing.charge_divisor = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.billing.default_account = "bad/account".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.store.pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unbounded_backoff() {
        let mut config = Config::default();
        config.retry.backoff_ms = MAX_BACKOFF_MS;
        assert!(config.validate().is_ok());

        config.retry.backoff_ms = u64::MAX;
        assert!(config.validate().is_err());
    }
}
