use domain::{account::AccountId, charge::ChargePolicy};

use crate::{billing::retry::RetryPolicy, error::AppResult, infrastructure_config::Config};

#[derive(Debug, Clone)]
pub struct ChargeSettings {
    pub policy: ChargePolicy,
    pub retry: RetryPolicy,
    pub default_account: AccountId,
}

impl ChargeSettings {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Ok(Self {
            policy: ChargePolicy::new(
                config.billing.default_balance,
                config.billing.charge_divisor,
            )?,
            retry: RetryPolicy::new(
                config.retry.max_attempts,
                config.retry.backoff_ms,
                config.retry.jitter_max_percent,
            )?,
            default_account: AccountId::new(config.billing.default_account.as_str())?,
        })
    }
}

impl Default for ChargeSettings {
    fn default() -> Self {
        Self {
            policy: ChargePolicy::default(),
            retry: RetryPolicy::single_attempt(),
            default_account: AccountId::default(),
        }
    }
}
