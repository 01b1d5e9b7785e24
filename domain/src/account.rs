use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::{DomainError, DomainResult};

pub const DEFAULT_ACCOUNT: &str = "account1";

const MAX_ACCOUNT_ID_LEN: usize = 128;
const BALANCE_SUFFIX: &str = "balance";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::InvalidAccountId(
                "account id cannot be empty".to_string(),
            ));
        }

        if value.len() > MAX_ACCOUNT_ID_LEN {
            return Err(DomainError::InvalidAccountId(format!(
                "account id exceeds {MAX_ACCOUNT_ID_LEN} bytes"
            )));
        }

        if value.chars().any(|c| c == '/' || c.is_whitespace()) {
            return Err(DomainError::InvalidAccountId(format!(
                "'{value}' must not contain '/' or whitespace"
            )));
        }

        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn balance_key(&self) -> BalanceKey {
        BalanceKey(format!("{}/{}", self.0, BALANCE_SUFFIX))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self(DEFAULT_ACCOUNT.to_string())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

/// Store key holding one account's balance, laid out as `<account>/balance`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BalanceKey(String);

impl BalanceKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BalanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BalanceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_account_maps_to_legacy_key() {
        assert_eq!(
            AccountId::default().balance_key().as_str(),
            "account1/balance"
        );
    }

    #[test]
    fn accounts_map_to_independent_keys() -> DomainResult<()> {
        let alice = AccountId::new("alice")?;
        let bob: AccountId = "bob".parse()?;

        assert_eq!(alice.balance_key().as_str(), "alice/balance");
        assert_ne!(alice.balance_key(), bob.balance_key());
        Ok(())
    }

    #[test]
    fn rejects_ids_that_would_break_the_key_layout() {
        assert!(AccountId::new("").is_err());
        assert!(AccountId::new("a/b").is_err());
        assert!(AccountId::new("with space").is_err());
        assert!(AccountId::new("x".repeat(MAX_ACCOUNT_ID_LEN + 1)).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let parsed: Result<AccountId, _> = serde_json::from_str("\"a/b\"");
        assert!(parsed.is_err());

        let parsed: Result<AccountId, _> = serde_json::from_str("\"account7\"");
        assert!(parsed.is_ok_and(|id| id.as_str() == "account7"));
    }
}
