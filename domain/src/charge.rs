use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DomainError, DomainResult};

pub const DEFAULT_STARTING_BALANCE: i64 = 100;
pub const DEFAULT_CHARGE_DIVISOR: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ChargeAmount(i64);

impl ChargeAmount {
    pub fn new(value: i64) -> DomainResult<Self> {
        if value < 0 {
            return Err(DomainError::InvalidChargeAmount(format!(
                "charge must be non-negative, got {value}"
            )));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for ChargeAmount {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChargeAmount> for i64 {
    fn from(value: ChargeAmount) -> Self {
        value.0
    }
}

impl fmt::Display for ChargeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Prices a request as a fixed fraction of the starting balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargePolicy {
    pub default_balance: i64,
    pub charge_divisor: i64,
}

impl ChargePolicy {
    pub fn new(default_balance: i64, charge_divisor: i64) -> DomainResult<Self> {
        if default_balance < 0 {
            return Err(DomainError::ConfigError {
                message: "default_balance must be non-negative".to_string(),
            });
        }
        if charge_divisor <= 0 {
            return Err(DomainError::ConfigError {
                message: "charge_divisor must be greater than 0".to_string(),
            });
        }
        Ok(Self {
            default_balance,
            charge_divisor,
        })
    }

    #[must_use]
    pub fn charge_amount(&self) -> ChargeAmount {
        ChargeAmount(self.default_balance / self.charge_divisor)
    }
}

impl Default for ChargePolicy {
    fn default() -> Self {
        Self {
            default_balance: DEFAULT_STARTING_BALANCE,
            charge_divisor: DEFAULT_CHARGE_DIVISOR,
        }
    }
}

#[must_use]
pub fn authorize(balance: i64, amount: ChargeAmount) -> bool {
    balance >= amount.value()
}

/// Result of one charge attempt.
///
/// `remaining_balance` is the balance read before the attempt when the charge
/// was refused, and the balance read after the commit when it was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeOutcome {
    pub remaining_balance: i64,
    pub is_authorized: bool,
    pub charges: i64,
}

impl ChargeOutcome {
    #[must_use]
    pub fn unauthorized(current_balance: i64) -> Self {
        Self {
            remaining_balance: current_balance,
            is_authorized: false,
            charges: 0,
        }
    }

    #[must_use]
    pub fn authorized(post_charge_balance: i64, amount: ChargeAmount) -> Self {
        Self {
            remaining_balance: post_charge_balance,
            is_authorized: true,
            charges: amount.value(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeAttemptState {
    Init,
    Watching,
    Read,
    Authorized,
    Unauthorized,
    Discarded,
    CommitAttempted,
    Committed,
    Contended,
}

impl ChargeAttemptState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Discarded | Self::Committed | Self::Contended)
    }

    pub fn advance(self, next: Self) -> DomainResult<Self> {
        let allowed = matches!(
            (self, next),
            (Self::Init, Self::Watching)
                | (Self::Watching, Self::Read)
                | (Self::Read, Self::Authorized | Self::Unauthorized)
                | (Self::Unauthorized, Self::Discarded)
                | (Self::Authorized, Self::CommitAttempted)
                | (Self::CommitAttempted, Self::Committed | Self::Contended)
        );

        if allowed {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for ChargeAttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Watching => "watching",
            Self::Read => "read",
            Self::Authorized => "authorized",
            Self::Unauthorized => "unauthorized",
            Self::Discarded => "discarded",
            Self::CommitAttempted => "commit_attempted",
            Self::Committed => "committed",
            Self::Contended => "contended",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_is_balance_at_least_amount() -> DomainResult<()> {
        for balance in -3..=12 {
            for amount in 0..=10 {
                assert_eq!(
                    authorize(balance, ChargeAmount::new(amount)?),
                    balance >= amount
                );
            }
        }
        Ok(())
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(ChargeAmount::new(-1).is_err());
        assert!(ChargeAmount::new(0).is_ok());
    }

    #[test]
    fn default_policy_charges_a_twentieth() {
        assert_eq!(ChargePolicy::default().charge_amount().value(), 5);
    }

    #[test]
    fn policy_validates_inputs() {
        assert!(ChargePolicy::new(100, 0).is_err());
        assert!(ChargePolicy::new(-1, 20).is_err());
        assert!(ChargePolicy::new(40, 8).is_ok_and(|p| p.charge_amount().value() == 5));
    }

    #[test]
    fn outcome_serializes_in_camel_case() -> Result<(), serde_json::Error> {
        let outcome = ChargeOutcome::authorized(95, ChargeAmount(5));
        let json = serde_json::to_value(outcome)?;

        assert_eq!(
            json,
            serde_json::json!({"remainingBalance": 95, "isAuthorized": true, "charges": 5})
        );
        Ok(())
    }

    #[test]
    fn unauthorized_outcome_reports_no_charge() {
        let outcome = ChargeOutcome::unauthorized(3);
        assert!(!outcome.is_authorized);
        assert_eq!(outcome.charges, 0);
        assert_eq!(outcome.remaining_balance, 3);
    }

    #[test]
    fn attempt_follows_committed_path() -> DomainResult<()> {
        let state = ChargeAttemptState::Init
            .advance(ChargeAttemptState::Watching)?
            .advance(ChargeAttemptState::Read)?
            .advance(ChargeAttemptState::Authorized)?
            .advance(ChargeAttemptState::CommitAttempted)?
            .advance(ChargeAttemptState::Committed)?;

        assert!(state.is_terminal());
        Ok(())
    }

    #[test]
    fn attempt_rejects_skipping_the_watch() {
        assert!(
            ChargeAttemptState::Init
                .advance(ChargeAttemptState::Read)
                .is_err()
        );
        assert!(
            ChargeAttemptState::Unauthorized
                .advance(ChargeAttemptState::CommitAttempted)
                .is_err()
        );
        assert!(
            ChargeAttemptState::Committed
                .advance(ChargeAttemptState::Watching)
                .is_err()
        );
    }
}
