use clap::{Parser, Subcommand};
use thiserror::Error;

use domain::{account::AccountId, charge::ChargeAmount, error::DomainError};

#[derive(Error, Debug)]
pub enum AmountError {
    #[error("'{0}' is not a whole number")]
    NotANumber(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// One operation per process run. Without a subcommand the configured amount
/// is charged against the default account.
#[derive(Parser, Debug)]
#[command(name = "tollgate", version)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Charge an account, by default the configured amount.
    Charge {
        #[arg(value_parser = parse_account)]
        account: Option<AccountId>,
        #[arg(value_parser = parse_amount)]
        amount: Option<ChargeAmount>,
    },
    /// Restore an account's starting balance.
    Reset {
        #[arg(value_parser = parse_account)]
        account: Option<AccountId>,
    },
    /// Print an account's current balance.
    Balance {
        #[arg(value_parser = parse_account)]
        account: Option<AccountId>,
    },
}

impl Cli {
    #[must_use]
    pub fn into_command(self) -> Command {
        self.cmd.unwrap_or(Command::Charge {
            account: None,
            amount: None,
        })
    }
}

fn parse_account(raw: &str) -> Result<AccountId, DomainError> {
    raw.parse()
}

fn parse_amount(raw: &str) -> Result<ChargeAmount, AmountError> {
    let value: i64 = raw
        .parse()
        .map_err(|_| AmountError::NotANumber(raw.to_string()))?;
    Ok(ChargeAmount::new(value)?)
}
