use std::error::Error;

use clap::Parser;
use tracing::{error, info};

use server::bootstrap::state::AppState;
use server::command::{Cli, Command};
use server::config_loader;
use server::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let command = Cli::parse().into_command();
    dotenvy::dotenv().ok();

    let config = config_loader::load_config()?;

    observability::tracing::setup_logging(&config)?;

    info!("Starting Tollgate");
    observability::startup_info::print_startup_info(&config);

    let state = AppState::new(config)?;

    if let Err(e) = run(&state, command).await {
        error!("Operation failed: {}", e);
        return Err(e);
    }

    Ok(())
}

async fn run(state: &AppState, command: Command) -> Result<(), Box<dyn Error>> {
    let service = &state.charge_service;
    let default_account = &service.settings().default_account;

    match command {
        Command::Charge { account, amount } => {
            let account = account.as_ref().unwrap_or(default_account);
            let outcome = match amount {
                Some(amount) => {
                    service
                        .charge_with_retry(account, amount, &service.settings().retry)
                        .await?
                }
                None => service.charge_default(account).await?,
            };
            info!(
                account = %account,
                outcome = %serde_json::to_string(&outcome)?,
                "Charge outcome"
            );
        }
        Command::Reset { account } => {
            let account = account.as_ref().unwrap_or(default_account);
            let balance = service.reset(account).await?;
            info!(account = %account, balance, "Reset outcome");
        }
        Command::Balance { account } => {
            let account = account.as_ref().unwrap_or(default_account);
            let balance = service.balance(account).await?;
            info!(account = %account, balance, "Balance");
        }
    }

    Ok(())
}
