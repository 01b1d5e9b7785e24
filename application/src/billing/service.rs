use tracing::{debug, info, instrument, warn};

use domain::{
    account::{AccountId, BalanceKey},
    charge::{ChargeAmount, ChargeAttemptState, ChargeOutcome, authorize},
};

use crate::{
    config::ChargeSettings,
    error::{AppError, AppResult},
    ports::{
        incoming::billing::ChargeUseCase,
        outgoing::{
            key_value_store::{DynKeyValueConnectorPort, KeyValueConnectionPort},
            retry_delay::DynRetryDelayPort,
        },
    },
};

use super::{retry::RetryPolicy, transaction::OptimisticTransaction};

pub struct ChargeServiceDeps {
    pub connector: DynKeyValueConnectorPort,
    pub retry_delay: DynRetryDelayPort,
}

pub struct ChargeService {
    connector: DynKeyValueConnectorPort,
    retry_delay: DynRetryDelayPort,
    settings: ChargeSettings,
}

struct AttemptTracker<'k> {
    key: &'k BalanceKey,
    state: ChargeAttemptState,
}

impl<'k> AttemptTracker<'k> {
    fn new(key: &'k BalanceKey) -> Self {
        Self {
            key,
            state: ChargeAttemptState::Init,
        }
    }

    fn advance(&mut self, next: ChargeAttemptState) -> AppResult<()> {
        self.state = self.state.advance(next)?;
        debug!(key = %self.key, state = %self.state, "Charge attempt advanced");
        Ok(())
    }
}

impl ChargeService {
    pub fn new(settings: ChargeSettings, deps: ChargeServiceDeps) -> Self {
        Self {
            connector: deps.connector,
            retry_delay: deps.retry_delay,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ChargeSettings {
        &self.settings
    }

    #[instrument(skip(self))]
    pub async fn charge(
        &self,
        account: &AccountId,
        amount: ChargeAmount,
    ) -> AppResult<ChargeOutcome> {
        self.charge_with_retry(account, amount, &RetryPolicy::single_attempt())
            .await
    }

    #[instrument(skip(self))]
    pub async fn charge_with_retry(
        &self,
        account: &AccountId,
        amount: ChargeAmount,
        retry: &RetryPolicy,
    ) -> AppResult<ChargeOutcome> {
        let key = account.balance_key();
        let mut conn = self.connector.connect().await?;

        let result = self
            .charge_on_connection(&mut *conn, &key, amount, retry)
            .await;
        release_connection(conn, &key).await;

        match &result {
            Ok(outcome) => info!(
                account = %account,
                authorized = outcome.is_authorized,
                charges = outcome.charges,
                remaining_balance = outcome.remaining_balance,
                "Charge request completed"
            ),
            Err(e) => warn!(account = %account, error = %e, "Charge request failed"),
        }

        result
    }

    #[instrument(skip(self))]
    pub async fn charge_default(&self, account: &AccountId) -> AppResult<ChargeOutcome> {
        let amount = self.settings.policy.charge_amount();
        self.charge_with_retry(account, amount, &self.settings.retry)
            .await
    }

    #[instrument(skip(self))]
    pub async fn reset(&self, account: &AccountId) -> AppResult<i64> {
        let key = account.balance_key();
        let default_balance = self.settings.policy.default_balance;
        let mut conn = self.connector.connect().await?;

        let written = conn.set(key.as_str(), default_balance).await;
        let released = conn.disconnect().await;
        written?;
        released?;

        info!(account = %account, balance = default_balance, "Balance reset");
        Ok(default_balance)
    }

    #[instrument(skip(self))]
    pub async fn balance(&self, account: &AccountId) -> AppResult<i64> {
        let key = account.balance_key();
        let mut conn = self.connector.connect().await?;

        let balance = conn.get(key.as_str()).await;
        release_connection(conn, &key).await;
        balance
    }

    async fn charge_on_connection(
        &self,
        conn: &mut dyn KeyValueConnectionPort,
        key: &BalanceKey,
        amount: ChargeAmount,
        retry: &RetryPolicy,
    ) -> AppResult<ChargeOutcome> {
        let mut attempt = 1;
        loop {
            match attempt_charge(&mut *conn, key, amount).await {
                Err(e) if e.is_contended() && attempt < retry.max_attempts() => {
                    let delay = retry.delay_after(attempt);
                    warn!(
                        key = %key,
                        attempt,
                        max_attempts = retry.max_attempts(),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Charge contended, retrying"
                    );
                    self.retry_delay.pause(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

async fn attempt_charge(
    conn: &mut dyn KeyValueConnectionPort,
    key: &BalanceKey,
    amount: ChargeAmount,
) -> AppResult<ChargeOutcome> {
    let mut tracker = AttemptTracker::new(key);

    let mut transaction = OptimisticTransaction::begin(&mut *conn, key.as_str()).await?;
    tracker.advance(ChargeAttemptState::Watching)?;

    let current_balance = transaction.read_balance().await?;
    tracker.advance(ChargeAttemptState::Read)?;

    if !authorize(current_balance, amount) {
        tracker.advance(ChargeAttemptState::Unauthorized)?;
        transaction.discard().await?;
        tracker.advance(ChargeAttemptState::Discarded)?;
        return Ok(ChargeOutcome::unauthorized(current_balance));
    }

    tracker.advance(ChargeAttemptState::Authorized)?;
    transaction.queue_decrement(amount);
    tracker.advance(ChargeAttemptState::CommitAttempted)?;

    if !transaction.commit().await?.applied {
        tracker.advance(ChargeAttemptState::Contended)?;
        return Err(AppError::TransactionContended {
            key: key.to_string(),
        });
    }
    tracker.advance(ChargeAttemptState::Committed)?;

    let post_charge_balance = conn.get(key.as_str()).await?;
    Ok(ChargeOutcome::authorized(post_charge_balance, amount))
}

async fn release_connection(conn: Box<dyn KeyValueConnectionPort>, key: &BalanceKey) {
    if let Err(e) = conn.disconnect().await {
        warn!(key = %key, error = %e, "Failed to release store connection");
    }
}

#[async_trait::async_trait]
impl ChargeUseCase for ChargeService {
    async fn charge(&self, account: &AccountId, amount: ChargeAmount) -> AppResult<ChargeOutcome> {
        Self::charge(self, account, amount).await
    }

    async fn charge_with_retry(
        &self,
        account: &AccountId,
        amount: ChargeAmount,
        retry: &RetryPolicy,
    ) -> AppResult<ChargeOutcome> {
        Self::charge_with_retry(self, account, amount, retry).await
    }

    async fn charge_default(&self, account: &AccountId) -> AppResult<ChargeOutcome> {
        Self::charge_default(self, account).await
    }

    async fn reset(&self, account: &AccountId) -> AppResult<i64> {
        Self::reset(self, account).await
    }

    async fn balance(&self, account: &AccountId) -> AppResult<i64> {
        Self::balance(self, account).await
    }
}
