use crate::{billing::retry::RetryPolicy, error::AppResult};
use domain::{
    account::AccountId,
    charge::{ChargeAmount, ChargeOutcome},
};

#[async_trait::async_trait]
pub trait ChargeUseCase: Send + Sync {
    async fn charge(&self, account: &AccountId, amount: ChargeAmount) -> AppResult<ChargeOutcome>;

    async fn charge_with_retry(
        &self,
        account: &AccountId,
        amount: ChargeAmount,
        retry: &RetryPolicy,
    ) -> AppResult<ChargeOutcome>;

    async fn charge_default(&self, account: &AccountId) -> AppResult<ChargeOutcome>;

    async fn reset(&self, account: &AccountId) -> AppResult<i64>;

    async fn balance(&self, account: &AccountId) -> AppResult<i64>;
}
