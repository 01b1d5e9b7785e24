use std::error::Error;
use std::sync::Arc;

use futures::future::join_all;

use domain::{
    account::AccountId,
    charge::{ChargeAmount, ChargeOutcome},
};
use tollgate_adapters::outgoing::{
    in_memory::balance_store_memory::InMemoryKeyValueStore, tokio_time::TokioRetryDelayAdapter,
};
use tollgate_application::{
    billing::{
        retry::RetryPolicy,
        service::{ChargeService, ChargeServiceDeps},
    },
    config::ChargeSettings,
    error::AppError,
};

type TestResult = Result<(), Box<dyn Error>>;

const KEY: &str = "account1/balance";

fn charge_service(store: &InMemoryKeyValueStore) -> Arc<ChargeService> {
    Arc::new(ChargeService::new(
        ChargeSettings::default(),
        ChargeServiceDeps {
            connector: Arc::new(store.clone()),
            retry_delay: Arc::new(TokioRetryDelayAdapter::new()),
        },
    ))
}

#[tokio::test]
async fn charge_from_full_balance() -> TestResult {
    let store = InMemoryKeyValueStore::new();
    let service = charge_service(&store);
    let account = AccountId::default();

    service.reset(&account).await?;
    let outcome = service.charge(&account, ChargeAmount::new(5)?).await?;

    assert_eq!(
        outcome,
        ChargeOutcome {
            remaining_balance: 95,
            is_authorized: true,
            charges: 5
        }
    );
    assert_eq!(store.raw_value(KEY)?.as_deref(), Some("95"));
    Ok(())
}

#[tokio::test]
async fn charge_exceeding_balance_is_refused_without_writing() -> TestResult {
    let store = InMemoryKeyValueStore::new();
    store.put_raw(KEY, "3")?;
    let service = charge_service(&store);

    let outcome = service
        .charge(&AccountId::default(), ChargeAmount::new(5)?)
        .await?;

    assert_eq!(
        outcome,
        ChargeOutcome {
            remaining_balance: 3,
            is_authorized: false,
            charges: 0
        }
    );
    assert_eq!(store.raw_value(KEY)?.as_deref(), Some("3"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_charges_never_overspend() -> TestResult {
    let store = InMemoryKeyValueStore::new();
    let service = charge_service(&store);
    let account = AccountId::default();
    service.reset(&account).await?;

    let amount = ChargeAmount::new(5)?;
    let tasks = (0..40).map(|_| {
        let service = Arc::clone(&service);
        let account = account.clone();
        tokio::spawn(async move { service.charge(&account, amount).await })
    });

    let mut committed = 0;
    let mut contended = 0;
    let mut refused = 0;
    for joined in join_all(tasks).await {
        match joined? {
            Ok(outcome) if outcome.is_authorized => committed += 1,
            Ok(_) => refused += 1,
            Err(e) if e.is_contended() => contended += 1,
            Err(e) => return Err(e.into()),
        }
    }

    let remaining = service.balance(&account).await?;
    assert_eq!(committed + contended + refused, 40);
    assert!(committed <= 20);
    assert!(remaining >= 0);
    assert_eq!(remaining, 100 - 5 * committed);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn retried_charges_drain_balance_exactly() -> TestResult {
    let store = InMemoryKeyValueStore::new();
    let service = charge_service(&store);
    let account = AccountId::default();
    service.reset(&account).await?;

    // Each lost race means another charge committed, and at most 20 can.
    let retry = RetryPolicy::new(25, 0, 0)?;
    let amount = ChargeAmount::new(5)?;
    let tasks = (0..40).map(|_| {
        let service = Arc::clone(&service);
        let account = account.clone();
        let retry = retry.clone();
        tokio::spawn(async move { service.charge_with_retry(&account, amount, &retry).await })
    });

    let mut authorized = 0;
    let mut refused = 0;
    for joined in join_all(tasks).await {
        if joined??.is_authorized {
            authorized += 1;
        } else {
            refused += 1;
        }
    }

    assert_eq!(authorized, 20);
    assert_eq!(refused, 20);
    assert_eq!(service.balance(&account).await?, 0);
    Ok(())
}

#[tokio::test]
async fn reset_restores_default_regardless_of_prior_state() -> TestResult {
    let store = InMemoryKeyValueStore::new();
    let service = charge_service(&store);
    let account = AccountId::default();

    for prior in ["0", "-12", "garbage", "100", "4000"] {
        store.put_raw(KEY, prior)?;
        assert_eq!(service.reset(&account).await?, 100);
        assert_eq!(service.balance(&account).await?, 100);
    }
    Ok(())
}

#[tokio::test]
async fn malformed_balance_reads_as_empty() -> TestResult {
    let store = InMemoryKeyValueStore::new();
    store.put_raw(KEY, "not-a-number")?;
    let service = charge_service(&store);

    let outcome = service
        .charge(&AccountId::default(), ChargeAmount::new(5)?)
        .await?;

    assert_eq!(outcome, ChargeOutcome::unauthorized(0));
    assert_eq!(store.raw_value(KEY)?.as_deref(), Some("not-a-number"));
    Ok(())
}

#[tokio::test]
async fn decrementing_a_malformed_balance_surfaces_a_store_error() -> TestResult {
    let store = InMemoryKeyValueStore::new();
    store.put_raw(KEY, "not-a-number")?;
    let service = charge_service(&store);

    let result = service
        .charge(&AccountId::default(), ChargeAmount::new(0)?)
        .await;

    assert!(matches!(result, Err(AppError::StoreError { .. })));
    Ok(())
}
