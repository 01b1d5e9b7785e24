use tollgate_application::infrastructure_config::{
    BillingConfig, Config, RetryConfig, StoreBackend, StoreConfig,
};
use tracing::info;

pub fn print_startup_info(config: &Config) {
    info!("⚙️  Configuration ({}):", config.environment.env);
    print_store_configuration(&config.store);
    print_billing_configuration(&config.billing);
    print_retry_configuration(&config.retry);
}

fn print_store_configuration(store: &StoreConfig) {
    match store.backend {
        StoreBackend::Redis => info!(
            "  📦 Store: Redis at {} (pool {}, acquire timeout {}ms)",
            store.redacted_url(),
            store.pool_size,
            store.acquire_timeout_ms
        ),
        StoreBackend::Memory => info!("  📦 Store: in-memory (process local)"),
    }
}

fn print_billing_configuration(billing: &BillingConfig) {
    info!(
        "  💰 Billing: default balance {}, charge 1/{} per request, account '{}'",
        billing.default_balance, billing.charge_divisor, billing.default_account
    );
}

fn print_retry_configuration(retry: &RetryConfig) {
    if retry.max_attempts > 1 {
        info!(
            "  🔁 Contention retry: up to {} attempts, {}ms backoff, {}% jitter",
            retry.max_attempts, retry.backoff_ms, retry.jitter_max_percent
        );
    } else {
        info!("  🔁 Contention retry: DISABLED (contended charges fail)");
    }
}
