use std::sync::Arc;

use tollgate_adapters::outgoing::{
    in_memory::balance_store_memory::InMemoryKeyValueStore,
    redis_deadpool::balance_store_redis::RedisKeyValueConnector,
    tokio_time::TokioRetryDelayAdapter,
};
use tollgate_application::{
    billing::service::{ChargeService, ChargeServiceDeps},
    config::ChargeSettings,
    error::AppError,
    infrastructure_config::{Config, StoreBackend},
    ports::{
        incoming::billing::ChargeUseCase,
        outgoing::{key_value_store::DynKeyValueConnectorPort, retry_delay::DynRetryDelayPort},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub charge_service: Arc<ChargeService>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);

        let settings = ChargeSettings::from_config(&config)?;
        let connector = Self::create_connector(&config)?;
        let retry_delay: DynRetryDelayPort = Arc::new(TokioRetryDelayAdapter::new());

        let charge_service = Arc::new(ChargeService::new(
            settings,
            ChargeServiceDeps {
                connector,
                retry_delay,
            },
        ));

        Ok(Self {
            config,
            charge_service,
        })
    }

    fn create_connector(config: &Config) -> Result<DynKeyValueConnectorPort, AppError> {
        let connector: DynKeyValueConnectorPort = match config.store.backend {
            StoreBackend::Redis => Arc::new(RedisKeyValueConnector::from_url(
                &config.store.redis_url()?,
                config.store.pool_size,
                config.store.acquire_timeout_ms,
            )?),
            StoreBackend::Memory => Arc::new(InMemoryKeyValueStore::new()),
        };
        Ok(connector)
    }

    pub fn charge_use_case(&self) -> Arc<dyn ChargeUseCase> {
        Arc::clone(&self.charge_service) as Arc<dyn ChargeUseCase>
    }
}
