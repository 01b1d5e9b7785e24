use deadpool_redis::{
    Config as RedisPoolConfig, Connection as RedisConnection, Pool as RedisPool, PoolConfig,
    Runtime,
    redis::{AsyncCommands, RedisError, cmd, pipe},
};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use domain::balance::parse_stored_reply;
use tollgate_application::{
    error::{AppError, AppResult},
    ports::outgoing::key_value_store::{
        CommitResult, KeyValueConnectionPort, KeyValueConnectorPort, QueuedCommand,
    },
};

#[derive(Clone)]
pub struct RedisKeyValueConnector {
    redis_pool: RedisPool,
    acquire_timeout: Duration,
}

impl RedisKeyValueConnector {
    pub fn new(redis_pool: RedisPool, acquire_timeout_ms: u64) -> Self {
        Self {
            redis_pool,
            acquire_timeout: Duration::from_millis(acquire_timeout_ms),
        }
    }

    pub fn from_url(redis_url: &str, pool_size: usize, acquire_timeout_ms: u64) -> AppResult<Self> {
        let mut redis_config = RedisPoolConfig::from_url(redis_url);
        redis_config.pool = Some(PoolConfig::new(pool_size));

        let redis_pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| AppError::ConnectionError {
                message: format!("Failed to create Redis pool: {}", e),
            })?;

        Ok(Self::new(redis_pool, acquire_timeout_ms))
    }

    async fn get_redis_connection(&self) -> AppResult<RedisConnection> {
        match timeout(self.acquire_timeout, self.redis_pool.get()).await {
            Ok(conn) => conn.map_err(|e| AppError::ConnectionError {
                message: format!("Failed to get Redis connection: {}", e),
            }),
            Err(_) => Err(AppError::ConnectionError {
                message: "Redis connection timeout".to_string(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl KeyValueConnectorPort for RedisKeyValueConnector {
    async fn connect(&self) -> AppResult<Box<dyn KeyValueConnectionPort>> {
        let mut conn = self.get_redis_connection().await?;

        let _: String = cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::ConnectionError {
                message: format!("Redis did not answer readiness check: {}", e),
            })?;

        debug!("Redis client ready");
        Ok(Box::new(RedisKeyValueConnection { conn }))
    }
}

pub struct RedisKeyValueConnection {
    conn: RedisConnection,
}

impl RedisKeyValueConnection {
    // An empty pipeline is never sent, so the watch has to be checked with a
    // bare MULTI/EXEC.
    async fn exec_empty(&mut self, key: &str) -> AppResult<Option<Vec<i64>>> {
        cmd("MULTI")
            .query_async::<()>(&mut self.conn)
            .await
            .map_err(|e| store_error("open transaction on", key, &e))?;

        cmd("EXEC")
            .query_async(&mut self.conn)
            .await
            .map_err(|e| store_error("commit on", key, &e))
    }
}

fn store_error(operation: &str, key: &str, e: &RedisError) -> AppError {
    AppError::StoreError {
        message: format!("Failed to {} {}: {}", operation, key, e),
    }
}

#[async_trait::async_trait]
impl KeyValueConnectionPort for RedisKeyValueConnection {
    async fn get(&mut self, key: &str) -> AppResult<i64> {
        let raw: Option<Vec<u8>> = self
            .conn
            .get(key)
            .await
            .map_err(|e| store_error("read", key, &e))?;

        let balance = parse_stored_reply(raw.as_deref());
        debug!("Read {} = {}", key, balance);
        Ok(balance)
    }

    async fn watch(&mut self, key: &str) -> AppResult<()> {
        cmd("WATCH")
            .arg(key)
            .query_async::<()>(&mut self.conn)
            .await
            .map_err(|e| store_error("watch", key, &e))
    }

    async fn unwatch(&mut self) -> AppResult<()> {
        cmd("UNWATCH")
            .query_async::<()>(&mut self.conn)
            .await
            .map_err(|e| AppError::StoreError {
                message: format!("Failed to clear watch: {}", e),
            })
    }

    async fn exec(&mut self, key: &str, commands: &[QueuedCommand]) -> AppResult<CommitResult> {
        // EXEC replies nil when a watched key changed; that reads back as None.
        let replies: Option<Vec<i64>> = if commands.is_empty() {
            self.exec_empty(key).await?
        } else {
            let mut redis_pipeline = pipe();
            redis_pipeline.atomic();

            for command in commands {
                match command {
                    QueuedCommand::DecrementBy(amount) => {
                        redis_pipeline.decr(key, *amount);
                    }
                }
            }

            redis_pipeline
                .query_async(&mut self.conn)
                .await
                .map_err(|e| store_error("commit on", key, &e))?
        };

        match replies {
            Some(values) => {
                debug!("Transaction on {} applied: {:?}", key, values);
                Ok(CommitResult { applied: true })
            }
            None => {
                debug!("Transaction on {} aborted by a concurrent write", key);
                Ok(CommitResult { applied: false })
            }
        }
    }

    async fn set(&mut self, key: &str, value: i64) -> AppResult<()> {
        let _: () = self
            .conn
            .set(key, value)
            .await
            .map_err(|e| store_error("write", key, &e))?;

        debug!("Set {} = {}", key, value);
        Ok(())
    }

    async fn disconnect(self: Box<Self>) -> AppResult<()> {
        let mut conn = self.conn;

        match cmd("UNWATCH").query_async::<()>(&mut conn).await {
            Ok(()) => {
                drop(conn);
                debug!("Redis connection returned to pool");
                Ok(())
            }
            Err(e) => {
                drop(RedisConnection::take(conn));
                warn!("Detached Redis connection after failed UNWATCH: {}", e);
                Err(AppError::StoreError {
                    message: format!("Failed to release Redis connection: {}", e),
                })
            }
        }
    }
}
