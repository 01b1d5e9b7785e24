use std::sync::Arc;

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuedCommand {
    DecrementBy(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitResult {
    pub applied: bool,
}

/// One exclusively owned connection to the counter store.
///
/// A watch set with [`watch`](Self::watch) stays in force until the next
/// [`exec`](Self::exec) or [`unwatch`](Self::unwatch). `exec` applies the
/// queued commands atomically and reports `applied = false` when a watched key
/// was written by another client in the meantime.
#[async_trait::async_trait]
pub trait KeyValueConnectionPort: Send {
    async fn get(&mut self, key: &str) -> AppResult<i64>;
    async fn watch(&mut self, key: &str) -> AppResult<()>;
    async fn unwatch(&mut self) -> AppResult<()>;
    async fn exec(&mut self, key: &str, commands: &[QueuedCommand]) -> AppResult<CommitResult>;
    async fn set(&mut self, key: &str, value: i64) -> AppResult<()>;
    async fn disconnect(self: Box<Self>) -> AppResult<()>;
}

#[async_trait::async_trait]
pub trait KeyValueConnectorPort: Send + Sync {
    async fn connect(&self) -> AppResult<Box<dyn KeyValueConnectionPort>>;
}

pub type DynKeyValueConnectorPort = Arc<dyn KeyValueConnectorPort>;
