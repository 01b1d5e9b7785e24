use std::collections::HashMap;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use domain::balance::parse_stored_balance;
use tollgate_application::{
    error::{AppError, AppResult},
    ports::outgoing::key_value_store::{
        CommitResult, KeyValueConnectionPort, KeyValueConnectorPort, QueuedCommand,
    },
};

#[derive(Debug, Default)]
struct Slot {
    raw: String,
    version: u64,
}

type Slots = HashMap<String, Slot>;

/// Process-local counter store with Redis watch semantics.
///
/// Every write bumps the key's version; a commit applies only if each key the
/// connection watched still has the version it had when the watch was placed.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    slots: Arc<Mutex<Slots>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `raw` verbatim, bypassing integer encoding.
    pub fn put_raw(&self, key: &str, raw: &str) -> AppResult<()> {
        let mut slots = self.lock()?;
        let slot = slots.entry(key.to_string()).or_default();
        slot.raw = raw.to_string();
        slot.version += 1;
        Ok(())
    }

    pub fn raw_value(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.lock()?.get(key).map(|slot| slot.raw.clone()))
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Slots>> {
        self.slots.lock().map_err(|_| AppError::StoreError {
            message: "In-memory store lock poisoned".to_string(),
        })
    }
}

fn version_of(slots: &Slots, key: &str) -> u64 {
    slots.get(key).map_or(0, |slot| slot.version)
}

fn decrement(slot: &mut Slot, key: &str, amount: i64) -> AppResult<()> {
    let current = if slot.raw.is_empty() {
        0
    } else {
        slot.raw
            .parse::<i64>()
            .map_err(|_| AppError::StoreError {
                message: format!("Value at {} is not an integer", key),
            })?
    };

    let next = current
        .checked_sub(amount)
        .ok_or_else(|| AppError::StoreError {
            message: format!("Decrement of {} would overflow", key),
        })?;

    slot.raw = next.to_string();
    slot.version += 1;
    Ok(())
}

#[async_trait::async_trait]
impl KeyValueConnectorPort for InMemoryKeyValueStore {
    async fn connect(&self) -> AppResult<Box<dyn KeyValueConnectionPort>> {
        debug!("In-memory store ready");
        Ok(Box::new(InMemoryConnection {
            store: self.clone(),
            watched: Vec::new(),
        }))
    }
}

pub struct InMemoryConnection {
    store: InMemoryKeyValueStore,
    watched: Vec<(String, u64)>,
}

#[async_trait::async_trait]
impl KeyValueConnectionPort for InMemoryConnection {
    async fn get(&mut self, key: &str) -> AppResult<i64> {
        let slots = self.store.lock()?;
        Ok(parse_stored_balance(
            slots.get(key).map(|slot| slot.raw.as_str()),
        ))
    }

    async fn watch(&mut self, key: &str) -> AppResult<()> {
        let version = version_of(&*self.store.lock()?, key);
        self.watched.push((key.to_string(), version));
        Ok(())
    }

    async fn unwatch(&mut self) -> AppResult<()> {
        self.watched.clear();
        Ok(())
    }

    async fn exec(&mut self, key: &str, commands: &[QueuedCommand]) -> AppResult<CommitResult> {
        let watched = mem::take(&mut self.watched);
        let mut slots = self.store.lock()?;

        let contended = watched
            .iter()
            .any(|(watched_key, version)| version_of(&slots, watched_key) != *version);
        if contended {
            debug!("Transaction on {} aborted by a concurrent write", key);
            return Ok(CommitResult { applied: false });
        }

        if !commands.is_empty() {
            let slot = slots.entry(key.to_string()).or_default();
            for command in commands {
                match command {
                    QueuedCommand::DecrementBy(amount) => decrement(slot, key, *amount)?,
                }
            }
        }

        Ok(CommitResult { applied: true })
    }

    async fn set(&mut self, key: &str, value: i64) -> AppResult<()> {
        let mut slots = self.store.lock()?;
        let slot = slots.entry(key.to_string()).or_default();
        slot.raw = value.to_string();
        slot.version += 1;
        Ok(())
    }

    async fn disconnect(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
