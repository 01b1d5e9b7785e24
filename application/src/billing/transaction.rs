use tracing::debug;

use domain::charge::ChargeAmount;

use crate::{
    error::AppResult,
    ports::outgoing::key_value_store::{CommitResult, KeyValueConnectionPort, QueuedCommand},
};

/// A watch on one key plus the writes queued against it.
///
/// The watch is placed by [`begin`](Self::begin), so every read made through
/// the handle happens under it. Consuming the handle with
/// [`commit`](Self::commit) or [`discard`](Self::discard) always clears the
/// watch on the connection.
pub struct OptimisticTransaction<'c> {
    conn: &'c mut dyn KeyValueConnectionPort,
    key: String,
    queued: Vec<QueuedCommand>,
}

impl<'c> OptimisticTransaction<'c> {
    pub async fn begin(conn: &'c mut dyn KeyValueConnectionPort, key: &str) -> AppResult<Self> {
        conn.watch(key).await?;
        debug!("Watching {}", key);

        Ok(Self {
            conn,
            key: key.to_string(),
            queued: Vec::new(),
        })
    }

    pub async fn read_balance(&mut self) -> AppResult<i64> {
        self.conn.get(&self.key).await
    }

    pub fn queue_decrement(&mut self, amount: ChargeAmount) {
        self.queued.push(QueuedCommand::DecrementBy(amount.value()));
    }

    pub async fn commit(self) -> AppResult<CommitResult> {
        let result = self.conn.exec(&self.key, &self.queued).await?;
        debug!(
            "Committed {} queued command(s) on {}: applied={}",
            self.queued.len(),
            self.key,
            result.applied
        );
        Ok(result)
    }

    pub async fn discard(self) -> AppResult<()> {
        self.conn.unwatch().await?;
        debug!("Discarded transaction on {}", self.key);
        Ok(())
    }
}
