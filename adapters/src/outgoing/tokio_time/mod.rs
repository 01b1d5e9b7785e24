use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::sleep;
use tollgate_application::ports::outgoing::retry_delay::RetryDelayPort;

pub struct TokioRetryDelayAdapter;

impl TokioRetryDelayAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TokioRetryDelayAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryDelayPort for TokioRetryDelayAdapter {
    fn pause(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> {
        Box::pin(sleep(duration))
    }
}
