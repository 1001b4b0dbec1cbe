use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::http::RequestOutcome;

use super::config::LoadTestConfig;

/// One unit of work: the request ordinal plus the run's shared settings.
#[derive(Debug, Clone)]
pub struct RequestTask {
    ordinal: u64,
    config: Arc<LoadTestConfig>,
}

impl RequestTask {
    #[must_use]
    pub const fn new(ordinal: u64, config: Arc<LoadTestConfig>) -> Self {
        Self { ordinal, config }
    }

    /// 0-based position in submission order.
    #[must_use]
    pub const fn ordinal(&self) -> u64 {
        self.ordinal
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        self.config.url()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.config.timeout()
    }
}

/// Executes a single task. Implementations must not panic and must report
/// every fault through the returned outcome.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, task: &RequestTask) -> RequestOutcome;
}
