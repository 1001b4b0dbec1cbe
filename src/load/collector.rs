use std::collections::BTreeMap;
use std::time::Duration;

use tracing::warn;

use crate::http::{FailureKind, RequestOutcome};

/// Accumulates worker outcomes keyed by ordinal, in whatever order they land.
#[derive(Debug)]
pub(super) struct OutcomeCollector {
    total: u64,
    outcomes: BTreeMap<u64, RequestOutcome>,
}

impl OutcomeCollector {
    pub(super) const fn new(total: u64) -> Self {
        Self {
            total,
            outcomes: BTreeMap::new(),
        }
    }

    pub(super) fn record(&mut self, ordinal: u64, outcome: RequestOutcome) {
        if ordinal >= self.total {
            warn!("Ignoring outcome for out-of-range request #{}", ordinal);
            return;
        }
        if self.outcomes.contains_key(&ordinal) {
            warn!("Ignoring duplicate outcome for request #{}", ordinal);
            return;
        }
        self.outcomes.insert(ordinal, outcome);
    }

    pub(super) fn received(&self) -> usize {
        self.outcomes.len()
    }

    /// Yields exactly one outcome per ordinal in `0..total`; ordinals that
    /// never reported are filled with a cancelled failure built from `reason`.
    pub(super) fn finish(mut self, reason: &str) -> Vec<(u64, RequestOutcome)> {
        (0..self.total)
            .map(|ordinal| {
                let outcome = self.outcomes.remove(&ordinal).unwrap_or_else(|| {
                    RequestOutcome::failure(FailureKind::Cancelled, reason, Duration::ZERO)
                });
                (ordinal, outcome)
            })
            .collect()
    }
}
