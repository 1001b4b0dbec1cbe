//! Aggregate results of a run and their text/JSON renderings.
mod export;
mod histogram;
mod lines;


use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::http::{FailureKind, RequestOutcome};

pub(crate) use export::export_json;
pub use export::report_json;
pub use histogram::{LatencyHistogram, LatencySummary};
pub use lines::{config_lines, summary_lines};

/// One request that did not produce the expected body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub ordinal: u64,
    /// Response body, or error description when the request failed.
    pub actual: String,
    /// `None` when the request succeeded but the body differed.
    pub failure: Option<FailureKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadTestReport {
    pub total_requests: u64,
    #[serde(rename = "total_duration_ms", serialize_with = "serialize_millis")]
    pub total_duration: Duration,
    pub success_count: u64,
    /// Sorted by ordinal.
    pub mismatches: Vec<Mismatch>,
    pub latency: LatencySummary,
}

impl LoadTestReport {
    /// Classifies every outcome against `expected`. Cancelled outcomes carry
    /// no real timing and are left out of the latency summary.
    #[must_use]
    pub fn from_outcomes(
        expected: &str,
        outcomes: Vec<(u64, RequestOutcome)>,
        total_duration: Duration,
    ) -> Self {
        let total_requests = u64::try_from(outcomes.len()).unwrap_or(u64::MAX);
        let latency = LatencySummary::from_durations(
            outcomes
                .iter()
                .filter(|(_, outcome)| outcome.failure_kind() != Some(FailureKind::Cancelled))
                .map(|(_, outcome)| outcome.elapsed()),
        );

        let mut success_count: u64 = 0;
        let mut mismatches = Vec::new();
        for (ordinal, outcome) in outcomes {
            if outcome.matches(expected) {
                success_count = success_count.saturating_add(1);
                continue;
            }
            let failure = outcome.failure_kind();
            let actual = match outcome {
                RequestOutcome::Success { body, .. } => body,
                RequestOutcome::Failure { description, .. } => description,
            };
            mismatches.push(Mismatch {
                ordinal,
                actual,
                failure,
            });
        }
        mismatches.sort_by_key(|mismatch| mismatch.ordinal);

        Self {
            total_requests,
            total_duration,
            success_count,
            mismatches,
            latency,
        }
    }

    #[must_use]
    pub const fn all_matched(&self) -> bool {
        self.success_count == self.total_requests
    }

    /// Requests whose transport failed, as opposed to a body mismatch.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.mismatches
            .iter()
            .filter(|mismatch| mismatch.failure.is_some())
            .count()
    }

    /// Every request is either a success or a mismatch, never both or neither.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        u64::try_from(self.mismatches.len())
            .ok()
            .and_then(|mismatches| self.success_count.checked_add(mismatches))
            == Some(self.total_requests)
    }
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
