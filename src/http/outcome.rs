use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Fault category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The per-request timeout elapsed before the full body arrived.
    Timeout,
    /// Connection could not be established (refused, DNS, TLS handshake).
    Connect,
    /// The server answered with a non-2xx status.
    Status(u16),
    /// The connection broke while the body was streaming.
    Body,
    /// Any other client-side transport error.
    Transport,
    /// The run stopped before this request produced a result.
    Cancelled,
}

impl FailureKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Connect => "connect",
            FailureKind::Status(_) => "status",
            FailureKind::Body => "body",
            FailureKind::Transport => "transport",
            FailureKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classified, timed result of one POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Success {
        body: String,
        elapsed: Duration,
    },
    Failure {
        kind: FailureKind,
        description: String,
        elapsed: Duration,
    },
}

impl RequestOutcome {
    /// Builds a failure whose description is prefixed with the fault category.
    #[must_use]
    pub fn failure(kind: FailureKind, detail: impl fmt::Display, elapsed: Duration) -> Self {
        RequestOutcome::Failure {
            kind,
            description: format!("{}: {}", kind.label(), detail),
            elapsed,
        }
    }

    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            RequestOutcome::Success { elapsed, .. } | RequestOutcome::Failure { elapsed, .. } => {
                *elapsed
            }
        }
    }

    #[must_use]
    pub const fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            RequestOutcome::Success { .. } => None,
            RequestOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Body on success, error description on failure.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            RequestOutcome::Success { body, .. } => body,
            RequestOutcome::Failure { description, .. } => description,
        }
    }

    /// True only for a success whose body is byte-for-byte `expected`.
    #[must_use]
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            RequestOutcome::Success { body, .. } => body.as_bytes() == expected.as_bytes(),
            RequestOutcome::Failure { .. } => false,
        }
    }
}
