//! Single-request execution: client construction, the POST itself, and
//! classification of every way it can go wrong.
mod client;
mod executor;
mod outcome;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::build_client;
pub use executor::HttpExecutor;
pub use outcome::{FailureKind, RequestOutcome};
