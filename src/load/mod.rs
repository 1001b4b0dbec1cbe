//! Bounded-concurrency orchestration of a fixed number of POST requests.
mod collector;
mod config;
mod orchestrator;
mod queue;
mod task;


pub use config::LoadTestConfig;
pub use orchestrator::{run, run_with_shutdown};
pub use task::{RequestExecutor, RequestTask};
