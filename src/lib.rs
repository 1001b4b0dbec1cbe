//! Core library for the `postload` CLI.
//!
//! `postload` fires a fixed number of HTTP POST requests at one URL through a
//! bounded pool of workers and checks every response body against an expected
//! string. The crate exposes the building blocks the binary is made of: CLI
//! argument types, configuration loading, the HTTP request executor, the load
//! orchestrator, and report rendering.
pub mod args;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
pub mod load;
pub mod logger;
pub mod report;
pub mod shutdown;
