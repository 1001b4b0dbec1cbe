use clap::Parser;
use std::time::Duration;

use super::defaults::{
    DEFAULT_CONCURRENCY, DEFAULT_EXPECTED_RESPONSE, DEFAULT_REQUESTS, DEFAULT_TIMEOUT_SECS,
};
use super::parsers::{
    parse_bool_env, parse_duration_arg, parse_positive_u64, parse_positive_usize,
};
use super::types::{OutputFormat, PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrent HTTP POST load tester: fires a fixed number of requests through a bounded worker pool and checks every response body against an expected string."
)]
pub struct TesterArgs {
    /// Target URL to POST to
    #[arg(long, short)]
    pub url: Option<String>,

    /// Total number of requests to send
    #[arg(long, short = 'n', default_value = DEFAULT_REQUESTS, value_parser = parse_positive_u64)]
    pub requests: PositiveU64,

    /// Maximum number of requests in flight at once
    #[arg(long, short = 'c', default_value = DEFAULT_CONCURRENCY, value_parser = parse_positive_usize)]
    pub concurrency: PositiveUsize,

    /// Timeout (in seconds) for each request, covering connect through full body
    #[arg(long = "timeout", short = 't', default_value = DEFAULT_TIMEOUT_SECS, value_parser = parse_positive_u64)]
    pub timeout_secs: PositiveU64,

    /// Expected exact response body for a request to count as a success
    #[arg(long = "expected-response", short = 'e', default_value = DEFAULT_EXPECTED_RESPONSE)]
    pub expected_response: String,

    /// Stop dispatching after this long and report unfinished requests as cancelled (supports ms/s/m/h)
    #[arg(long = "run-deadline", value_parser = parse_duration_arg)]
    pub run_deadline: Option<Duration>,

    /// Connect timeout per request (supports ms/s/m/h); bounded by --timeout when unset
    #[arg(long = "connect-timeout", value_parser = parse_duration_arg)]
    pub connect_timeout: Option<Duration>,

    /// Ignore HTTP_PROXY/HTTPS_PROXY/ALL_PROXY and connect to the target directly
    #[arg(long = "no-proxy")]
    pub no_proxy: bool,

    /// Path to config file (TOML/JSON). Defaults to ./postload.toml or ./postload.json if present.
    #[arg(long)]
    pub config: Option<String>,

    /// Report format printed to stdout
    #[arg(long = "output-format", value_enum, default_value = "text", ignore_case = true)]
    pub output_format: OutputFormat,

    /// Write the JSON report to this path
    #[arg(long = "export-json")]
    pub export_json: Option<String>,

    /// Exit with status 1 unless every response matched
    #[arg(
        long = "fail-on-mismatch",
        env = "POSTLOAD_FAIL_ON_MISMATCH",
        value_parser = parse_bool_env
    )]
    pub fail_on_mismatch: bool,

    /// Enable verbose logging (sets log level to debug unless overridden by POSTLOAD_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable color output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,
}
