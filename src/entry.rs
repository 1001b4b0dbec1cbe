use std::ffi::OsString;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::{error, info};

use crate::args::{DEFAULT_CONFIG_FILES, OutputFormat, TesterArgs};
use crate::error::AppResult;
use crate::http::{HttpExecutor, build_client};
use crate::load::{LoadTestConfig, run_with_shutdown};
use crate::report::{LoadTestReport, config_lines, export_json, report_json, summary_lines};
use crate::shutdown::{setup_signal_shutdown_handler, shutdown_channel};

/// Parses the command line, runs the load test, and maps the report to an
/// exit code.
///
/// # Errors
///
/// Returns an error when arguments or config are invalid, the HTTP client
/// cannot be built, or the report cannot be written.
pub fn run() -> AppResult<ExitCode> {
    let (mut args, matches) = match parse_args()? {
        Some(parsed) => parsed,
        None => return Ok(ExitCode::SUCCESS),
    };

    crate::logger::init_logging(args.verbose, args.no_color);

    if let Some(config) = crate::config::load_config(args.config.as_deref())? {
        crate::config::apply_config(&mut args, &matches, &config)?;
    }
    let config = LoadTestConfig::try_from(&args).inspect_err(|err| error!("{}", err))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(&args, config))
}

fn parse_args() -> AppResult<Option<(TesterArgs, ArgMatches)>> {
    let mut cmd = TesterArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = TesterArgs::from_arg_matches(&matches)?;

    Ok(Some((args, matches)))
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !has_default_config()
}

fn has_default_config() -> bool {
    DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}

async fn run_async(args: &TesterArgs, config: LoadTestConfig) -> AppResult<ExitCode> {
    if args.output_format == OutputFormat::Text {
        for line in config_lines(&config) {
            println!("{}", line);
        }
    }

    let client = build_client(&config)?;
    let executor = Arc::new(HttpExecutor::new(client));
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    info!(
        "Sending {} POST requests to {} with concurrency {}",
        config.total_requests(),
        config.url(),
        config.effective_concurrency()
    );
    let report = run_with_shutdown(config, executor, &shutdown_tx).await;
    let emitted = emit_report(args, &report).await;
    signal_handle.abort();
    emitted?;

    if args.fail_on_mismatch && !report.all_matched() {
        error!(
            "{} of {} requests did not match the expected response ({} failed, {} wrong body)",
            report.mismatches.len(),
            report.total_requests,
            report.failed_count(),
            report
                .mismatches
                .len()
                .saturating_sub(report.failed_count())
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn emit_report(args: &TesterArgs, report: &LoadTestReport) -> AppResult<()> {
    match args.output_format {
        OutputFormat::Text => {
            for line in summary_lines(report) {
                println!("{}", line);
            }
        }
        OutputFormat::Json => {
            println!("{}", report_json(report)?);
        }
    }

    if let Some(path) = args.export_json.as_deref() {
        export_json(path, report).await?;
        info!("Wrote JSON report to {}", path);
    }
    Ok(())
}
