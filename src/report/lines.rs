use crate::load::LoadTestConfig;

use super::LoadTestReport;

const RULE: &str = "------------------------------------------------------------";
/// Microseconds per millisecond.
const US_PER_MS: u64 = 1_000;

#[must_use]
pub fn config_lines(config: &LoadTestConfig) -> Vec<String> {
    let mut lines = vec![RULE.to_owned(), "Load Test Configuration:".to_owned()];
    lines.push(format!("- Target URL: {}", config.url()));
    lines.push(format!("- Total requests: {}", config.total_requests()));
    lines.push(format!("- Concurrency: {}", config.concurrency()));
    lines.push(format!(
        "- Timeout per request: {:.2}s",
        config.timeout().as_secs_f64()
    ));
    if let Some(connect_timeout) = config.connect_timeout() {
        lines.push(format!(
            "- Connect timeout: {:.2}s",
            connect_timeout.as_secs_f64()
        ));
    }
    if let Some(deadline) = config.run_deadline() {
        lines.push(format!("- Run deadline: {:.2}s", deadline.as_secs_f64()));
    }
    lines.push(format!("- Expected response: {}", config.expected_response()));
    lines.push(RULE.to_owned());
    lines
}

#[must_use]
pub fn summary_lines(report: &LoadTestReport) -> Vec<String> {
    let mut lines = vec![RULE.to_owned()];
    lines.push(format!(
        "Finished in {:.2} seconds",
        report.total_duration.as_secs_f64()
    ));
    lines.push(format!(
        "{}/{} responses matched expected response",
        report.success_count, report.total_requests
    ));

    let latency = &report.latency;
    if latency.count > 0 {
        lines.push(format!(
            "Latency: min {} / mean {} / p50 {} / p90 {} / p99 {} / max {}",
            format_micros(latency.min_us),
            format_micros(latency.mean_us),
            format_micros(latency.p50_us),
            format_micros(latency.p90_us),
            format_micros(latency.p99_us),
            format_micros(latency.max_us)
        ));
    }

    if !report.mismatches.is_empty() {
        lines.push(format!(
            "Some responses did not match expected output ({} failed, {} wrong body):",
            report.failed_count(),
            report
                .mismatches
                .len()
                .saturating_sub(report.failed_count())
        ));
        for mismatch in &report.mismatches {
            lines.push(format!("  #{}: {}", mismatch.ordinal, mismatch.actual));
        }
    }
    lines
}

fn format_micros(value_us: u64) -> String {
    let whole = value_us.checked_div(US_PER_MS).unwrap_or(0);
    let fraction = value_us.checked_rem(US_PER_MS).unwrap_or(0);
    format!("{}.{:03}ms", whole, fraction)
}
