use std::time::Duration;

use reqwest::Url;

use crate::args::TesterArgs;
use crate::error::{AppError, AppResult, ValidationError};

/// Immutable settings for one run, shared read-only by every worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTestConfig {
    url: Url,
    total_requests: u64,
    concurrency: usize,
    timeout: Duration,
    expected_response: String,
    run_deadline: Option<Duration>,
    connect_timeout: Option<Duration>,
    system_proxy: bool,
}

impl LoadTestConfig {
    /// Validates and builds a run configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is not an absolute http(s) URL, or when
    /// `total_requests`, `concurrency`, or `timeout` is zero.
    pub fn new(
        url: &str,
        total_requests: u64,
        concurrency: usize,
        timeout: Duration,
        expected_response: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let url = parse_target_url(url)?;
        if total_requests == 0 {
            return Err(ValidationError::FieldTooSmall {
                field: "requests",
                min: 1,
            });
        }
        if concurrency == 0 {
            return Err(ValidationError::FieldTooSmall {
                field: "concurrency",
                min: 1,
            });
        }
        if timeout.is_zero() {
            return Err(ValidationError::FieldTooSmall {
                field: "timeout",
                min: 1,
            });
        }
        Ok(Self {
            url,
            total_requests,
            concurrency,
            timeout,
            expected_response: expected_response.into(),
            run_deadline: None,
            connect_timeout: None,
            system_proxy: true,
        })
    }

    /// Sets an overall deadline after which dispatch stops.
    ///
    /// # Errors
    ///
    /// Returns an error when `deadline` is zero.
    pub fn with_run_deadline(mut self, deadline: Duration) -> Result<Self, ValidationError> {
        if deadline.is_zero() {
            return Err(ValidationError::FieldTooSmall {
                field: "run_deadline",
                min: 1,
            });
        }
        self.run_deadline = Some(deadline);
        Ok(self)
    }

    /// Caps the connect phase separately from the whole-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when `connect_timeout` is zero.
    pub fn with_connect_timeout(
        mut self,
        connect_timeout: Duration,
    ) -> Result<Self, ValidationError> {
        if connect_timeout.is_zero() {
            return Err(ValidationError::FieldTooSmall {
                field: "connect_timeout",
                min: 1,
            });
        }
        self.connect_timeout = Some(connect_timeout);
        Ok(self)
    }

    /// Ignore `HTTP_PROXY`/`HTTPS_PROXY`/`ALL_PROXY` and connect directly.
    #[must_use]
    pub fn without_system_proxy(mut self) -> Self {
        self.system_proxy = false;
        self
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub const fn total_requests(&self) -> u64 {
        self.total_requests
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Worker count actually used: `concurrency` capped at `total_requests`.
    #[must_use]
    pub fn effective_concurrency(&self) -> usize {
        usize::try_from(self.total_requests)
            .map_or(self.concurrency, |total| self.concurrency.min(total))
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn expected_response(&self) -> &str {
        &self.expected_response
    }

    #[must_use]
    pub const fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    #[must_use]
    pub const fn system_proxy(&self) -> bool {
        self.system_proxy
    }
}

impl TryFrom<&TesterArgs> for LoadTestConfig {
    type Error = AppError;

    fn try_from(args: &TesterArgs) -> AppResult<Self> {
        let url = args
            .url
            .as_deref()
            .ok_or_else(|| AppError::validation(ValidationError::MissingUrl))?;
        let mut config = LoadTestConfig::new(
            url,
            args.requests.get(),
            args.concurrency.get(),
            Duration::from_secs(args.timeout_secs.get()),
            args.expected_response.clone(),
        )?;
        if let Some(deadline) = args.run_deadline {
            config = config.with_run_deadline(deadline)?;
        }
        if let Some(connect_timeout) = args.connect_timeout {
            config = config.with_connect_timeout(connect_timeout)?;
        }
        if args.no_proxy {
            config = config.without_system_proxy();
        }
        Ok(config)
    }
}

fn parse_target_url(value: &str) -> Result<Url, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingUrl);
    }
    let url = Url::parse(trimmed).map_err(|err| ValidationError::InvalidUrl {
        url: trimmed.to_owned(),
        source: err,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ValidationError::UnsupportedScheme {
            url: trimmed.to_owned(),
            scheme: scheme.to_owned(),
        }),
    }
}
