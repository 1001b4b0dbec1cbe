pub(crate) const DEFAULT_USER_AGENT: &str = concat!("postload/", env!("CARGO_PKG_VERSION"));

/// Config filenames checked in the working directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG_FILES: [&str; 2] = ["postload.toml", "postload.json"];

pub(super) const DEFAULT_REQUESTS: &str = "10";
pub(super) const DEFAULT_CONCURRENCY: &str = "10";
pub(super) const DEFAULT_TIMEOUT_SECS: &str = "10";
pub(super) const DEFAULT_EXPECTED_RESPONSE: &str = "Took 2 seconds";
