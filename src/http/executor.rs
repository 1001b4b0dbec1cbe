use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response, Url};
use tokio::time::Instant;

use crate::load::{RequestExecutor, RequestTask};

use super::outcome::{FailureKind, RequestOutcome};

/// Issues one empty-bodied POST per task with the shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
}

impl HttpExecutor {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// POSTs to `url` and waits up to `timeout` for headers and the full body.
    /// Never retries; every fault is folded into [`RequestOutcome::Failure`].
    pub async fn post(&self, url: &Url, timeout: Duration) -> RequestOutcome {
        let start = Instant::now();

        let response = match self
            .client
            .post(url.clone())
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return RequestOutcome::failure(
                    classify_send_error(&err),
                    describe_error(&err),
                    start.elapsed(),
                );
            }
        };

        let status = response.status();
        if !status.is_success() {
            return RequestOutcome::failure(
                FailureKind::Status(status.as_u16()),
                format!("HTTP {}", status),
                start.elapsed(),
            );
        }

        match read_body(response).await {
            Ok(bytes) => RequestOutcome::Success {
                body: String::from_utf8_lossy(&bytes).into_owned(),
                elapsed: start.elapsed(),
            },
            Err(err) => {
                let kind = if err.is_timeout() {
                    FailureKind::Timeout
                } else {
                    FailureKind::Body
                };
                RequestOutcome::failure(kind, describe_error(&err), start.elapsed())
            }
        }
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, task: &RequestTask) -> RequestOutcome {
        self.post(task.url(), task.timeout()).await
    }
}

async fn read_body(response: Response) -> Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk?);
    }
    Ok(body)
}

fn classify_send_error(err: &reqwest::Error) -> FailureKind {
    // reqwest reports a connect that hit the deadline as both; timeout wins.
    if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_connect() {
        FailureKind::Connect
    } else if err.is_body() || err.is_decode() {
        FailureKind::Body
    } else {
        FailureKind::Transport
    }
}

/// Flattens the error and its source chain into one line.
fn describe_error(err: &reqwest::Error) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !description.contains(&cause_text) {
            description.push_str(": ");
            description.push_str(&cause_text);
        }
        source = cause.source();
    }
    description
}
