use std::fmt;
use std::time::Duration;

use tokio::sync::broadcast;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Shutdown fan-out only ever carries the first stop request.
const SHUTDOWN_CHANNEL_CAPACITY: usize = 1;

/// Why a run stopped dispatching before every request was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Deadline(Duration),
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Deadline(deadline) => {
                write!(f, "run deadline of {:.2}s elapsed", deadline.as_secs_f64())
            }
            StopReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

pub type ShutdownSender = broadcast::Sender<StopReason>;
pub type ShutdownReceiver = broadcast::Receiver<StopReason>;

#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    broadcast::channel::<StopReason>(SHUTDOWN_CHANNEL_CAPACITY)
}

/// Resolves once a stop request arrives. A closed channel never resolves.
pub async fn stop_requested(shutdown_rx: &mut ShutdownReceiver) {
    loop {
        match shutdown_rx.recv().await {
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => return,
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

/// Returns the stop reason if one has already been broadcast.
pub fn take_stop_reason(shutdown_rx: &mut ShutdownReceiver) -> Option<StopReason> {
    loop {
        match shutdown_rx.try_recv() {
            Ok(reason) => return Some(reason),
            Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(
                broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
            ) => return None,
        }
    }
}

/// Broadcasts [`StopReason::Deadline`] once `deadline` has elapsed.
pub fn setup_deadline_shutdown(
    shutdown_tx: &ShutdownSender,
    deadline: Duration,
) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(deadline).await;
        drop(shutdown_tx.send(StopReason::Deadline(deadline)));
    })
}

/// Broadcasts [`StopReason::Interrupted`] on Ctrl+C (and SIGTERM on unix).
///
/// The handler stays installed after the first stop, whatever its source, so
/// a signal that arrives while the run drains exits the process with status
/// 130 instead of being swallowed.
pub fn setup_signal_shutdown_handler(shutdown_tx: &ShutdownSender) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        let mut shutdown_rx = shutdown_tx.subscribe();
        let mut stop_seen = false;

        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                tracing::warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        loop {
            #[cfg(unix)]
            let next_signal = async {
                tokio::select! {
                    () = ctrl_c_or_pending() => {}
                    () = terminate_or_pending(&mut term_signal) => {}
                }
            };
            #[cfg(not(unix))]
            let next_signal = ctrl_c_or_pending();

            tokio::select! {
                () = stop_requested(&mut shutdown_rx), if !stop_seen => {
                    stop_seen = true;
                }
                () = next_signal => match signal_action(stop_seen) {
                    SignalAction::RequestStop => {
                        stop_seen = true;
                        tracing::warn!("Interrupt received; stopping (interrupt again to exit now)");
                        drop(shutdown_tx.send(StopReason::Interrupted));
                    }
                    SignalAction::ForceExit => {
                        tracing::warn!("Second interrupt received; exiting without a report");
                        std::process::exit(FORCED_EXIT_CODE);
                    }
                },
            }
        }
    })
}

/// Exit status for a forced exit, following the shell's 128 + SIGINT.
const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalAction {
    RequestStop,
    ForceExit,
}

const fn signal_action(stop_seen: bool) -> SignalAction {
    if stop_seen {
        SignalAction::ForceExit
    } else {
        SignalAction::RequestStop
    }
}

async fn ctrl_c_or_pending() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate_or_pending(term_signal: &mut Option<Signal>) {
    if let Some(signal) = term_signal.as_mut()
        && signal.recv().await.is_some()
    {
        return;
    }
    std::future::pending::<()>().await;
}
