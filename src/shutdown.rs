use async_trait::async_trait;
use tokio::sync::broadcast;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

pub type ShutdownSender = broadcast::Sender<()>;
pub type ShutdownReceiver = broadcast::Receiver<()>;

/// Broadcast channel size for shutdown notifications (single signal fan-out).
const SHUTDOWN_CHANNEL_CAPACITY: usize = 1;
/// Exit status after a second interrupt (128 + SIGINT).
const FORCED_EXIT_CODE: i32 = 130;

#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    broadcast::channel::<()>(SHUTDOWN_CHANNEL_CAPACITY)
}

/// Returns true once a shutdown has been broadcast on `shutdown_rx`.
///
/// A closed channel means no shutdown can arrive anymore, so it reads as false.
pub(crate) fn shutdown_requested(shutdown_rx: &mut ShutdownReceiver) -> bool {
    match shutdown_rx.try_recv() {
        Ok(()) | Err(broadcast::error::TryRecvError::Lagged(_)) => true,
        Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => {
            false
        }
    }
}

/// How signal forwarding ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignalOutcome {
    /// Shutdown was broadcast by someone else before any signal arrived.
    Released,
    /// A second signal arrived while in-flight requests were draining.
    Forced,
}

/// Source of process termination requests.
#[async_trait]
pub(crate) trait SignalSource: Send {
    /// Waits for the next request and returns a label for logging.
    async fn next_signal(&mut self) -> &'static str;
}

struct OsSignals {
    #[cfg(unix)]
    terminate: Option<Signal>,
}

impl OsSignals {
    fn new() -> Self {
        Self {
            #[cfg(unix)]
            terminate: match signal(SignalKind::terminate()) {
                Ok(signal) => Some(signal),
                Err(err) => {
                    tracing::warn!("Failed to register SIGTERM handler: {}", err);
                    None
                }
            },
        }
    }
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
}

#[async_trait]
impl SignalSource for OsSignals {
    #[cfg(unix)]
    async fn next_signal(&mut self) -> &'static str {
        let terminate = self.terminate.as_mut();
        tokio::select! {
            () = ctrl_c() => "Interrupted",
            () = async {
                match terminate {
                    Some(signal) => {
                        if signal.recv().await.is_none() {
                            std::future::pending::<()>().await;
                        }
                    }
                    None => std::future::pending::<()>().await,
                }
            } => "Terminated",
        }
    }

    #[cfg(not(unix))]
    async fn next_signal(&mut self) -> &'static str {
        ctrl_c().await;
        "Interrupted"
    }
}

/// Broadcasts shutdown on the first signal and reports a second one.
///
/// Returns `Released` if `shutdown_rx` fires before any signal.
pub(crate) async fn forward_signals<S>(
    signals: &mut S,
    shutdown_tx: &ShutdownSender,
    shutdown_rx: &mut ShutdownReceiver,
) -> SignalOutcome
where
    S: SignalSource + ?Sized,
{
    tokio::select! {
        _ = shutdown_rx.recv() => return SignalOutcome::Released,
        label = signals.next_signal() => {
            tracing::warn!(
                "{}, finishing in-flight requests. Repeat to abort immediately.",
                label
            );
            drop(shutdown_tx.send(()));
        }
    }

    let label = signals.next_signal().await;
    tracing::warn!("{} again, aborting without waiting for in-flight requests.", label);
    SignalOutcome::Forced
}

/// Forwards Ctrl+C (and SIGTERM on unix) to the shutdown channel.
///
/// A second signal exits the process right away. Abort the returned handle
/// once the run is over.
pub fn setup_signal_shutdown_handler(shutdown_tx: &ShutdownSender) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        let mut signals = OsSignals::new();
        if forward_signals(&mut signals, &shutdown_tx, &mut shutdown_rx).await
            == SignalOutcome::Forced
        {
            std::process::exit(FORCED_EXIT_CODE);
        }
    })
}
