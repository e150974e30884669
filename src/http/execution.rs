use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::warn;

use crate::metrics::{Outcome, ProgressSignal};

use super::transport::{Exchange, RequestTarget, Transport};

/// Performs one request and reports it.
///
/// Exactly one `Outcome` goes to `results_tx`, followed by one signal on
/// `progress_tx`, whatever happened to the request. Failures are logged and
/// folded into the outcome; they never propagate.
///
/// Returns `false` when the results channel is closed and the outcome could
/// not be delivered.
pub async fn execute_unit(
    transport: &dyn Transport,
    target: &RequestTarget,
    results_tx: &mpsc::Sender<Outcome>,
    progress_tx: &mpsc::UnboundedSender<ProgressSignal>,
) -> bool {
    let started = Instant::now();
    let outcome = match transport.exchange(target).await {
        Ok(Exchange {
            status,
            body: Ok(bytes),
        }) => Outcome::completed(status, started.elapsed(), bytes),
        Ok(Exchange {
            status,
            body: Err(err),
        }) => {
            warn!("{}", err);
            Outcome::body_unread(status, started.elapsed())
        }
        Err(err) => {
            if err.is_timeout() {
                warn!("Request timed out: {}", err);
            } else {
                warn!("{}", err);
            }
            Outcome::failed()
        }
    };

    let signal = ProgressSignal::from(&outcome);
    if results_tx.send(outcome).await.is_err() {
        return false;
    }
    drop(progress_tx.send(signal));
    true
}
