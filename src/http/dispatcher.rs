use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::metrics::{Outcome, ProgressSignal};
use crate::run::RunConfig;
use crate::shutdown::{ShutdownSender, shutdown_requested};

use super::budget::RequestBudget;
use super::execution::execute_unit;
use super::transport::{RequestTarget, Transport};

/// Upper bound on the up-front reservation for worker handles.
const PREALLOCATED_WORKER_HANDLES: usize = 1024;

/// Spawns the worker pool for a run and returns the number of requests it
/// dispatched.
///
/// `min(worker, amount)` workers pull tickets from a shared budget of `amount`
/// requests, so no more than `worker` requests are ever in flight. The task
/// owns the only long-lived channel senders: once every worker has returned,
/// the results and progress channels close.
///
/// After a shutdown broadcast, workers stop claiming tickets. Requests already
/// in flight still complete and report their outcome. A worker also stops as
/// soon as the results channel is closed, since nothing can record its
/// outcomes anymore.
#[must_use]
pub fn setup_dispatcher(
    config: &RunConfig,
    transport: Arc<dyn Transport>,
    shutdown_tx: &ShutdownSender,
    results_tx: mpsc::Sender<Outcome>,
    progress_tx: mpsc::UnboundedSender<ProgressSignal>,
) -> JoinHandle<usize> {
    let amount = config.amount.get();
    let workers = config.worker.get().min(amount);
    let target = Arc::new(RequestTarget::from_config(config));
    let budget = Arc::new(RequestBudget::new(amount));
    let shutdown_tx = shutdown_tx.clone();

    tokio::spawn(async move {
        let mut worker_handles = Vec::with_capacity(workers.min(PREALLOCATED_WORKER_HANDLES));

        for worker_id in 0..workers {
            let transport = Arc::clone(&transport);
            let target = Arc::clone(&target);
            let budget = Arc::clone(&budget);
            let results_tx = results_tx.clone();
            let progress_tx = progress_tx.clone();
            let mut shutdown_rx = shutdown_tx.subscribe();

            let handle = tokio::spawn(async move {
                let mut completed: usize = 0;
                loop {
                    if shutdown_requested(&mut shutdown_rx) {
                        debug!("Worker {} stopping on shutdown.", worker_id);
                        break;
                    }
                    if budget.try_claim().is_none() {
                        break;
                    }
                    if !execute_unit(transport.as_ref(), &target, &results_tx, &progress_tx).await {
                        error!(
                            "Worker {} stopping: results channel closed, outcome lost.",
                            worker_id
                        );
                        break;
                    }
                    completed = completed.saturating_add(1);
                }
                completed
            });

            worker_handles.push(handle);
        }

        drop(results_tx);
        drop(progress_tx);

        let mut dispatched: usize = 0;
        for handle in worker_handles {
            match handle.await {
                Ok(completed) => dispatched = dispatched.saturating_add(completed),
                Err(err) => error!("Worker task failed: {}", err),
            }
        }
        debug!(
            "Dispatcher finished: {} of {} tickets issued, {} requests completed.",
            budget.issued(),
            amount,
            dispatched
        );
        dispatched
    })
}
