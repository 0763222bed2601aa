//! Process-wide reporter lifecycle.
//!
//! At most one reporter is live per process. All mutations of the singleton
//! slot go through one lock, so concurrent `enable`/`disable` calls are
//! idempotent rather than racy. A fork hook tears the inherited instance down
//! and rebuilds it in the child, because the parent's flush worker thread does
//! not survive the fork; envelopes queued but undelivered at fork time are
//! lost by design.

use crate::worker::PeriodicWorker;
use crate::{ReporterConfig, TelemetryResult, TelemetryWriter};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use telemetry_events::{Application, Integration, TelemetryRequest};
use tracing::{debug, info, warn};

struct ReporterHandle {
    writer: Arc<TelemetryWriter>,
    /// Taken on stop/abandon.
    worker: Option<PeriodicWorker>,
    fork_hook: forksafe::HookId,
}

/// The singleton slot. Guarded by its lock for every mutation; readers clone
/// the writer handle out and release the lock before doing any work.
static ACTIVE: Mutex<Option<ReporterHandle>> = Mutex::new(None);

/// Whether a reporter is currently live.
static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable telemetry reporting for this process.
///
/// No-op when a reporter is already live. Otherwise builds the writer,
/// queues the `app-started` notice, starts the periodic flush worker and
/// registers the fork hook.
pub fn enable(config: ReporterConfig, application: Application) -> TelemetryResult<()> {
    let mut slot = ACTIVE.lock();
    if slot.is_some() {
        debug!("Telemetry reporter already enabled");
        return Ok(());
    }

    let endpoint = config.endpoint.clone();
    let writer = Arc::new(TelemetryWriter::new(config.clone(), application.clone())?);
    writer.enqueue(TelemetryRequest::app_started(writer.identity()));

    let worker = PeriodicWorker::start(writer.clone(), config.flush_interval)?;

    let fork_hook = forksafe::register(move || {
        restart_in_child(config.clone(), application.clone());
    });

    *slot = Some(ReporterHandle {
        writer,
        worker: Some(worker),
        fork_hook,
    });
    ENABLED.store(true, Ordering::Release);

    info!(endpoint = %endpoint, "Telemetry reporter enabled");
    Ok(())
}

/// Disable telemetry reporting.
///
/// No-op when no reporter is live. Stops the flush worker and waits for any
/// in-flight cycle to finish; does not attempt a final flush (that is
/// [`shutdown`]'s job).
pub fn disable() {
    let mut slot = ACTIVE.lock();
    let Some(mut handle) = slot.take() else {
        debug!("Telemetry reporter not enabled, nothing to disable");
        return;
    };

    forksafe::unregister(handle.fork_hook);
    if let Some(worker) = handle.worker.take() {
        worker.stop();
    }
    ENABLED.store(false, Ordering::Release);

    info!("Telemetry reporter disabled");
}

/// Queue the `app-closed` notice and attempt one flush cycle inline, before
/// the process goes away. Best-effort; the reporter stays enabled.
pub fn shutdown() {
    let Some(writer) = active_writer() else {
        debug!("Telemetry reporter not enabled, skipping shutdown notice");
        return;
    };
    writer.shutdown();
}

/// Record an integration activation for the next flush cycle.
///
/// Dropped silently when the reporter is disabled.
pub fn record_integration(integration: Integration) {
    match active_writer() {
        Some(writer) => writer.record_integration(integration),
        None => debug!(
            integration = %integration.name,
            "Telemetry reporter not enabled, dropping integration event"
        ),
    }
}

/// Append an envelope to the delivery queue.
///
/// Dropped silently when the reporter is disabled.
pub fn enqueue(request: TelemetryRequest) {
    match active_writer() {
        Some(writer) => writer.enqueue(request),
        None => debug!("Telemetry reporter not enabled, dropping request"),
    }
}

/// Whether a reporter is currently live.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Acquire)
}

fn active_writer() -> Option<Arc<TelemetryWriter>> {
    ACTIVE.lock().as_ref().map(|handle| handle.writer.clone())
}

/// Fork hook: discard the inherited reporter and start a fresh one.
///
/// The inherited worker thread does not exist in the child, so the handle is
/// abandoned rather than joined. The inherited queue goes with it.
fn restart_in_child(config: ReporterConfig, application: Application) {
    {
        let mut slot = ACTIVE.lock();
        if let Some(mut handle) = slot.take() {
            forksafe::unregister(handle.fork_hook);
            if let Some(worker) = handle.worker.take() {
                worker.abandon();
            }
            ENABLED.store(false, Ordering::Release);
        }
    }

    if let Err(error) = enable(config, application) {
        warn!(error = %error, "Failed to re-enable telemetry reporter after fork");
    }
}
