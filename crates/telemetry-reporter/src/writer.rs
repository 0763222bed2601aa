//! Delivery queue, sequence counter and flush cycle.

use crate::{DeliverySender, ReporterConfig, TelemetryResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use telemetry_events::{Application, Integration, ReporterIdentity, TelemetryRequest};
use tracing::{debug, warn};

/// Owns the pending-delivery state for one live reporter instance.
///
/// Producers append from arbitrary threads via [`enqueue`](Self::enqueue) and
/// [`record_integration`](Self::record_integration); the periodic worker (and
/// [`shutdown`](Self::shutdown)) drain via [`flush`](Self::flush). An envelope
/// leaves the queue only when the collector confirmed it, so delivery is
/// at-least-once and a persistent outage grows the queue without bound.
pub struct TelemetryWriter {
    sender: DeliverySender,
    identity: ReporterIdentity,
    /// Envelopes awaiting delivery, oldest first.
    queue: Mutex<Vec<TelemetryRequest>>,
    /// The single pending `app-integrations-changed` envelope for the current
    /// cycle, if any integrations were recorded since the last flush.
    pending_integrations: Mutex<Option<TelemetryRequest>>,
    /// Advanced exactly once per confirmed delivery, never on failure.
    sequence: AtomicU64,
    /// Serializes flush cycles: the periodic worker and an inline shutdown
    /// flush must not stamp sequence numbers concurrently.
    flush_gate: Mutex<()>,
}

impl TelemetryWriter {
    /// Build a writer for the configured collector.
    pub fn new(config: ReporterConfig, application: Application) -> TelemetryResult<Self> {
        let sender = DeliverySender::new(&config)?;
        let identity = ReporterIdentity::new(application, config.api_key.clone());

        Ok(Self {
            sender,
            identity,
            queue: Mutex::new(Vec::new()),
            pending_integrations: Mutex::new(None),
            sequence: AtomicU64::new(0),
            flush_gate: Mutex::new(()),
        })
    }

    /// The per-process identity stamped into every envelope this writer
    /// builds.
    pub fn identity(&self) -> &ReporterIdentity {
        &self.identity
    }

    /// Append an envelope to the delivery queue.
    pub fn enqueue(&self, request: TelemetryRequest) {
        let mut queue = self.queue.lock();
        queue.push(request);
        debug!(queued = queue.len(), "Enqueued telemetry request");
    }

    /// Record an integration activation.
    ///
    /// Appends to the current cycle's pending integrations envelope, creating
    /// it on the first call. No queue or network interaction happens here, so
    /// the caller's path stays cheap; the envelope moves into the queue at the
    /// start of the next flush cycle.
    pub fn record_integration(&self, integration: Integration) {
        let mut pending = self.pending_integrations.lock();
        match pending.as_mut() {
            Some(request) => {
                request.push_integration(integration);
            }
            None => {
                *pending = Some(TelemetryRequest::integrations_changed(
                    &self.identity,
                    vec![integration],
                ));
            }
        }
    }

    /// Run one flush cycle.
    ///
    /// Normally driven by the periodic worker; [`shutdown`](Self::shutdown)
    /// runs it inline. Never panics and never returns an error: failed
    /// envelopes are re-queued for the next cycle.
    pub fn flush(&self) {
        let _cycle = self.flush_gate.lock();

        if let Some(request) = self.pending_integrations.lock().take() {
            self.queue.lock().push(request);
        }

        // Cycle snapshot: envelopes enqueued while sends are in progress are
        // picked up next cycle.
        let batch = std::mem::take(&mut *self.queue.lock());
        if batch.is_empty() {
            return;
        }

        let mut failed = Vec::new();
        for mut request in batch {
            request.stamp_seq_id(self.sequence.load(Ordering::Acquire));
            let outcome = self.sender.send(&request);
            if outcome.is_accepted() {
                self.sequence.fetch_add(1, Ordering::Release);
            } else {
                failed.push(request);
            }
        }

        if !failed.is_empty() {
            let mut queue = self.queue.lock();
            let requeued = failed.len();
            queue.extend(failed);
            warn!(
                requeued = requeued,
                queued = queue.len(),
                "Re-queued undelivered telemetry for next cycle"
            );
        }
    }

    /// Enqueue the closing notice and attempt delivery inline, bypassing the
    /// periodic worker. Best-effort: failures are re-queued as usual, but the
    /// process is typically about to exit.
    pub fn shutdown(&self) {
        self.enqueue(TelemetryRequest::app_closed(&self.identity));
        self.flush();
    }

    /// Current sequence counter value.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Number of envelopes awaiting delivery.
    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether any integrations were recorded since the last flush.
    pub fn has_pending_integrations(&self) -> bool {
        self.pending_integrations.lock().is_some()
    }
}
