//! Periodic flush worker.

use crate::{TelemetryResult, TelemetryWriter};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

const WORKER_THREAD_NAME: &str = "telemetry-flush";

/// Drives [`TelemetryWriter::flush`] on a fixed interval from one dedicated
/// background thread.
///
/// The stop channel doubles as the timer: `recv_timeout(interval)` either
/// times out (run a flush cycle) or yields the stop signal (exit). The
/// interval is read once at construction.
pub(crate) struct PeriodicWorker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl PeriodicWorker {
    /// Spawn the flush worker thread.
    pub(crate) fn start(
        writer: Arc<TelemetryWriter>,
        interval: Duration,
    ) -> TelemetryResult<Self> {
        let (stop, stop_rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_flush_loop(writer, stop_rx, interval))?;

        Ok(Self { stop, handle })
    }

    /// Stop the worker and wait for any in-flight flush cycle to finish.
    pub(crate) fn stop(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            warn!("Telemetry flush worker panicked before join");
        }
    }

    /// Discard the worker handle without joining.
    ///
    /// Only valid in a freshly forked child, where the inherited thread does
    /// not exist and joining it would never return. Dropping the stop sender
    /// also makes a still-live thread (simulated forks in tests) exit on its
    /// next wakeup.
    pub(crate) fn abandon(self) {
        drop(self.stop);
        drop(self.handle);
    }
}

fn run_flush_loop(writer: Arc<TelemetryWriter>, stop: Receiver<()>, interval: Duration) {
    debug!(
        interval_secs = interval.as_secs_f64(),
        "Telemetry flush worker started"
    );

    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => writer.flush(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!("Telemetry flush worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReporterConfig;
    use telemetry_events::{Application, TelemetryRequest};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // The blocking HTTP client must be built off the async runtime.
    async fn test_writer(endpoint: &str, interval: Duration) -> Arc<TelemetryWriter> {
        let endpoint = endpoint.to_string();
        tokio::task::spawn_blocking(move || {
            let config = ReporterConfig::new(endpoint).with_flush_interval(interval);
            Arc::new(TelemetryWriter::new(config, Application::new("svc")).unwrap())
        })
        .await
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn worker_flushes_on_interval() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let interval = Duration::from_millis(50);
        let writer = test_writer(&server.uri(), interval).await;
        writer.enqueue(TelemetryRequest::app_started(writer.identity()));

        let worker = PeriodicWorker::start(writer.clone(), interval).unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(writer.sequence(), 1);
        assert_eq!(writer.queue_len(), 0);

        tokio::task::spawn_blocking(move || worker.stop())
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_joins_and_halts_ticks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let interval = Duration::from_millis(50);
        let writer = test_writer(&server.uri(), interval).await;
        let worker = PeriodicWorker::start(writer.clone(), interval).unwrap();

        tokio::task::spawn_blocking(move || worker.stop())
            .await
            .unwrap();

        // The worker is gone: nothing drains the queue anymore.
        writer.enqueue(TelemetryRequest::app_started(writer.identity()));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(writer.queue_len(), 1);
        assert_eq!(writer.sequence(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn abandoned_worker_exits_without_flushing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let interval = Duration::from_millis(50);
        let writer = test_writer(&server.uri(), interval).await;
        let worker = PeriodicWorker::start(writer.clone(), interval).unwrap();

        // Dropping the stop sender wakes the loop immediately.
        worker.abandon();
        writer.enqueue(TelemetryRequest::app_started(writer.identity()));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(writer.queue_len(), 1);
        assert_eq!(writer.sequence(), 0);
    }
}
