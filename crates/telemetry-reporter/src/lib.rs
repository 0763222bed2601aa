//! Background telemetry reporting for the instrumentation library.
//!
//! This crate provides:
//! - [`TelemetryWriter`]: delivery queue, sequence counter and integration
//!   batcher, flushed one cycle at a time
//! - [`DeliverySender`]: one blocking HTTP round-trip per envelope against the
//!   configured collector
//! - A periodic worker thread driving the flush cycle on a fixed interval
//! - Process-wide lifecycle entry points ([`enable`], [`disable`],
//!   [`shutdown`], [`record_integration`], [`enqueue`]) guarding a single live
//!   reporter per process, rebuilt transparently after a fork
//!
//! Delivery is at-least-once: a failed envelope stays queued and is retried on
//! the next cycle; the sequence counter advances only for confirmed
//! deliveries. Nothing here ever propagates a delivery failure to the
//! instrumented application.

mod config;
mod error;
mod lifecycle;
mod sender;
mod worker;
mod writer;

pub use config::{ReporterConfig, DEFAULT_FLUSH_INTERVAL_SECS, INTERVAL_ENV};
pub use error::{TelemetryError, TelemetryResult};
pub use lifecycle::{disable, enable, enqueue, is_enabled, record_integration, shutdown};
pub use sender::{DeliverySender, SendOutcome};
pub use writer::TelemetryWriter;
