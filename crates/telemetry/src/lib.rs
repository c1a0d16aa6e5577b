//! Relay telemetry infrastructure.
//!
//! Implements the [`pipeline::Telemetry`] port with [`TelemetryStore`]: a
//! bounded ring buffer of trace entries plus per-agent call, error, and
//! duration metrics, all held in memory for the lifetime of the process.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** The store is constructed once by the composition root
//! and injected into every orchestration component as an
//! `Arc<dyn pipeline::Telemetry>`. Tests construct their own isolated stores.

mod store;

pub use store::TelemetryStore;
