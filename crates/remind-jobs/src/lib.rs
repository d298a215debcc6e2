//! Background enrichment for the remind backend.
//!
//! Reminder creation submits an [`EnrichmentJob`] to an in-process
//! [`EnrichmentQueue`] and returns immediately; the [`EnrichmentWorker`]
//! drains the queue and runs the pipeline from `remind-engine`. Worker
//! lifecycle and per-job outcomes are observable over a broadcast
//! [`WorkerEvent`] channel.

pub mod queue;
pub mod worker;

pub use queue::{EnrichmentJob, EnrichmentQueue, JobReceiver};
pub use worker::{EnrichmentWorker, WorkerConfig, WorkerEvent, WorkerHandle};
