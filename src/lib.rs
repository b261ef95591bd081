//! Inertial and vibration monitoring pipeline.
//!
//! Raw sensor-hub reports go in; an orientation estimate, a five-band
//! vibration spectrum and a stream of classified vibration/impact events come
//! out. [`Pipeline`] is the synchronous core; [`dispatch`] runs it on a
//! dedicated worker thread and hands results to a consumer.

pub mod assembler;
pub mod capture;
pub mod config;
pub mod decoder;
pub mod detectors;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod filters;
pub mod history;
pub mod live_status;
pub mod pipeline;
pub mod sources;
pub mod types;

pub use config::MonitorConfig;
pub use dispatch::{spawn_worker, ConsumerState, WorkerMessage};
pub use error::{MonitorError, Result};
pub use events::{EventLog, EventRecord, Severity};
pub use pipeline::{FeedOutcome, Pipeline, PipelineStats, Snapshot};
pub use types::{RawReport, SensorTag};
