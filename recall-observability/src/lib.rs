//! # recall-observability
//!
//! - [`tracing_setup`]: JSON subscriber driven by `RECALL_LOG`, span macros, named events
//! - [`query_log`]: bounded log of served queries with latency statistics
//! - [`degradation`]: record of fallbacks and recoveries

pub mod degradation;
pub mod query_log;
pub mod tracing_setup;

pub use degradation::{DegradationTracker, RecoveryStatus, TrackedDegradation};
pub use query_log::{QueryLog, QueryLogEntry};
pub use tracing_setup::{init_from_config, init_tracing, init_tracing_with_filter, LOG_ENV};
