//! # recall-temporal
//!
//! Time awareness for retrieval:
//! - [`parse`]: pull a time window and recency intent out of a query
//! - [`build_temporal_filter`]: turn that window into a store range filter
//! - [`apply_recency_boost`]: favor recently valid results

pub mod filter;
pub mod parser;
pub mod recency;

pub use filter::{build_temporal_filter, build_temporal_filter_on, format_timestamp};
pub use parser::{parse, parse_now};
pub use recency::{apply_recency_boost, recency_weight, RECENCY_DECAY_DAYS};
