// src/applications/mod.rs
//! Paginated fetch of every job application and its grouping by job

pub mod aggregator;
pub mod grouping;
pub mod pages;

pub use aggregator::{AggregationState, Aggregator, LOAD_FAILURE_MESSAGE};
pub use grouping::{JobGrouping, UNKNOWN_JOB, UNTITLED_JOB};
pub use pages::{page_stream, PageSource};
