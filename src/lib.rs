//! Admin client for the career portal: session validation, paginated
//! retrieval of job applications grouped by job, and resume preview and
//! download.

pub mod applications;
pub mod cli;
pub mod config;
pub mod core;
pub mod dashboard;
pub mod export;
pub mod guard;
pub mod lifetime;
pub mod resume;
pub mod session;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use applications::{AggregationState, Aggregator, JobGrouping};
pub use config::AdminConfig;
pub use crate::core::{ApiClient, ApiError};
pub use dashboard::Dashboard;
pub use guard::{GuardState, SessionGuard};
pub use lifetime::Lifetime;
pub use resume::{ResumeBlob, ResumeViewer};
pub use session::{Credentials, SessionStore, SessionToken};
