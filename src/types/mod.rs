// src/types/mod.rs
pub mod application;
pub mod envelope;
pub mod view;

pub use application::{ApplicationRecord, JobRef, RecordId};
pub use envelope::{Page, PageEnvelope};
pub use view::{ApplicantView, JobGroup};
