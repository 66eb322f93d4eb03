// src/types/view.rs
//! Display-ready shapes consumed by the dashboard and the exporter

use serde::Serialize;

use crate::core::api_client::resume_endpoint;
use crate::types::application::{ApplicationRecord, JobRef, RecordId};

/// An application rewritten for display, with its resume path precomputed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantView {
    pub id: RecordId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub resume_path: String,
    pub job: Option<JobRef>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub application_date: Option<String>,
    pub cover_letter: Option<String>,
}

impl From<ApplicationRecord> for ApplicantView {
    fn from(record: ApplicationRecord) -> Self {
        Self {
            resume_path: resume_endpoint(&record.id),
            id: record.id,
            name: record.full_name,
            email: record.email,
            phone: record.phone_number,
            job: record.job,
            linkedin_url: record.linkedin_url,
            portfolio_url: record.portfolio_url,
            application_date: record.created_at,
            cover_letter: record.cover_letter,
        }
    }
}

/// All applicants targeting one job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobGroup {
    pub job_code: String,
    pub job_title: String,
    pub applicants: Vec<ApplicantView>,
}

impl JobGroup {
    pub fn applicant_count(&self) -> usize {
        self.applicants.len()
    }

    pub fn find_applicant(&self, raw_id: &str) -> Option<&ApplicantView> {
        self.applicants.iter().find(|a| a.id.matches(raw_id))
    }
}
