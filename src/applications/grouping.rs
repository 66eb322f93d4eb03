// src/applications/grouping.rs
//! Fold of the flat application list into per-job groups

use serde::Serialize;
use std::collections::HashMap;

use crate::types::{ApplicantView, ApplicationRecord, JobGroup};

/// Key for applications without a usable job reference
pub const UNKNOWN_JOB: &str = "UNKNOWN";
/// Title for jobs the backend sent without one
pub const UNTITLED_JOB: &str = "Untitled Job";

/// Applications grouped by job code. Numeric codes come first in ascending
/// order, other codes follow in first-encounter order; applicants keep
/// accumulation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobGrouping {
    groups: Vec<JobGroup>,
    total_applicants: usize,
}

impl JobGrouping {
    /// A job's title is whatever the first record for it said. Later records
    /// with a different title for the same code do not overwrite it.
    pub fn from_records(records: impl IntoIterator<Item = ApplicationRecord>) -> Self {
        let mut groups: Vec<JobGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut total_applicants = 0;

        for record in records {
            let job_code = record
                .job_id()
                .map(|id| id.to_string())
                .unwrap_or_else(|| UNKNOWN_JOB.to_string());

            let slot = *index.entry(job_code.clone()).or_insert_with(|| {
                groups.push(JobGroup {
                    job_title: record.job_title().unwrap_or(UNTITLED_JOB).to_string(),
                    job_code,
                    applicants: Vec::new(),
                });
                groups.len() - 1
            });

            groups[slot].applicants.push(ApplicantView::from(record));
            total_applicants += 1;
        }

        // Stable: non-numeric codes keep their encounter order
        groups.sort_by_key(|g| match numeric_code(&g.job_code) {
            Some(n) => (0, n),
            None => (1, 0),
        });

        Self {
            groups,
            total_applicants,
        }
    }

    pub fn groups(&self) -> &[JobGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total_applicants(&self) -> usize {
        self.total_applicants
    }

    pub fn group(&self, job_code: &str) -> Option<&JobGroup> {
        let job_code = job_code.trim();
        self.groups.iter().find(|g| g.job_code == job_code)
    }

    /// First applicant with this id across all groups
    pub fn applicant(&self, raw_id: &str) -> Option<(&JobGroup, &ApplicantView)> {
        self.groups
            .iter()
            .find_map(|g| g.find_applicant(raw_id).map(|a| (g, a)))
    }

    pub fn applicants(&self) -> impl Iterator<Item = (&JobGroup, &ApplicantView)> {
        self.groups
            .iter()
            .flat_map(|g| g.applicants.iter().map(move |a| (g, a)))
    }
}

/// Canonical non-negative integer code, e.g. `12` but not `012` or `-1`
fn numeric_code(code: &str) -> Option<u32> {
    let n: u32 = code.parse().ok()?;
    (n != u32::MAX && n.to_string() == code).then_some(n)
}
