// src/export.rs
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::applications::JobGrouping;

#[derive(Debug, Serialize)]
struct ApplicantRow<'a> {
    job_code: &'a str,
    job_title: &'a str,
    applicant_id: String,
    name: Option<&'a str>,
    email: Option<&'a str>,
    phone: Option<&'a str>,
    linkedin_url: Option<&'a str>,
    portfolio_url: Option<&'a str>,
    applied_on: Option<&'a str>,
    resume_path: &'a str,
}

/// Write one CSV row per applicant, in grouping order. Returns the row count.
pub fn write_csv<W: Write>(grouping: &JobGrouping, out: W) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    let mut rows = 0;

    for (group, applicant) in grouping.applicants() {
        writer
            .serialize(ApplicantRow {
                job_code: &group.job_code,
                job_title: &group.job_title,
                applicant_id: applicant.id.to_string(),
                name: applicant.name.as_deref(),
                email: applicant.email.as_deref(),
                phone: applicant.phone.as_deref(),
                linkedin_url: applicant.linkedin_url.as_deref(),
                portfolio_url: applicant.portfolio_url.as_deref(),
                applied_on: applicant.application_date.as_deref(),
                resume_path: &applicant.resume_path,
            })
            .with_context(|| format!("Failed to write CSV row for applicant {}", applicant.id))?;
        rows += 1;
    }

    writer.flush().context("Failed to flush CSV output")?;
    Ok(rows)
}
