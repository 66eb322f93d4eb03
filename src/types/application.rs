// src/types/application.rs
//! Application records as the career backend returns them

use serde::{Deserialize, Serialize};
use std::fmt;

// ===== Identifiers =====

/// Backend identifier. The career API is not consistent about numeric vs.
/// string ids, so both are accepted and rendered verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    /// Ids the backend uses for "not set": `0` or an empty string
    pub fn is_blank(&self) -> bool {
        match self {
            RecordId::Number(n) => *n == 0,
            RecordId::Text(text) => text.trim().is_empty(),
        }
    }

    /// Match a user supplied id against this one, whatever its JSON type was
    pub fn matches(&self, raw: &str) -> bool {
        self.to_string() == raw.trim()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Number(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

// ===== Records =====

/// The job an application targets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobRef {
    pub id: Option<RecordId>,
    pub job_title: Option<String>,
    pub department: Option<String>,
}

/// One candidate's submission against a job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: RecordId,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    /// Raw timestamp; parsed only for display
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub job: Option<JobRef>,
}

impl ApplicationRecord {
    /// Job id of the targeted job, if the backend sent a usable one
    pub fn job_id(&self) -> Option<&RecordId> {
        self.job
            .as_ref()
            .and_then(|job| job.id.as_ref())
            .filter(|id| !id.is_blank())
    }

    pub fn job_title(&self) -> Option<&str> {
        self.job
            .as_ref()
            .and_then(|job| job.job_title.as_deref())
            .filter(|title| !title.trim().is_empty())
    }
}
