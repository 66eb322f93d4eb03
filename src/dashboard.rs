// src/dashboard.rs
//! Text dashboard: job list, applicant list, applicant details and the
//! resume viewer, rendered from the aggregation state and the selections.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::applications::{AggregationState, Aggregator, JobGrouping, PageSource};
use crate::lifetime::Lifetime;
use crate::resume::{ResumeError, ResumeSource, ResumeViewer};
use crate::types::{ApplicantView, JobGroup, RecordId};
use crate::utils::{format_timestamp, or_na, NOT_AVAILABLE};

pub const LOADING_MESSAGE: &str = "Loading Job Applications...";
pub const EMPTY_MESSAGE: &str = "No job applications found.";

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Applications are not loaded")]
    NotLoaded,

    #[error("No job matches '{0}'")]
    UnknownJob(String),

    #[error("No applicant matches '{0}'")]
    UnknownApplicant(String),

    #[error("Select an applicant first")]
    NoApplicantSelected,

    #[error("The view was closed before the request finished")]
    Cancelled,

    #[error(transparent)]
    Resume(#[from] ResumeError),
}

/// Which layer is on top
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Jobs,
    Applicants,
    Details,
    Resume,
}

pub struct Dashboard {
    state: AggregationState,
    selected_job: Option<String>,
    selected_applicant: Option<RecordId>,
    viewer: ResumeViewer,
    lifetime: Lifetime,
}

impl Dashboard {
    /// New dashboard whose requests end with `parent`
    pub fn new(parent: &Lifetime) -> Self {
        Self {
            state: AggregationState::Loading,
            selected_job: None,
            selected_applicant: None,
            viewer: ResumeViewer::new(),
            lifetime: parent.child(),
        }
    }

    pub fn with_state(parent: &Lifetime, state: AggregationState) -> Self {
        let mut dashboard = Self::new(parent);
        dashboard.state = state;
        dashboard
    }

    pub fn state(&self) -> &AggregationState {
        &self.state
    }

    pub fn viewer(&self) -> &ResumeViewer {
        &self.viewer
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }

    /// Fetch everything again and rebuild the view from scratch. Returns
    /// false when the dashboard went away before the fetch finished.
    pub async fn load<S: PageSource>(&mut self, aggregator: &Aggregator<S>) -> bool {
        self.state = AggregationState::Loading;
        self.selected_job = None;
        self.selected_applicant = None;
        self.viewer.close();

        match self.lifetime.run(aggregator.load()).await {
            Some(state) => {
                self.state = state;
                true
            }
            None => false,
        }
    }

    fn grouping(&self) -> Result<&JobGrouping, DashboardError> {
        self.state.grouping().ok_or(DashboardError::NotLoaded)
    }

    pub fn screen(&self) -> Screen {
        if self.viewer.is_open() {
            Screen::Resume
        } else if self.selected_applicant.is_some() {
            Screen::Details
        } else if self.selected_job.is_some() {
            Screen::Applicants
        } else {
            Screen::Jobs
        }
    }

    pub fn selected_job(&self) -> Option<&JobGroup> {
        let code = self.selected_job.as_deref()?;
        self.state.grouping()?.group(code)
    }

    pub fn selected_applicant(&self) -> Option<&ApplicantView> {
        let id = self.selected_applicant.as_ref()?.to_string();
        match self.selected_job() {
            Some(group) => group.find_applicant(&id),
            None => self.state.grouping()?.applicant(&id).map(|(_, a)| a),
        }
    }

    /// Select a job by code or by its 1-based position in the list
    pub fn select_job(&mut self, key: &str) -> Result<&JobGroup, DashboardError> {
        let grouping = self.grouping()?;
        let group = grouping
            .group(key)
            .or_else(|| by_position(grouping.groups(), key))
            .ok_or_else(|| DashboardError::UnknownJob(key.trim().to_string()))?;

        let code = group.job_code.clone();
        self.selected_applicant = None;
        self.selected_job = Some(code);
        self.selected_job().ok_or(DashboardError::NotLoaded)
    }

    /// Select an applicant. With a job selected, `key` is an id or a 1-based
    /// position in that job's list; otherwise an id searched across all jobs,
    /// which also selects the applicant's job.
    pub fn select_applicant(&mut self, key: &str) -> Result<&ApplicantView, DashboardError> {
        let unknown = || DashboardError::UnknownApplicant(key.trim().to_string());

        let (job_code, id) = match self.selected_job() {
            Some(group) => {
                let applicant = group
                    .find_applicant(key)
                    .or_else(|| by_position(&group.applicants, key))
                    .ok_or_else(unknown)?;
                (group.job_code.clone(), applicant.id.clone())
            }
            None => {
                let (group, applicant) = self.grouping()?.applicant(key).ok_or_else(unknown)?;
                (group.job_code.clone(), applicant.id.clone())
            }
        };

        self.selected_job = Some(job_code);
        self.selected_applicant = Some(id);
        self.selected_applicant().ok_or(DashboardError::NotLoaded)
    }

    /// Fetch and open the resume of the selected applicant
    pub async fn preview_resume<S>(&mut self, source: &S) -> Result<(), DashboardError>
    where
        S: ResumeSource + ?Sized,
    {
        let applicant = self
            .selected_applicant()
            .ok_or(DashboardError::NoApplicantSelected)?;
        let path = applicant.resume_path.clone();
        let name = applicant.name.clone();

        let lifetime = self.lifetime.clone();
        let viewer = &mut self.viewer;
        lifetime
            .run(viewer.preview(source, &path, name.as_deref()))
            .await
            .ok_or(DashboardError::Cancelled)??;
        Ok(())
    }

    pub fn zoom_in(&mut self) {
        self.viewer.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewer.zoom_out();
    }

    pub async fn download_resume(&self, dir: &Path) -> Result<PathBuf, DashboardError> {
        Ok(self.viewer.download(dir).await?)
    }

    pub fn close_resume(&mut self) {
        self.viewer.close();
    }

    /// Clear the innermost selection. Returns false at the top level.
    pub fn back(&mut self) -> bool {
        match self.screen() {
            Screen::Resume => self.viewer.close(),
            Screen::Details => self.selected_applicant = None,
            Screen::Applicants => self.selected_job = None,
            Screen::Jobs => return false,
        }
        true
    }

    /// Text of the layer on top
    pub fn render(&self) -> String {
        let grouping = match &self.state {
            AggregationState::Loading => return LOADING_MESSAGE.to_string(),
            AggregationState::Failed(message) => return message.clone(),
            AggregationState::Ready(grouping) => grouping,
        };

        if grouping.is_empty() {
            return EMPTY_MESSAGE.to_string();
        }

        match self.screen() {
            Screen::Resume => render_viewer(&self.viewer),
            Screen::Details => match (self.selected_job(), self.selected_applicant()) {
                (Some(_), Some(applicant)) => render_details(applicant),
                _ => render_job_list(grouping),
            },
            Screen::Applicants => match self.selected_job() {
                Some(group) => render_applicant_list(group),
                None => render_job_list(grouping),
            },
            Screen::Jobs => render_job_list(grouping),
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

fn by_position<'a, T>(items: &'a [T], key: &str) -> Option<&'a T> {
    let position: usize = key.trim().parse().ok()?;
    position.checked_sub(1).and_then(|i| items.get(i))
}

// ===== Rendering =====

pub fn render_job_list(grouping: &JobGrouping) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Job Applications ({} applicants)",
        grouping.total_applicants()
    );
    let _ = writeln!(out, "{:<4} {:<36} {:<14} {:>10}", "#", "Job", "Code", "Applicants");
    let _ = writeln!(out, "{}", "-".repeat(67));

    for (i, group) in grouping.groups().iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<4} {:<36} {:<14} {:>10}",
            i + 1,
            group.job_title,
            group.job_code,
            group.applicant_count()
        );
    }
    out
}

pub fn render_applicant_list(group: &JobGroup) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", group.job_title, group.job_code);
    let _ = writeln!(out, "{:<4} {:<8} {:<28} {:<32} {:<18}", "#", "ID", "Name", "Email", "Phone");
    let _ = writeln!(out, "{}", "-".repeat(94));

    for (i, applicant) in group.applicants.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<4} {:<8} {:<28} {:<32} {:<18}",
            i + 1,
            applicant.id,
            or_na(applicant.name.as_deref()),
            or_na(applicant.email.as_deref()),
            or_na(applicant.phone.as_deref())
        );
    }
    out
}

pub fn render_details(applicant: &ApplicantView) -> String {
    let job = applicant.job.as_ref();
    let job_line = match job {
        Some(job) => format!(
            "{} ({})",
            or_na(job.job_title.as_deref()),
            job.id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        ),
        None => NOT_AVAILABLE.to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "Applicant Full Details");
    let _ = writeln!(out, "{}", "-".repeat(22));
    let _ = writeln!(out, "{:<13} {}", "Name:", or_na(applicant.name.as_deref()));
    let _ = writeln!(out, "{:<13} {}", "Email:", or_na(applicant.email.as_deref()));
    let _ = writeln!(out, "{:<13} {}", "Phone:", or_na(applicant.phone.as_deref()));
    let _ = writeln!(out, "{:<13} {}", "Job:", job_line);
    let _ = writeln!(
        out,
        "{:<13} {}",
        "Department:",
        or_na(job.and_then(|j| j.department.as_deref()))
    );
    let _ = writeln!(out, "{:<13} {}", "LinkedIn:", or_na(applicant.linkedin_url.as_deref()));
    let _ = writeln!(out, "{:<13} {}", "Portfolio:", or_na(applicant.portfolio_url.as_deref()));
    let _ = writeln!(
        out,
        "{:<13} {}",
        "Applied On:",
        format_timestamp(applicant.application_date.as_deref())
    );
    let _ = writeln!(out, "Cover Letter:");
    let _ = writeln!(out, "{}", or_na(applicant.cover_letter.as_deref()));
    out
}

pub fn render_viewer(viewer: &ResumeViewer) -> String {
    let Some(blob) = viewer.blob() else {
        return String::new();
    };

    let mut out = String::new();
    let _ = writeln!(out, "Resume: {}", viewer.applicant_name());
    let _ = writeln!(
        out,
        "Zoom: {}  Size: {}  Pages: {}",
        viewer.zoom(),
        human_size(blob.len()),
        match blob.page_count_hint() {
            0 => "?".to_string(),
            n => n.to_string(),
        }
    );
    out
}

fn human_size(len: usize) -> String {
    if len < 1024 {
        format!("{} B", len)
    } else if len < 1024 * 1024 {
        format!("{:.1} KB", len as f64 / 1024.0)
    } else {
        format!("{:.1} MB", len as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applications::LOAD_FAILURE_MESSAGE;
    use crate::resume::{ResumePayload, PREVIEW_FAILURE_MESSAGE};
    use crate::test_support::{record, FakePages, FakeResumes, PDF_BYTES};
    use bytes::Bytes;

    fn ready() -> AggregationState {
        let mut records = vec![
            record(1, Some("J1"), "Welder"),
            record(2, Some("J2"), "Fitter"),
            record(3, Some("J1"), "Welder"),
        ];
        records[0].cover_letter = Some("Dear team".to_string());
        AggregationState::Ready(JobGrouping::from_records(records))
    }

    fn pdf() -> ResumePayload {
        ResumePayload {
            status: 200,
            content_type: Some("application/pdf".to_string()),
            bytes: Bytes::from_static(PDF_BYTES),
        }
    }

    #[test]
    fn test_render_states() {
        let root = Lifetime::new();
        assert_eq!(Dashboard::new(&root).render(), LOADING_MESSAGE);

        let failed = Dashboard::with_state(
            &root,
            AggregationState::Failed(LOAD_FAILURE_MESSAGE.to_string()),
        );
        assert_eq!(failed.render(), LOAD_FAILURE_MESSAGE);

        let empty = Dashboard::with_state(
            &root,
            AggregationState::Ready(JobGrouping::default()),
        );
        assert_eq!(empty.render(), EMPTY_MESSAGE);
    }

    #[test]
    fn test_navigation() {
        let root = Lifetime::new();
        let mut dashboard = Dashboard::with_state(&root, ready());
        assert_eq!(dashboard.screen(), Screen::Jobs);
        assert!(dashboard.render().contains("Job Applications (3 applicants)"));

        assert_eq!(dashboard.select_job("1").unwrap().job_code, "J1");
        assert_eq!(dashboard.screen(), Screen::Applicants);
        assert!(dashboard.render().starts_with("Welder (J1)"));

        assert_eq!(dashboard.select_applicant("2").unwrap().id.to_string(), "3");
        assert_eq!(dashboard.screen(), Screen::Details);
        let details = dashboard.render();
        assert!(details.contains("Applicant Full Details"));
        assert!(details.contains("Welder (J1)"));
        assert!(details.contains("Department:   N/A"));

        assert!(dashboard.back());
        assert_eq!(dashboard.screen(), Screen::Applicants);
        assert!(dashboard.back());
        assert_eq!(dashboard.screen(), Screen::Jobs);
        assert!(!dashboard.back());
    }

    #[test]
    fn test_select_by_id_across_jobs() {
        let root = Lifetime::new();
        let mut dashboard = Dashboard::with_state(&root, ready());

        dashboard.select_applicant("2").unwrap();
        assert_eq!(dashboard.selected_job().unwrap().job_code, "J2");
        assert!(dashboard.render().contains("Fitter (J2)"));

        assert!(matches!(
            dashboard.select_job("J7"),
            Err(DashboardError::UnknownJob(_))
        ));
        assert!(matches!(
            dashboard.select_applicant("42"),
            Err(DashboardError::UnknownApplicant(_))
        ));
        assert_eq!(dashboard.selected_job().unwrap().job_code, "J2");
    }

    #[test]
    fn test_selection_requires_loaded_state() {
        let root = Lifetime::new();
        let mut dashboard = Dashboard::new(&root);
        assert!(matches!(dashboard.select_job("1"), Err(DashboardError::NotLoaded)));
    }

    #[tokio::test]
    async fn test_resume_flow() {
        let root = Lifetime::new();
        let mut dashboard = Dashboard::with_state(&root, ready());
        let source = FakeResumes::serving(pdf());

        assert!(matches!(
            dashboard.preview_resume(&source).await,
            Err(DashboardError::NoApplicantSelected)
        ));

        dashboard.select_applicant("1").unwrap();
        dashboard.preview_resume(&source).await.unwrap();
        assert_eq!(source.requested(), vec!["/career/applications/1/resume"]);
        assert_eq!(dashboard.screen(), Screen::Resume);

        dashboard.zoom_out();
        let view = dashboard.render();
        assert!(view.contains("Resume: Applicant 1"));
        assert!(view.contains("Zoom: 80%"));

        let dir = tempfile::tempdir().unwrap();
        let path = dashboard.download_resume(dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "Applicant 1.pdf");

        assert!(dashboard.back());
        assert_eq!(dashboard.screen(), Screen::Details);
    }

    #[tokio::test]
    async fn test_failed_resume_keeps_details_open() {
        let root = Lifetime::new();
        let mut dashboard = Dashboard::with_state(&root, ready());
        dashboard.select_applicant("1").unwrap();

        let err = dashboard
            .preview_resume(&FakeResumes::failing())
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Resume(_)));
        assert_eq!(dashboard.screen(), Screen::Details);
        assert!(!PREVIEW_FAILURE_MESSAGE.is_empty());
    }

    #[tokio::test]
    async fn test_load_rebuilds_and_clears_selection() {
        let root = Lifetime::new();
        let mut dashboard = Dashboard::with_state(&root, ready());
        dashboard.select_job("J1").unwrap();

        let source = FakePages::uniform(2, 3);
        assert!(dashboard.load(&Aggregator::new(&source, 3)).await);
        assert_eq!(dashboard.screen(), Screen::Jobs);
        assert_eq!(dashboard.state().displayed_applicants(), 6);
    }

    #[tokio::test]
    async fn test_cancelled_dashboard_ignores_late_response() {
        let root = Lifetime::new();
        let mut dashboard = Dashboard::new(&root);
        root.cancel();

        let source = FakePages::uniform(1, 1).delayed(std::time::Duration::from_secs(30));
        assert!(!dashboard.load(&Aggregator::new(&source, 1)).await);
        assert_eq!(dashboard.state(), &AggregationState::Loading);
    }
}
