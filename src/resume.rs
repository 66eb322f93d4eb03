// src/resume.rs
//! Resume preview and download

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

use crate::core::error::ApiError;
use crate::utils::{download_file_name, write_file_atomic};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Message shown when a preview cannot be opened
pub const PREVIEW_FAILURE_MESSAGE: &str = "Unable to preview resume";

pub const ZOOM_DEFAULT_PERCENT: u32 = 100;
pub const ZOOM_STEP_PERCENT: u32 = 20;
pub const ZOOM_FLOOR_PERCENT: u32 = 40;

/// Raw answer of a resume download, status not yet judged
#[derive(Debug, Clone)]
pub struct ResumePayload {
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[async_trait]
pub trait ResumeSource: Send + Sync {
    async fn fetch_resume(&self, path: &str) -> Result<ResumePayload, ApiError>;
}

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("Resume request failed: {0}")]
    Fetch(#[from] ApiError),

    #[error("Resume request returned status {status}")]
    Status { status: u16 },

    #[error("Resume is empty")]
    Empty,

    #[error("Resume is not a PDF (content type {})", .content_type.as_deref().unwrap_or("unknown"))]
    NotPdf { content_type: Option<String> },

    #[error("No resume is open")]
    NothingOpen,

    #[error("Failed to write resume to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// PDF bytes held for the open viewer
#[derive(Clone, PartialEq)]
pub struct ResumeBlob {
    bytes: Bytes,
}

impl ResumeBlob {
    /// Accept only 2xx answers whose body carries the PDF signature
    pub fn from_payload(payload: ResumePayload) -> Result<Self, ResumeError> {
        if !(200..300).contains(&payload.status) {
            return Err(ResumeError::Status {
                status: payload.status,
            });
        }
        if payload.bytes.is_empty() {
            return Err(ResumeError::Empty);
        }
        if !payload.bytes.starts_with(PDF_SIGNATURE) {
            return Err(ResumeError::NotPdf {
                content_type: payload.content_type,
            });
        }

        Ok(Self {
            bytes: payload.bytes,
        })
    }

    pub fn content_type(&self) -> &'static str {
        PDF_CONTENT_TYPE
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Rough page count from `/Type /Page` objects; 0 when none are found
    pub fn page_count_hint(&self) -> usize {
        const MARKER: &[u8] = b"/Type";
        let data = &self.bytes[..];
        let mut count = 0;
        let mut i = 0;

        while i + MARKER.len() <= data.len() {
            if &data[i..i + MARKER.len()] == MARKER {
                let rest = &data[i + MARKER.len()..];
                let rest = &rest[rest.iter().take_while(|b| b.is_ascii_whitespace()).count()..];
                // `/Pages` is the page tree node, not a page
                if rest.starts_with(b"/Page") && !rest.starts_with(b"/Pages") {
                    count += 1;
                }
                i += MARKER.len();
            } else {
                i += 1;
            }
        }
        count
    }
}

impl fmt::Debug for ResumeBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeBlob")
            .field("content_type", &PDF_CONTENT_TYPE)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Viewer scale in percent. Steps of 20, never below 40, no ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Zoom(u32);

impl Zoom {
    pub fn percent(&self) -> u32 {
        self.0
    }

    pub fn factor(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    pub fn zoom_in(&mut self) {
        self.0 = self.0.saturating_add(ZOOM_STEP_PERCENT);
    }

    pub fn zoom_out(&mut self) {
        if self.0 > ZOOM_FLOOR_PERCENT {
            self.0 = self.0.saturating_sub(ZOOM_STEP_PERCENT).max(ZOOM_FLOOR_PERCENT);
        }
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Zoom(ZOOM_DEFAULT_PERCENT)
    }
}

impl fmt::Display for Zoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// State of the resume viewer. A new preview replaces the previous blob.
#[derive(Debug, Default)]
pub struct ResumeViewer {
    blob: Option<ResumeBlob>,
    applicant_name: Option<String>,
    zoom: Zoom,
}

impl ResumeViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.blob.is_some()
    }

    pub fn blob(&self) -> Option<&ResumeBlob> {
        self.blob.as_ref()
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    /// Name used for the download, `resume` without one
    pub fn applicant_name(&self) -> &str {
        self.applicant_name.as_deref().unwrap_or("resume")
    }

    /// Fetch and open a resume. On failure the viewer stays as it was.
    pub async fn preview<S>(
        &mut self,
        source: &S,
        path: &str,
        applicant_name: Option<&str>,
    ) -> Result<(), ResumeError>
    where
        S: ResumeSource + ?Sized,
    {
        let blob = source
            .fetch_resume(path)
            .await
            .map_err(ResumeError::from)
            .and_then(ResumeBlob::from_payload)
            .inspect_err(|e| error!("Resume preview error for {}: {}", path, e))?;

        self.open(blob, applicant_name);
        Ok(())
    }

    /// Show `blob` at default zoom
    pub fn open(&mut self, blob: ResumeBlob, applicant_name: Option<&str>) {
        self.applicant_name = applicant_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        self.blob = Some(blob);
        self.zoom = Zoom::default();
    }

    pub fn close(&mut self) {
        self.blob = None;
        self.applicant_name = None;
        self.zoom = Zoom::default();
    }

    pub fn zoom_in(&mut self) {
        self.zoom.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.zoom.zoom_out();
    }

    pub fn download_file_name(&self) -> String {
        download_file_name(self.applicant_name.as_deref())
    }

    /// Save the open resume as `<applicant name>.pdf` in `dir`
    pub async fn download(&self, dir: &Path) -> Result<PathBuf, ResumeError> {
        let blob = self.blob.as_ref().ok_or(ResumeError::NothingOpen)?;
        let path = dir.join(self.download_file_name());

        write_file_atomic(&path, blob.bytes())
            .await
            .map_err(|source| ResumeError::Write {
                path: path.clone(),
                source,
            })?;

        info!("Resume saved to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::api_client::resume_endpoint;
    use crate::test_support::{FakeResumes, MockBackend, PDF_BYTES};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    fn payload(status: u16, body: &'static [u8]) -> ResumePayload {
        ResumePayload {
            status,
            content_type: Some("application/pdf".to_string()),
            bytes: Bytes::from_static(body),
        }
    }

    #[test]
    fn test_blob_validation() {
        assert!(ResumeBlob::from_payload(payload(200, PDF_BYTES)).is_ok());
        assert!(matches!(
            ResumeBlob::from_payload(payload(404, PDF_BYTES)),
            Err(ResumeError::Status { status: 404 })
        ));
        assert!(matches!(
            ResumeBlob::from_payload(payload(200, b"")),
            Err(ResumeError::Empty)
        ));
        assert!(matches!(
            ResumeBlob::from_payload(payload(200, b"{\"error\":\"nope\"}")),
            Err(ResumeError::NotPdf { .. })
        ));
    }

    #[test]
    fn test_page_count_hint() {
        let blob = ResumeBlob::from_payload(payload(
            200,
            b"%PDF-1.4\n1 0 obj << /Type /Pages /Count 2 >>\n2 0 obj << /Type /Page >>\n3 0 obj << /Type/Page >>",
        ))
        .unwrap();
        assert_eq!(blob.page_count_hint(), 2);

        let bare = ResumeBlob::from_payload(payload(200, b"%PDF-1.7")).unwrap();
        assert_eq!(bare.page_count_hint(), 0);
    }

    #[test]
    fn test_zoom_floor_and_steps() {
        let mut zoom = Zoom::default();
        assert_eq!(zoom.percent(), 100);

        for _ in 0..10 {
            let before = zoom;
            zoom.zoom_out();
            assert!(zoom <= before);
            assert!(zoom.percent() >= ZOOM_FLOOR_PERCENT);
        }
        assert_eq!(zoom.percent(), 40);

        zoom.zoom_in();
        assert_eq!(zoom.percent(), 60);
        for _ in 0..20 {
            let before = zoom;
            zoom.zoom_in();
            assert!(zoom > before);
        }
        assert_eq!(zoom.percent(), 460);
        assert!((zoom.factor() - 4.6).abs() < f64::EPSILON);
        assert_eq!(zoom.to_string(), "460%");
    }

    #[tokio::test]
    async fn test_preview_opens_and_resets_zoom() {
        let source = FakeResumes::serving(payload(200, PDF_BYTES));
        let mut viewer = ResumeViewer::new();

        viewer.preview(&source, "/r/1", Some("Jane Roe")).await.unwrap();
        viewer.zoom_in();
        viewer.zoom_in();
        assert_eq!(viewer.zoom().percent(), 140);

        viewer.preview(&source, "/r/2", None).await.unwrap();
        assert!(viewer.is_open());
        assert_eq!(viewer.zoom().percent(), 100);
        assert_eq!(viewer.applicant_name(), "resume");
        assert_eq!(viewer.blob().unwrap().content_type(), PDF_CONTENT_TYPE);
        assert_eq!(source.requested(), vec!["/r/1", "/r/2"]);
    }

    #[tokio::test]
    async fn test_failed_preview_does_not_open() {
        let mut viewer = ResumeViewer::new();

        let source = FakeResumes::serving(payload(500, b"oops"));
        let err = viewer.preview(&source, "/r/1", Some("A")).await.unwrap_err();
        assert!(matches!(err, ResumeError::Status { status: 500 }));
        assert!(!viewer.is_open());

        let source = FakeResumes::failing();
        let err = viewer.preview(&source, "/r/1", Some("A")).await.unwrap_err();
        assert!(matches!(err, ResumeError::Fetch(_)));
        assert!(!viewer.is_open());
    }

    #[tokio::test]
    async fn test_download_names_file_after_applicant() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = ResumeViewer::new();
        assert!(matches!(
            viewer.download(dir.path()).await,
            Err(ResumeError::NothingOpen)
        ));

        let blob = ResumeBlob::from_payload(payload(200, PDF_BYTES)).unwrap();
        viewer.open(blob.clone(), Some("Jane Roe"));
        let path = viewer.download(dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("Jane Roe.pdf"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), PDF_BYTES);

        viewer.open(blob, None);
        let path = viewer.download(dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "resume.pdf");

        viewer.close();
        assert!(!viewer.is_open());
        assert_eq!(viewer.applicant_name(), "resume");
    }

    #[tokio::test]
    async fn test_preview_over_http() {
        let backend = MockBackend::spawn(
            Router::new()
                .route(
                    "/career/applications/1/resume",
                    get(|| async { ([("content-type", "application/pdf")], PDF_BYTES) }),
                )
                .route(
                    "/career/applications/2/resume",
                    get(|| async { (StatusCode::NOT_FOUND, "{\"message\":\"not found\"}") }),
                ),
        )
        .await;

        let client = backend.client(Some("t"));
        let mut viewer = ResumeViewer::new();

        viewer
            .preview(&client, &resume_endpoint(1), Some("Ann"))
            .await
            .unwrap();
        assert_eq!(viewer.blob().unwrap().len(), PDF_BYTES.len());

        viewer.close();
        let err = viewer
            .preview(&client, &resume_endpoint(2), Some("Bob"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResumeError::Status { status: 404 }));
        assert!(!viewer.is_open());
    }
}
