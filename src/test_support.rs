// src/test_support.rs
//! Fakes and an in-process mock backend for unit tests

use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::applications::PageSource;
use crate::config::ApiConfig;
use crate::core::api_client::ApiClient;
use crate::core::error::ApiError;
use crate::resume::{ResumePayload, ResumeSource};
use crate::session::{Credentials, SessionToken};
use crate::types::{ApplicationRecord, JobRef, Page, RecordId};

pub const PDF_BYTES: &[u8] =
    b"%PDF-1.4\n1 0 obj << /Type /Pages /Count 1 >> endobj\n2 0 obj << /Type /Page >> endobj\n%%EOF\n";

/// Record named `Applicant <id>`; an empty title means none was sent
pub fn record(id: i64, job: Option<&str>, title: &str) -> ApplicationRecord {
    ApplicationRecord {
        id: RecordId::Number(id),
        full_name: Some(format!("Applicant {}", id)),
        email: None,
        phone_number: None,
        linkedin_url: None,
        portfolio_url: None,
        created_at: None,
        cover_letter: None,
        job: job.map(|code| JobRef {
            id: Some(RecordId::from(code)),
            job_title: (!title.is_empty()).then(|| title.to_string()),
            department: None,
        }),
    }
}

pub fn record_json(id: i64, name: &str, job: Option<&str>, title: &str) -> Value {
    json!({
        "id": id,
        "fullName": name,
        "email": format!("{}@example.com", id),
        "phoneNumber": "555-0100",
        "createdAt": "2024-05-01T09:30:00",
        "coverLetter": null,
        "job": job.map(|code| json!({ "id": code, "jobTitle": title })),
    })
}

pub fn page_json(content: Vec<Value>, total_pages: u32) -> Value {
    json!({ "data": { "content": content, "totalPages": total_pages } })
}

/// Backend served from a random local port, routes mounted under `/api`
pub struct MockBackend {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn spawn(routes: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let app = Router::new().nest("/api", routes);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            base_url: format!("http://{}/api", addr),
            handle,
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            ..ApiConfig::default()
        }
    }

    pub fn client(&self, token: Option<&str>) -> ApiClient {
        let credentials = match token.and_then(SessionToken::new) {
            Some(token) => Credentials::with_token(token),
            None => Credentials::anonymous(),
        };
        ApiClient::new(&self.api_config(), credentials).expect("client")
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Scripted listing: one entry per page, each with the total it reports
pub struct FakePages {
    pages: Vec<(Vec<ApplicationRecord>, u32)>,
    fail_at: Option<(u32, u16)>,
    delay: Option<Duration>,
    requests: Mutex<Vec<(u32, u32)>>,
}

impl FakePages {
    pub fn new(pages: Vec<(Vec<ApplicationRecord>, u32)>) -> Self {
        Self {
            pages,
            fail_at: None,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// `total` pages of `per_page` records, ids numbered across pages
    pub fn uniform(total: u32, per_page: u32) -> Self {
        let pages = (0..total)
            .map(|p| {
                let records = (0..per_page)
                    .map(|i| record(i64::from(p * per_page + i), Some("J1"), "Welder"))
                    .collect();
                (records, total)
            })
            .collect();
        Self::new(pages)
    }

    /// One record per page, each page reporting the given total
    pub fn with_totals(totals: &[u32], per_page: u32) -> Self {
        let pages = totals
            .iter()
            .enumerate()
            .map(|(p, total)| {
                let records = (0..per_page)
                    .map(|i| record(p as i64 * i64::from(per_page) + i64::from(i), Some("J1"), "Welder"))
                    .collect();
                (records, *total)
            })
            .collect();
        Self::new(pages)
    }

    pub fn failing_at(mut self, page: u32, status: u16) -> Self {
        self.fail_at = Some((page, status));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<(u32, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for FakePages {
    async fn fetch_page(&self, page: u32, size: u32) -> Result<Page<ApplicationRecord>, ApiError> {
        self.requests.lock().unwrap().push((page, size));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some((at, status)) = self.fail_at {
            if at == page {
                return Err(ApiError::Status {
                    status,
                    message: "scripted failure".to_string(),
                });
            }
        }

        match self.pages.get(page as usize) {
            Some((content, total)) => Ok(Page {
                index: page,
                content: content.clone(),
                total_pages: *total,
            }),
            None => Err(ApiError::Status {
                status: 404,
                message: format!("no page {}", page),
            }),
        }
    }
}

/// Resume source answering every path with the same payload
pub struct FakeResumes {
    payload: Option<ResumePayload>,
    requested: Mutex<Vec<String>>,
}

impl FakeResumes {
    pub fn serving(payload: ResumePayload) -> Self {
        Self {
            payload: Some(payload),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Every request fails with a 503
    pub fn failing() -> Self {
        Self {
            payload: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResumeSource for FakeResumes {
    async fn fetch_resume(&self, path: &str) -> Result<ResumePayload, ApiError> {
        self.requested.lock().unwrap().push(path.to_string());
        self.payload.clone().ok_or(ApiError::Status {
            status: 503,
            message: "unavailable".to_string(),
        })
    }
}
