// src/applications/aggregator.rs
use futures::TryStreamExt;
use tracing::{error, info};

use super::grouping::JobGrouping;
use super::pages::{page_stream, PageSource};
use crate::core::error::ApiError;
use crate::types::ApplicationRecord;

/// Message shown when the listing could not be loaded
pub const LOAD_FAILURE_MESSAGE: &str = "Failed to load applications";

/// Load state of the application listing. `Failed` is terminal for the view:
/// nothing partial is kept and nothing is retried.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationState {
    Loading,
    Ready(JobGrouping),
    Failed(String),
}

impl AggregationState {
    pub fn grouping(&self) -> Option<&JobGrouping> {
        match self {
            AggregationState::Ready(grouping) => Some(grouping),
            _ => None,
        }
    }

    /// Applicants currently displayable
    pub fn displayed_applicants(&self) -> usize {
        self.grouping().map_or(0, JobGrouping::total_applicants)
    }
}

pub struct Aggregator<S> {
    source: S,
    page_size: u32,
}

impl<S: PageSource> Aggregator<S> {
    pub fn new(source: S, page_size: u32) -> Self {
        Self { source, page_size }
    }

    /// Every record of the listing, in server page order. The first failing
    /// page aborts the whole fetch.
    pub async fn collect_all(&self) -> Result<Vec<ApplicationRecord>, ApiError> {
        page_stream(&self.source, self.page_size)
            .try_fold(Vec::new(), |mut all, page| async move {
                all.extend(page.content);
                Ok(all)
            })
            .await
    }

    /// Full fetch and rebuild of the grouping
    pub async fn fetch_grouping(&self) -> Result<JobGrouping, ApiError> {
        let records = self.collect_all().await?;
        let grouping = JobGrouping::from_records(records);

        info!(
            "Loaded {} applications across {} jobs",
            grouping.total_applicants(),
            grouping.groups().len()
        );
        Ok(grouping)
    }

    pub async fn load(&self) -> AggregationState {
        match self.fetch_grouping().await {
            Ok(grouping) => AggregationState::Ready(grouping),
            Err(e) => {
                error!("Failed to load applications: {}", e);
                AggregationState::Failed(LOAD_FAILURE_MESSAGE.to_string())
            }
        }
    }
}
