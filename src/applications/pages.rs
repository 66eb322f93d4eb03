// src/applications/pages.rs
//! The application listing as a lazy stream of pages

use async_trait::async_trait;
use futures::stream::{self, Stream};
use tracing::{trace, warn};

use crate::core::error::ApiError;
use crate::types::{ApplicationRecord, Page};

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, page: u32, size: u32) -> Result<Page<ApplicationRecord>, ApiError>;
}

#[async_trait]
impl<S: PageSource + ?Sized> PageSource for &S {
    async fn fetch_page(&self, page: u32, size: u32) -> Result<Page<ApplicationRecord>, ApiError> {
        (**self).fetch_page(page, size).await
    }
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    next: u32,
    total: u32,
}

/// Pages `0..total_pages` in order, each requested only after the previous
/// one resolved. `total_pages` is re-read from every response; a total that
/// shrinks mid-fetch is logged, not reconciled. Each call starts over at
/// page 0.
pub fn page_stream<'a, S>(
    source: &'a S,
    size: u32,
) -> impl Stream<Item = Result<Page<ApplicationRecord>, ApiError>> + 'a
where
    S: PageSource + ?Sized,
{
    stream::try_unfold(Cursor { next: 0, total: 1 }, move |cursor| async move {
        if cursor.next >= cursor.total {
            return Ok(None);
        }

        let page = source.fetch_page(cursor.next, size).await?;

        if cursor.next > 0 && page.total_pages != cursor.total {
            warn!(
                "Reported page count changed from {} to {} at page {}",
                cursor.total, page.total_pages, cursor.next
            );
        }
        trace!("Page {}/{} received", cursor.next + 1, page.total_pages);

        let next = Cursor {
            next: cursor.next + 1,
            total: page.total_pages,
        };
        Ok(Some((page, next)))
    })
}
