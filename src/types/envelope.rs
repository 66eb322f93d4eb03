use serde::{Deserialize, Serialize};

// ===== Listing Response Types =====

/// Outer wrapper of every paginated listing: `{ "data": { ... } }`
#[derive(Debug, Serialize, Deserialize)]
pub struct PageEnvelope<T> {
    #[serde(default = "Option::default")]
    pub data: Option<PageData<T>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData<T> {
    /// Absent and `null` both mean an empty page
    #[serde(default = "Option::default")]
    pub content: Option<Vec<T>>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// One fetched page, normalized
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub index: u32,
    pub content: Vec<T>,
    pub total_pages: u32,
}

impl<T> PageEnvelope<T> {
    /// A missing body is an empty page; a missing or zero total counts as one
    /// page, the one just fetched.
    pub fn into_page(self, index: u32) -> Page<T> {
        let (content, total_pages) = match self.data {
            Some(data) => (data.content.unwrap_or_default(), data.total_pages.unwrap_or(0)),
            None => (Vec::new(), 0),
        };

        Page {
            index,
            content,
            total_pages: total_pages.max(1),
        }
    }
}
