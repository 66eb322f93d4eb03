// src/utils.rs
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};

/// Placeholder shown for absent values
pub const NOT_AVAILABLE: &str = "N/A";

/// Normalize an applicant name for file system usage. Only characters that
/// would break a path are replaced; the name otherwise stays recognizable.
pub fn normalize_file_stem(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// `<name>.pdf`, or `resume.pdf` when no usable name was given
pub fn download_file_name(name: Option<&str>) -> String {
    let stem = name
        .map(normalize_file_stem)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "resume".to_string());
    format!("{}.pdf", stem)
}

/// Value or `N/A` for blank/absent fields
pub fn or_na(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(NOT_AVAILABLE)
}

/// Parse a backend timestamp: RFC 3339 with offset, or zone-less ISO taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Local-time rendering of a backend timestamp. Unparseable input is shown
/// as-is, absent input as `N/A`.
pub fn format_timestamp(raw: Option<&str>) -> String {
    match raw.filter(|r| !r.trim().is_empty()) {
        None => NOT_AVAILABLE.to_string(),
        Some(raw) => match parse_timestamp(raw) {
            Some(dt) => dt
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            None => raw.to_string(),
        },
    }
}

// File system utilities
pub async fn ensure_dir_exists(path: &Path) -> std::io::Result<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path).await
}

/// Write through a temporary sibling file and rename it into place. The
/// temporary file never outlives the call.
pub async fn write_file_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir_exists(parent).await?;
    }

    let tmp = temporary_sibling(path);
    if let Err(e) = tokio::fs::write(&tmp, content).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }

    Ok(())
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    path.with_file_name(format!(".{}.{}.part", file_name, std::process::id()))
}
