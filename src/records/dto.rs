use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::query::{SortDir, SortField};
use super::repo_types::RecordStatus;

#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub value: f64,
    #[serde(default = "default_status")]
    pub status: RecordStatus,
}

fn default_status() -> RecordStatus {
    RecordStatus::Active
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateRecordRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub value: Option<f64>,
    pub status: Option<RecordStatus>,
}

/// Query string for record listing: filters plus optional sort.
/// `from`/`to` are RFC 3339 timestamps, inclusive on `created_at`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub status: Option<RecordStatus>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortField>,
    #[serde(default = "default_dir")]
    pub dir: SortDir,
}

fn default_dir() -> SortDir {
    SortDir::Asc
}

#[derive(Debug, Deserialize, Default)]
pub struct ExportQuery {
    /// Admins may export every user's records.
    #[serde(default)]
    pub all: bool,
}

/// Flat row shape moved by export/import. The spreadsheet codec itself
/// lives outside this service.
#[derive(Debug, Serialize)]
pub struct ExportRow {
    pub title: String,
    pub description: String,
    pub category: String,
    pub value: f64,
    pub status: RecordStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ImportRow {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub value: f64,
    #[serde(default = "default_status")]
    pub status: RecordStatus,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub imported: usize,
}
