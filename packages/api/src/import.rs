//! Bulk import endpoints for companies, positions, and candidates.
//!
//! Imports are all-or-nothing per row, not per batch: the server reports
//! how many rows landed and which ones failed, and the client renders
//! that report as-is.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ApiError;

/// Per-row failure inside an import batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportRowError {
    /// 1-based row number in the uploaded batch.
    pub row: u32,
    pub message: String,
}

/// Outcome of one bulk-import call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportReport {
    pub success_count: u32,
    pub error_count: u32,
    pub errors: Vec<ImportRowError>,
    pub imported_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionRecord {
    pub title: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl ApiClient {
    pub async fn import_companies(
        &self,
        records: &[CompanyRecord],
    ) -> Result<ImportReport, ApiError> {
        self.post_json("/import/companies", &records).await
    }

    pub async fn import_positions(
        &self,
        records: &[PositionRecord],
    ) -> Result<ImportReport, ApiError> {
        self.post_json("/import/positions", &records).await
    }

    pub async fn import_candidates(
        &self,
        records: &[CandidateRecord],
    ) -> Result<ImportReport, ApiError> {
        self.post_json("/import/candidates", &records).await
    }
}
