use crate::error::{ExportError, LoadError};
use crate::io::{export_audit, load_table, REPORT_FILE_NAME, XLSX_MIME};
use crate::models::{AnalysisKind, AuditReport, InvoiceTable, StatusLevel};
use crate::service::InvoiceAuditor;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Json, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Upload error: {0}")]
    Upload(#[from] MultipartError),

    #[error("Multipart field 'file' not found")]
    MissingFile,

    #[error("Could not read file: {0}")]
    Load(#[from] LoadError),

    #[error("Report generation failed: {0}")]
    Export(#[from] ExportError),

    #[error("Audit task failed: {0}")]
    Task(#[from] JoinError),
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Upload(_) | ApiError::MissingFile | ApiError::Load(_) => StatusCode::BAD_REQUEST,
            ApiError::Export(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!("Request failed ({}): {}", status, self);
        let response = ErrorResponse {
            success: false,
            message: self.to_string(),
        };
        (status, Json(response)).into_response()
    }
}

/// Per-analysis block of the summary response.
#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
    pub kind: AnalysisKind,
    pub sheet: &'static str,
    pub title: &'static str,
    pub level: StatusLevel,
    pub message: String,
    pub row_count: usize,
    pub preview: InvoiceTable,
}

/// 审计摘要响应体
#[derive(Debug, Serialize)]
pub struct AuditSummaryResponse {
    pub success: bool,
    pub message: String,
    pub file_name: String,
    pub generated_at: DateTime<Utc>,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub head: InvoiceTable,
    pub analyses: Vec<AnalysisSummary>,
}

struct Upload {
    file_name: String,
    bytes: Bytes,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        tracing::info!("Upload received: '{}' ({} bytes)", file_name, bytes.len());
        return Ok(Upload { file_name, bytes });
    }
    Err(ApiError::MissingFile)
}

/// Load + audit off the async workers; both are CPU-bound.
async fn run_audit(
    auditor: Arc<InvoiceAuditor>,
    upload: Upload,
) -> Result<(InvoiceTable, AuditReport), ApiError> {
    let max_rows = auditor.config().max_spreadsheet_rows;
    let result = tokio::task::spawn_blocking(move || {
        let table = load_table(&upload.file_name, &upload.bytes, max_rows)?;
        let report = auditor.audit(&table);
        Ok::<_, LoadError>((table, report))
    })
    .await??;
    Ok(result)
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// Runs the audit and returns the workbook as a download.
pub async fn audit_report(
    State(auditor): State<Arc<InvoiceAuditor>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;
    let (_, report) = run_audit(auditor, upload).await?;
    let bytes = tokio::task::spawn_blocking(move || export_audit(&report)).await??;

    let disposition = format!("attachment; filename=\"{}\"", REPORT_FILE_NAME);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_MIME),
            (header::CONTENT_DISPOSITION, disposition.as_str()),
        ],
        bytes,
    )
        .into_response())
}

/// Runs the audit and returns status messages and previews as JSON.
pub async fn audit_summary(
    State(auditor): State<Arc<InvoiceAuditor>>,
    multipart: Multipart,
) -> Result<Json<AuditSummaryResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    let file_name = upload.file_name.clone();
    let preview_rows = auditor.config().preview_rows;
    let (table, report) = run_audit(auditor, upload).await?;

    let analyses: Vec<AnalysisSummary> = report
        .analyses
        .iter()
        .map(|a| {
            let (level, message) = a.status();
            AnalysisSummary {
                kind: a.kind,
                sheet: a.kind.sheet_name(),
                title: a.kind.title(),
                level,
                message,
                row_count: a.row_count(),
                preview: a.preview(),
            }
        })
        .collect();

    let flagged: usize = analyses.iter().map(|a| a.row_count).sum();
    Ok(Json(AuditSummaryResponse {
        success: true,
        message: format!(
            "Audited {} rows, {} findings across {} analyses",
            table.len(),
            flagged,
            analyses.len()
        ),
        file_name,
        generated_at: Utc::now(),
        row_count: table.len(),
        columns: table.columns().to_vec(),
        head: table.head(preview_rows),
        analyses,
    }))
}
