pub mod handlers;

pub use handlers::{audit_report, audit_summary, health_check, ApiError, UPLOAD_FIELD};

use crate::service::InvoiceAuditor;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

pub fn router(auditor: Arc<InvoiceAuditor>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/audit/report", post(audit_report))
        .route("/api/audit/summary", post(audit_summary))
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(max_upload_bytes)))
        .with_state(auditor)
}
