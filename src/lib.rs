pub mod api;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod service;

pub use config::{AnalysisConfig, AppConfig};
pub use error::{AnalysisError, ExportError, LoadError, ModelError};
pub use io::{export_audit, load_table};
pub use models::{AnalysisKind, AuditReport, InvoiceTable, Value};
pub use service::InvoiceAuditor;
