pub mod result;
pub mod table;
pub mod value;

pub use result::{AnalysisKind, AnalysisOutcome, AnalysisReport, AuditReport, StatusLevel};
pub use table::InvoiceTable;
pub use value::{cmp_missing_last, CellKey, Numeric, Value};
