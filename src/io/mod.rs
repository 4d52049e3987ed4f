pub mod export;
pub mod loader;

pub use export::{export_audit, export_workbook, ABOUT_SHEET_NAME, REPORT_FILE_NAME, XLSX_MIME};
pub use loader::load_table;
