use thiserror::Error;

/// Fatal failures while turning an upload into a table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet parse error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Workbook contains no worksheet")]
    NoWorksheet,

    #[error("No columns to parse from file")]
    EmptyInput,

    #[error("Error tokenizing data: expected {expected} fields in line {line}, saw {found}")]
    RecordTooLong {
        line: u64,
        expected: usize,
        found: usize,
    },
}

/// Failures of the outlier model itself.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Found array with 0 sample(s)")]
    EmptyInput,

    #[error("Input rows have inconsistent feature counts ({expected} vs {found})")]
    RaggedInput { expected: usize, found: usize },

    #[error("Input contains NaN or infinity at sample {sample}")]
    NonFinite { sample: usize },

    #[error("contamination must be in (0, 0.5], got {0}")]
    InvalidContamination(f64),
}

/// Failures scoped to a single analysis. They are reported next to that analysis
/// and never abort the rest of the audit.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("column '{column}' has non-numeric value '{value}' at row {row}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("column '{column}' has a missing value at row {row}")]
    MissingValue { column: String, row: usize },

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Workbook write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
