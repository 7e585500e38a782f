use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column is not sortable: {0}")]
    ColumnNotSortable(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Role '{role}' may not open the {report} report")]
    AccessDenied { role: String, report: String },
}

pub type Result<T> = std::result::Result<T, ReportError>;
