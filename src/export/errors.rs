use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No transactions to export")]
    NothingToExport,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error)
}
