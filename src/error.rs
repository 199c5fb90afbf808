use thiserror::Error;

pub type SheetResult<T> = Result<T, SheetError>;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("sheet not found: {0}")]
    MissingSheet(String),

    #[error("schema error: {0}")]
    Schema(String),
}
