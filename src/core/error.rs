use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown fund id '{0}'")]
    UnknownFund(String),
    #[error("selection is full: at most {limit} funds can be selected")]
    SelectionFull { limit: usize },
    #[error("selection needs at least {min} funds")]
    SelectionTooSmall { min: usize },
    #[error("insufficient NAV history for the selected duration")]
    InsufficientHistory,
    #[error("fund catalog is empty")]
    EmptyCatalog,
    #[error("failed to read fund catalog: {0}")]
    CatalogIo(#[from] std::io::Error),
    #[error("invalid fund catalog JSON: {0}")]
    CatalogFormat(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
