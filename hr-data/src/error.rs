/// Errors from the HR/PostgreSQL data layer, grounded on `r2e_data::DataError`'s
/// three-variant shape (a dedicated `NotFound` so callers don't have to sniff
/// database error text, an opaque wrapped driver error, and a catch-all).
#[derive(Debug)]
pub enum DataError {
    NotFound(String),
    Database(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl DataError {
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NotFound(msg) => write!(f, "not found: {msg}"),
            DataError::Database(err) => write!(f, "database error: {err}"),
            DataError::Other(msg) => write!(f, "data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Due to Rust's orphan rules this crate can't impl `From<sqlx::Error> for
/// DataError` at the `sqlx` side, so it's an extension trait instead —
/// matches `r2e_data_sqlx::SqlxErrorExt`.
pub trait SqlxErrorExt {
    fn into_data_error(self) -> DataError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_data_error(self) -> DataError {
        match &self {
            sqlx::Error::RowNotFound => DataError::NotFound("row not found".to_string()),
            _ => DataError::database(self),
        }
    }
}

pub type DataResult<T> = Result<T, DataError>;
