use crate::services::database::DatabaseError;
use crate::services::dataset::DatasetError;
use crate::services::generation::GenerationError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Missing columns in CSV: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("{0}")]
    Precondition(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    Generation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        AppError::Io(error.to_string())
    }
}

impl From<DatabaseError> for AppError {
    fn from(error: DatabaseError) -> Self {
        AppError::Database(error.to_string())
    }
}

impl From<DatasetError> for AppError {
    fn from(error: DatasetError) -> Self {
        match error {
            DatasetError::MissingColumns(columns) => AppError::MissingColumns(columns),
            DatasetError::DatabaseError(msg) => AppError::Database(msg),
            other => AppError::Io(other.to_string()),
        }
    }
}

impl From<GenerationError> for AppError {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::RateLimited { .. } => AppError::RateLimited(error.to_string()),
            other => AppError::Generation(other.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
