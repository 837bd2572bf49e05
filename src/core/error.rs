use thiserror::Error;

#[derive(Error, Debug)]
pub enum PurgeError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Delete failed in '{table}' during {step}: {reason}")]
    DeleteFailed {
        table: String,
        step: String,
        reason: String,
    },

    #[error("Iteration guard tripped: {0}")]
    IterationGuard(String),

    #[error("Run cancelled")]
    Cancelled,
}

impl PurgeError {
    /// Stable short code handed to the error-logging sink.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => "INVALID_PARAMETER",
            Self::TableExists(_) => "TABLE_EXISTS",
            Self::TableNotFound(_) => "TABLE_NOT_FOUND",
            Self::ColumnNotFound(_, _) => "COLUMN_NOT_FOUND",
            Self::TypeMismatch(_) => "TYPE_MISMATCH",
            Self::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            Self::DeleteFailed { .. } => "DELETE_FAILED",
            Self::IterationGuard(_) => "ITERATION_GUARD",
            Self::Cancelled => "CANCELLED",
        }
    }
}

pub type Result<T> = std::result::Result<T, PurgeError>;
