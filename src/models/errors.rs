use thiserror::Error;

/// Service-level errors that can occur in business logic
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("dish not found")]
    DishNotFound { id: i64 },

    #[error("order not found")]
    OrderNotFound { id: i64 },

    #[error("invalid status")]
    InvalidStatus { status: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },

    #[error("failed to fetch dish details: {source}")]
    MenuService {
        #[from]
        source: MenuClientError,
    },
}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database connection failed")]
    ConnectionFailed,

    #[error("Item not found")]
    NotFound,

    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("Invalid stored data: {message}")]
    InvalidData { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Timeout occurred during operation")]
    Timeout,
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::PoolTimedOut => RepositoryError::Timeout,
            sqlx::Error::Io(_) | sqlx::Error::PoolClosed => RepositoryError::ConnectionFailed,
            sqlx::Error::Database(db_err) => match db_err.kind() {
                sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => RepositoryError::ConstraintViolation {
                    message: db_err.message().to_string(),
                },
                _ => RepositoryError::Database {
                    message: db_err.message().to_string(),
                },
            },
            other => RepositoryError::Database {
                message: other.to_string(),
            },
        }
    }
}

impl From<sqlx::migrate::MigrateError> for RepositoryError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        RepositoryError::Migration {
            message: err.to_string(),
        }
    }
}

/// Failures of the downstream call to the menu service.
///
/// Each variant keeps enough context for the caller to decide whether the
/// request could be retried.
#[derive(Debug, Error)]
pub enum MenuClientError {
    #[error("connection to menu service failed: {message}")]
    Connection { message: String },

    #[error("menu service did not respond within {timeout_ms}ms")]
    Timeout { timeout_ms: u128 },

    #[error("menu service returned status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("could not decode field `{field}` from menu response: {reason}")]
    Decode { field: String, reason: String },
}

impl MenuClientError {
    /// Connection failures, timeouts and 5xx responses may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            MenuClientError::Connection { .. } | MenuClientError::Timeout { .. } => true,
            MenuClientError::UnexpectedStatus { status } => *status >= 500,
            MenuClientError::Decode { .. } => false,
        }
    }
}

/// Validation errors for input data
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredField { field: String },

    #[error("Invalid field value: {field}={value}, reason={reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Field too long: {field}, max_length={max_length}, actual_length={actual_length}")]
    TooLong {
        field: String,
        max_length: usize,
        actual_length: usize,
    },

    #[error("Value out of range: {field}, min={min}, max={max}, value={value}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
        value: String,
    },
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::ValidationError {
            message: err.to_string(),
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
