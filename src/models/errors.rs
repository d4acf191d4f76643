use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error categories exposed at the DAO boundary.
///
/// Every failure a caller can observe collapses into one of these three
/// codes; a thin transport layer maps them onto protocol status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Store unreachable, or any failure not covered by a business rule.
    #[serde(rename = "DB")]
    Db,
    /// The requested key is absent.
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// The request would violate a business rule (negative quantity).
    #[serde(rename = "BAD_REQUEST")]
    BadRequest,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Db => write!(f, "DB"),
            ErrorCode::NotFound => write!(f, "NOT_FOUND"),
            ErrorCode::BadRequest => write!(f, "BAD_REQUEST"),
        }
    }
}

/// A single coded failure entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppError {
    pub message: String,
    pub code: ErrorCode,
}

impl AppError {
    pub fn new(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Error carrier returned by every fallible DAO operation.
///
/// Holds one or more `{message, code}` entries; serializes as
/// `{"errors": [...]}` so callers see the same shape regardless of where
/// the failure originated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Errors {
    pub errors: Vec<AppError>,
}

impl Errors {
    pub fn new(error: AppError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn single(message: impl Into<String>, code: ErrorCode) -> Self {
        Self::new(AppError::new(message, code))
    }

    /// The code of the first entry.  The constructors always produce at
    /// least one; an externally built empty carrier reads as [`ErrorCode::Db`].
    pub fn code(&self) -> ErrorCode {
        self.errors.first().map(|e| e.code).unwrap_or(ErrorCode::Db)
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("cannot connect to storage at \"{url}\": {message}")]
    ConnectionFailed { url: String, message: String },

    #[error("storage driver error: {message}")]
    Driver { message: String },

    #[error("invalid stored document: {message}")]
    InvalidDocument { message: String },

    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl From<mongodb::error::Error> for RepositoryError {
    fn from(error: mongodb::error::Error) -> Self {
        RepositoryError::Driver {
            message: error.to_string(),
        }
    }
}

/// Service-level errors covering the business rules of the order and
/// eatery operations.  `code()` is the single place deciding which public
/// code each failure maps to.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("cannot find eatery \"{id}\"")]
    EateryNotFound { id: String },

    #[error("cannot find order {id}")]
    OrderNotFound { id: String },

    #[error("cannot change item {item_id} in order {order_id} by {delta}: resulting quantity out of range")]
    NegativeQuantity {
        order_id: String,
        item_id: String,
        delta: i64,
    },

    #[error("cannot create order for invalid eatery reference \"{id}\"")]
    InvalidEateryRef { id: String },

    #[error("storage error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::EateryNotFound { .. } | ServiceError::OrderNotFound { .. } => {
                ErrorCode::NotFound
            }
            ServiceError::NegativeQuantity { .. } => ErrorCode::BadRequest,
            ServiceError::InvalidEateryRef { .. } | ServiceError::Repository { .. } => ErrorCode::Db,
        }
    }
}

impl From<ServiceError> for Errors {
    fn from(error: ServiceError) -> Self {
        let code = error.code();
        Errors::single(error.to_string(), code)
    }
}

impl From<RepositoryError> for Errors {
    fn from(error: RepositoryError) -> Self {
        Errors::single(error.to_string(), ErrorCode::Db)
    }
}

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for DAO boundary operations
pub type DaoResult<T> = Result<T, Errors>;
