use crate::model::{ModelError, ValidationError};
use http::StatusCode;
use store::StoreError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("hyper error: {0}")]
    Hyper(#[from] hyper::Error),
}

/// Failures of a single method call. Each maps to one response status.
#[derive(thiserror::Error, Debug)]
pub enum MethodError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("wrong credentials")]
    Forbidden,

    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ModelError> for MethodError {
    fn from(err: ModelError) -> Self {
        MethodError::InvalidRequest(err.to_string())
    }
}

impl MethodError {
    pub fn status(&self) -> StatusCode {
        match self {
            MethodError::InvalidRequest(_) | MethodError::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            MethodError::Forbidden => StatusCode::FORBIDDEN,
            MethodError::Store(_) | MethodError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text sent to the client. Server-side failures are not described.
    pub fn public_message(&self) -> String {
        match self {
            MethodError::Store(_) | MethodError::Internal(_) => {
                self.status().canonical_reason().unwrap_or("").to_string()
            }
            other => other.to_string(),
        }
    }
}
