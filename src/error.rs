use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Storage-engine error taxonomy.
///
/// Validation errors are raised before any I/O and leave no side effects.
/// Database errors are infrastructure failures propagated verbatim; retry
/// policy belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Caller-supplied parameters failed validation.
    #[error("validation error: {0}")]
    Validation(String),
    /// Backing-store connectivity, DDL or DML failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// JSON (de)serialization of a stored column failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A stored value could not be interpreted.
    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}

impl StoreError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Database(_) => "database_error",
            Self::Serialization(_) => "serialization_error",
            Self::Corrupt(_) => "corrupt_data",
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Serialization(_) | Self::Corrupt(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": self.kind(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = StoreError::Validation("retention time must be non-negative".to_string());
        assert_eq!(
            error.to_string(),
            "validation error: retention time must be non-negative"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(StoreError::Validation(String::new()).kind(), "validation_error");
        assert_eq!(StoreError::Corrupt(String::new()).kind(), "corrupt_data");
    }

    #[test]
    fn test_sqlx_error_converts_to_database() {
        let error: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, StoreError::Database(_)));
    }
}
