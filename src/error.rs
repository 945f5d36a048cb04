use thiserror::Error;

/// Application-wide error types
#[derive(Error, Debug)]
pub enum RescueError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Rescue key missing or mismatched")]
    Unauthenticated,

    #[error("Rename target does not exist")]
    NotFound,

    #[error("Rename destination already exists")]
    Conflict,

    #[error("Filesystem operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("State storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid plugin or theme name")]
    InvalidName,

    #[error("Secret must not be empty")]
    InvalidSecret,
}

impl RescueError {
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Short message shown to the operator via the one-shot `error` flash
    /// parameter. Kept terse so it survives a redirect query string.
    pub fn operator_message(&self) -> String {
        match self {
            Self::NotFound => "Target does not exist.".to_string(),
            Self::Conflict => "Destination already exists.".to_string(),
            Self::Io(_) => "Failed to rename. Check file permissions.".to_string(),
            Self::InvalidName => "Invalid plugin or theme name.".to_string(),
            Self::StorageUnavailable(_) => "State storage is unavailable.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias using RescueError
pub type RescueResult<T> = Result<T, RescueError>;

/// Convert RescueError to HTTP status codes for web responses
impl RescueError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidName => StatusCode::BAD_REQUEST,
            Self::InvalidSecret => StatusCode::BAD_REQUEST,
        }
    }
}

impl axum::response::IntoResponse for RescueError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16()
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_codes() {
        assert_eq!(RescueError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(RescueError::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            RescueError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RescueError::storage("down").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_operator_messages_are_short() {
        let io = RescueError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(
            io.operator_message(),
            "Failed to rename. Check file permissions."
        );
        assert_eq!(
            RescueError::Conflict.operator_message(),
            "Destination already exists."
        );
    }
}
