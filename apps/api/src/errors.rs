use std::io;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

const MSG_TEMPLATE_NOT_FOUND: &str = "Template not found. Please check the template directory.";
const MSG_COMPILATION_FAILED: &str =
    "LaTeX compilation failed. Please check the LaTeX log for details.";
const MSG_FILE_NOT_FOUND: &str = "File not found. Please check the file path.";
const MSG_PERMISSION_DENIED: &str = "Permission denied. Please check file permissions.";
const MSG_DISK_FULL: &str = "Disk full. Please free up some disk space.";
const MSG_UNKNOWN: &str = "An unknown error occurred. Please try again.";

/// Application-level error type.
/// Every pipeline stage returns it; Axum handlers return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Template error: {0}")]
    Template(String),

    /// All violated constraints, in the order they were checked.
    #[error("Validation error: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Compilation error: {0}")]
    Compilation(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a validation failure with a single message.
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Template(_) => "TEMPLATE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Parse(_) => "PARSE_ERROR",
            AppError::Compilation(_) => "COMPILATION_ERROR",
            AppError::FileSystem(_) => "FILE_SYSTEM_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "UNKNOWN_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Parse(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Compilation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Template(_)
            | AppError::FileSystem(_)
            | AppError::Configuration(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to end users. Internal detail for file-system and
    /// unknown errors is logged here and never returned.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Template(msg) => {
                tracing::error!("Template error: {msg}");
                if msg.to_lowercase().contains("not found") {
                    MSG_TEMPLATE_NOT_FOUND.to_string()
                } else {
                    format!("Template error: {msg}")
                }
            }
            AppError::Validation(errors) => {
                tracing::warn!("Validation failed: {errors:?}");
                format!("Validation error: {}", errors.join(", "))
            }
            AppError::Parse(msg) => format!("Invalid input: {msg}"),
            AppError::Compilation(details) => {
                tracing::error!("Compilation error: {details}");
                if details.trim().is_empty() {
                    MSG_COMPILATION_FAILED.to_string()
                } else {
                    format!("LaTeX compilation failed:\n{details}")
                }
            }
            AppError::FileSystem(e) => {
                tracing::error!("File system error: {e}");
                file_system_message(e)
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                format!("Configuration error: {msg}")
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::Internal(e) => {
                tracing::error!("Unknown error: {e:?}");
                MSG_UNKNOWN.to_string()
            }
        }
    }
}

fn file_system_message(e: &io::Error) -> String {
    match e.kind() {
        io::ErrorKind::NotFound => MSG_FILE_NOT_FOUND.to_string(),
        io::ErrorKind::PermissionDenied => MSG_PERMISSION_DENIED.to_string(),
        _ if e.to_string().to_lowercase().contains("no space") => MSG_DISK_FULL.to_string(),
        _ => format!("File system error: {e}"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "success": false,
            "code": self.code(),
            "error": self.user_message(),
        });
        if let AppError::Validation(errors) = &self {
            body["errors"] = json!(errors);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_joins_all_errors() {
        let err = AppError::Validation(vec![
            "First Name is required".to_string(),
            "Invalid email format".to_string(),
        ]);
        assert_eq!(
            err.user_message(),
            "Validation error: First Name is required, Invalid email format"
        );
    }

    #[test]
    fn test_file_system_messages_hide_detail() {
        let missing = AppError::FileSystem(io::Error::new(io::ErrorKind::NotFound, "/secret/path"));
        assert_eq!(missing.user_message(), MSG_FILE_NOT_FOUND);

        let denied =
            AppError::FileSystem(io::Error::new(io::ErrorKind::PermissionDenied, "/etc/x"));
        assert_eq!(denied.user_message(), MSG_PERMISSION_DENIED);

        let full = AppError::FileSystem(io::Error::new(
            io::ErrorKind::Other,
            "No space left on device",
        ));
        assert_eq!(full.user_message(), MSG_DISK_FULL);
    }

    #[test]
    fn test_unknown_error_is_generic() {
        let err = AppError::Internal(anyhow::anyhow!("stack detail"));
        assert_eq!(err.user_message(), MSG_UNKNOWN);
        assert_eq!(err.code(), "UNKNOWN_ERROR");
    }

    #[test]
    fn test_template_not_found_maps_to_friendly_message() {
        let err = AppError::Template("resume.tex not found in ./build".to_string());
        assert_eq!(err.user_message(), MSG_TEMPLATE_NOT_FOUND);
    }

    #[test]
    fn test_empty_compilation_detail_uses_default_message() {
        assert_eq!(
            AppError::Compilation(String::new()).user_message(),
            MSG_COMPILATION_FAILED
        );
    }
}
