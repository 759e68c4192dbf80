use axum::extract::rejection::JsonRejection;
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrorsKind;

use crate::config::error::ConfigError;

/// Field-level validation failure reported by `ValidatedJson`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

/// Application-wide error type.
///
/// Handlers return `AppResult<T>`; the variants map onto HTTP status codes
/// in `api::middleware::error_handler`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Several validation errors collected by the validator crate
    #[error("Validation failed")]
    ValidationErrors { errors: Vec<ValidationFieldError> },

    /// Bad request error with descriptive message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Forbidden access error with authorization message
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            _ => "settings".to_string(),
        };
        AppError::Configuration {
            key,
            source: anyhow::Error::new(error),
        }
    }
}

fn collect_field_errors(
    errors: &validator::ValidationErrors,
    prefix: &str,
    out: &mut Vec<ValidationFieldError>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|e| ValidationFieldError {
                    field: path.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                }));
            }
            ValidationErrorsKind::Struct(nested) => collect_field_errors(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_field_errors(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut collected = Vec::new();
        collect_field_errors(&errors, "", &mut collected);
        collected.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::ValidationErrors { errors: collected }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "must not be empty"))]
        name: String,
        #[validate(range(min = 1))]
        count: u32,
    }

    #[test]
    fn test_validation_errors_are_collected_per_field() {
        let sample = Sample {
            name: String::new(),
            count: 0,
        };
        let error = AppError::from(sample.validate().unwrap_err());
        match error {
            AppError::ValidationErrors { errors } => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].field, "count");
                assert_eq!(errors[0].message, "range");
                assert_eq!(errors[1].field, "name");
                assert_eq!(errors[1].message, "must not be empty");
            }
            other => panic!("Expected ValidationErrors, got {:?}", other),
        }
    }

    #[derive(Validate)]
    struct Outer {
        #[validate(nested)]
        inner: Sample,
    }

    #[test]
    fn test_nested_errors_are_prefixed() {
        let outer = Outer {
            inner: Sample {
                name: "ok".to_string(),
                count: 0,
            },
        };
        match AppError::from(outer.validate().unwrap_err()) {
            AppError::ValidationErrors { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "inner.count");
            }
            other => panic!("Expected ValidationErrors, got {:?}", other),
        }
    }

    #[test]
    fn test_config_error_keeps_field_as_key() {
        let error = AppError::from(ConfigError::validation("server.port", "bad"));
        match error {
            AppError::Configuration { key, .. } => assert_eq!(key, "server.port"),
            other => panic!("Expected Configuration, got {:?}", other),
        }
    }

    #[test]
    fn test_anyhow_becomes_internal() {
        let error = AppError::from(anyhow::anyhow!("boom"));
        assert!(matches!(error, AppError::Internal { .. }));
        assert_eq!(error.to_string(), "Internal error");
    }
}
