use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single violated field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every failure the task store and identity gate can report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}", join_messages(.0))]
    Validation(Vec<FieldError>),

    #[error("User with this {field} already exists")]
    DuplicateIdentity { field: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("Task not found or unauthorized")]
    NotFoundOrUnauthorized,

    #[error("Invalid task ID format")]
    InvalidIdentifier,

    #[error("internal failure: {0}")]
    Internal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                // sqlite reports "UNIQUE constraint failed: users.email"
                let field = db_error
                    .message()
                    .rsplit('.')
                    .next()
                    .unwrap_or("identity")
                    .trim()
                    .to_string();
                return Self::DuplicateIdentity { field };
            }
        }
        Self::Internal(error.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        Self::Internal(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_field() {
        let error = Error::Validation(vec![
            FieldError::new("title", "Title is required"),
            FieldError::new("estimatedHours", "Estimated hours are required"),
        ]);
        assert_eq!(
            error.to_string(),
            "Title is required, Estimated hours are required"
        );
    }

    #[test]
    fn duplicate_identity_names_the_field() {
        let error = Error::DuplicateIdentity {
            field: "email".into(),
        };
        assert_eq!(error.to_string(), "User with this email already exists");
    }
}
