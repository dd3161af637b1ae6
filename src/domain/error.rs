use thiserror::Error;

/// A broken invariant in user-supplied data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// The message shown next to a form field.
    pub fn field_message(&self) -> String {
        match self {
            Self::Validation { message } => message.clone(),
        }
    }
}
