// Error types for reply conversion

use thiserror::Error;

/// Main error type for reading, writing and rendering device replies
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Rendering failure: {0}")]
    RenderingFailure(#[from] std::fmt::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using ConvertError
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    pub(crate) fn malformed(context: &str, err: impl std::fmt::Display) -> Self {
        ConvertError::MalformedInput(format!("{}: {}", context, err))
    }

    /// Convert error to user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            ConvertError::MalformedInput(_) => {
                "The reply could not be read. Check that the input format and family match the data.".to_string()
            }
            ConvertError::RenderingFailure(_) => {
                "The reply could not be rendered. This is a bug, please report it.".to_string()
            }
            ConvertError::Io(_) => {
                "Could not read the input or write the output. Check paths and permissions.".to_string()
            }
        }
    }

    /// Check if the failure was caused by the data handed in rather than the environment
    pub fn is_input_error(&self) -> bool {
        matches!(self, ConvertError::MalformedInput(_))
    }
}
