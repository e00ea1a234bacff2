//! Error types for rover_navigation

use thiserror::Error;

/// Main error type for the navigation controller
#[derive(Error, Debug)]
pub enum NavError {
    /// Heading alignment did not reach the threshold in time
    #[error("Heading alignment diverged after {iterations} iterations (residual {residual:.3} rad)")]
    AlignmentDiverged { iterations: usize, residual: f64 },

    /// Travel phase ran out of cycles before reaching the goal
    #[error("Goal not reached within {cycles} cycles")]
    CycleLimitExceeded { cycles: usize },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Signal handler could not be installed
    #[error("Signal error: {0}")]
    Signal(String),

    /// Plot could not be rendered or saved
    #[error("Visualization error: {0}")]
    Visualization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

impl From<ctrlc::Error> for NavError {
    fn from(e: ctrlc::Error) -> Self {
        NavError::Signal(e.to_string())
    }
}

/// Result type alias for navigation operations
pub type NavResult<T> = Result<T, NavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NavError::CycleLimitExceeded { cycles: 10 };
        assert_eq!(format!("{}", err), "Goal not reached within 10 cycles");
    }

    #[test]
    fn test_alignment_error_display() {
        let err = NavError::AlignmentDiverged { iterations: 5, residual: 1.0 };
        assert_eq!(
            format!("{}", err),
            "Heading alignment diverged after 5 iterations (residual 1.000 rad)"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NavError = io_err.into();
        assert!(matches!(err, NavError::Io(_)));
    }

    #[test]
    fn test_error_from_toml() {
        let toml_err = toml::from_str::<toml::Table>("not = [valid").unwrap_err();
        let err: NavError = toml_err.into();
        assert!(matches!(err, NavError::Config(_)));
    }
}
