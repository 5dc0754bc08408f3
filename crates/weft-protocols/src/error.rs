//! Capability invocation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Capability invocation failed: {0}")]
    InvocationFailed(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Capability invocation was aborted")]
    Aborted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_failed_display() {
        let err = CapabilityError::InvocationFailed("connection refused".to_string());
        assert!(err.to_string().contains("invocation failed"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_invalid_parameters_display() {
        let err = CapabilityError::InvalidParameters("missing field 'to'".to_string());
        assert!(err.to_string().contains("Invalid parameters"));
    }

    #[test]
    fn test_aborted_display() {
        let err = CapabilityError::Aborted;
        assert!(err.to_string().contains("aborted"));
    }

    #[test]
    fn test_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CapabilityError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }
}
