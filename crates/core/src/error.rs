// Error types for the benchmark engine
//
// Only configuration and argument problems are errors. Endpoint faults are
// recorded inside ProbeResult and never surface here.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that abort a run before any request is dispatched
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The configuration table is malformed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A run parameter is out of range
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl HarnessError {
    /// Create an invalid argument error
    pub fn invalid(msg: impl Into<String>) -> Self {
        HarnessError::InvalidArgument(msg.into())
    }
}

pub(crate) fn ensure_prompt(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(HarnessError::invalid("prompt must not be empty"));
    }
    Ok(())
}

pub(crate) fn ensure_positive(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(HarnessError::invalid(format!("{name} must be at least 1")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_prompt_rejected() {
        assert!(ensure_prompt("   \n").is_err());
        assert!(ensure_prompt("hello").is_ok());
    }

    #[test]
    fn test_zero_count_rejected() {
        let err = ensure_positive("max_workers", 0).unwrap_err();
        assert_eq!(err.to_string(), "invalid argument: max_workers must be at least 1");
    }
}
