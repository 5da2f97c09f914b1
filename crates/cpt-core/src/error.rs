//! Unified error types for the cpt workspace
//!
//! [`CptError`] covers everything that can go wrong before an optimization
//! run starts: reading instance files, decoding them, and checking that every
//! index they reference actually exists. Algorithm-specific failures (engine
//! status, duality checks) live next to the algorithms in `cpt-algo`.
//!
//! # Example
//!
//! ```ignore
//! use cpt_core::{io::load_instance, CptResult};
//!
//! fn load(path: &str) -> CptResult<()> {
//!     let instance = load_instance(path)?;
//!     instance.validate()?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for instance handling.
#[derive(Error, Debug)]
pub enum CptError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// An index referenced by the instance has no matching entity, or a
    /// per-entity table has the wrong dimension.
    #[error("Data inconsistency: {0}")]
    DataInconsistency(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results using CptError.
pub type CptResult<T> = Result<T, CptError>;

impl From<serde_json::Error> for CptError {
    fn from(err: serde_json::Error) -> Self {
        CptError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for CptError {
    fn from(err: serde_yaml::Error) -> Self {
        CptError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CptError::DataInconsistency("arc 3 references router 9".into());
        assert!(err.to_string().contains("Data inconsistency"));
        assert!(err.to_string().contains("router 9"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CptError = io_err.into();
        assert!(matches!(err, CptError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<f64>("not json").unwrap_err();
        let err: CptError = json_err.into();
        assert!(matches!(err, CptError::Parse(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> CptResult<()> {
            Err(CptError::DataInconsistency("test".into()))
        }

        fn outer() -> CptResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
