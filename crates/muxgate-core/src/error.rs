// ABOUTME: Error types for the decision engine using thiserror.
// ABOUTME: Authentication rejection is the only failure the core itself produces.

use thiserror::Error;

/// Errors produced by the decision engine.
///
/// The engine never terminates the process: a denied connection is reported
/// to the SSH collaborator, which closes the connection and moves on.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The presented key matched no identity and no default hosts exist.
    #[error("access denied")]
    AccessDenied,
}

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_display() {
        let err = CoreError::AccessDenied;
        assert_eq!(format!("{}", err), "access denied");
    }

    #[test]
    fn test_error_debug() {
        let err = CoreError::AccessDenied;
        assert!(format!("{:?}", err).contains("AccessDenied"));
    }
}
