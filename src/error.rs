//! Error types for frame replay.
//!
//! All errors implement `std::error::Error` and carry enough context (role,
//! address, path) to tell the operator what to fix.
//!
//! ## Error Categories
//!
//! - **Connection Errors**: a role's listener refused the connection at session start
//! - **Disconnect Errors**: the peer went away while frames were streaming
//! - **File Errors**: an input file could not be read or produced no frames
//! - **Config Errors**: invalid or unparseable replay configuration
//!
//! User cancellation is not an error; it is reported as
//! [`SessionOutcome::StoppedByUser`](crate::SessionOutcome::StoppedByUser).
//!
//! ## Recovery
//!
//! ```rust
//! use odas_replay::{ReplayError, StreamRole};
//!
//! let io = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
//! let error = ReplayError::connection_refused(StreamRole::Potential, "localhost:9001", io);
//! assert!(!error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::types::StreamRole;

/// Result type alias for replay operations.
pub type Result<T, E = ReplayError> = std::result::Result<T, E>;

/// Main error type for replay operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReplayError {
    #[error("Could not connect to {role} server at {addr}")]
    ConnectionRefused {
        role: StreamRole,
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{role} server disconnected")]
    Disconnected {
        role: StreamRole,
        #[source]
        source: std::io::Error,
    },

    #[error("{role} link is not connected")]
    NotConnected { role: StreamRole },

    #[error("Frame file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No {role} frames found in {path}")]
    EmptySequence { role: StreamRole, path: PathBuf },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Failed to parse config file {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

impl ReplayError {
    /// Returns whether a fresh session could succeed after this error.
    ///
    /// Only a mid-stream disconnect qualifies; a refused connection at
    /// session start is never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReplayError::Disconnected { .. } => true,
            ReplayError::ConnectionRefused { .. } => false,
            ReplayError::NotConnected { .. } => false,
            ReplayError::File { .. } => false,
            ReplayError::EmptySequence { .. } => false,
            ReplayError::Config { .. } => false,
            ReplayError::ConfigParse { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ReplayError::ConnectionRefused { .. } => vec![
                "Is the viz server running?",
                "Start it with:  cd viz && node server.js",
                "Check the --host value points at the machine running the server",
            ],
            ReplayError::Disconnected { .. } => vec![
                "Check the viz server logs for a crash",
                "Run with --loop to restart automatically",
            ],
            ReplayError::NotConnected { .. } => {
                vec!["Open the transport before sending frames"]
            }
            ReplayError::File { .. } => vec![
                "Check the file exists and is readable",
                "Generate the files first with odaslive",
            ],
            ReplayError::EmptySequence { .. } => vec![
                "Check odaslive wrote JSON output for this stream",
                "Verify the sink format in the odaslive config is json",
            ],
            ReplayError::Config { .. } => vec![
                "Check hop size and sample rate are positive",
                "Use distinct ports for the tracking and potential servers",
            ],
            ReplayError::ConfigParse { .. } => {
                vec!["Check the config file is valid YAML", "Remove unknown keys"]
            }
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReplayError::File { path: path.into(), source }
    }

    /// Helper constructor for refused connections.
    pub fn connection_refused(
        role: StreamRole,
        addr: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ReplayError::ConnectionRefused { role, addr: addr.into(), source }
    }

    /// Helper constructor for mid-stream disconnects.
    pub fn disconnected(role: StreamRole, source: std::io::Error) -> Self {
        ReplayError::Disconnected { role, source }
    }

    /// Helper constructor for configuration errors.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        ReplayError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for ReplayError {
    fn from(err: std::io::Error) -> Self {
        ReplayError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn messages_carry_their_context(
            addr in "[a-z]{1,12}:[0-9]{2,5}",
            reason in ".*",
            path in "[a-z/]{1,20}"
          ) {
            let refused = ReplayError::connection_refused(
              StreamRole::Tracking,
              addr.clone(),
              std::io::Error::from(ErrorKind::ConnectionRefused),
            );
            prop_assert!(refused.to_string().contains(&addr));
            prop_assert!(refused.to_string().contains("tracking"));

            let config = ReplayError::invalid_config(reason.clone());
            prop_assert!(config.to_string().contains(&reason));

            let empty = ReplayError::EmptySequence {
              role: StreamRole::Potential,
              path: PathBuf::from(&path),
            };
            prop_assert!(empty.to_string().contains(&path));
          }
        }
    }

    #[test]
    fn only_disconnects_are_retryable() {
        let refused = ReplayError::connection_refused(
            StreamRole::Potential,
            "localhost:9001",
            std::io::Error::from(ErrorKind::ConnectionRefused),
        );
        let dropped = ReplayError::disconnected(
            StreamRole::Tracking,
            std::io::Error::from(ErrorKind::BrokenPipe),
        );

        assert!(!refused.is_retryable());
        assert!(dropped.is_retryable());
        assert!(!ReplayError::invalid_config("zero hop").is_retryable());
    }

    #[test]
    fn refused_connection_points_at_viz_server() {
        let refused = ReplayError::connection_refused(
            StreamRole::Potential,
            "localhost:9001",
            std::io::Error::from(ErrorKind::ConnectionRefused),
        );
        let suggestions = refused.recovery_suggestions();
        assert!(suggestions.iter().any(|s| s.contains("node server.js")));
    }

    #[test]
    fn source_chain_preserves_io_error() {
        let dropped = ReplayError::disconnected(
            StreamRole::Tracking,
            std::io::Error::new(ErrorKind::ConnectionReset, "peer reset"),
        );
        let source = std::error::Error::source(&dropped).expect("io source");
        assert_eq!(source.to_string(), "peer reset");
    }

    #[test]
    fn io_errors_convert_to_file_errors() {
        let err: ReplayError = std::io::Error::new(ErrorKind::NotFound, "missing").into();
        match err {
            ReplayError::File { path, source } => {
                assert_eq!(path, PathBuf::from("<unknown>"));
                assert_eq!(source.to_string(), "missing");
            }
            other => panic!("Expected File error, got {other:?}"),
        }
    }

    #[test]
    fn error_is_send_sync_static() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<ReplayError>();
    }
}
