use std::io;

use thiserror::Error;

use crate::core::version::ServerVersion;

/// Result type alias for tandem operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the server.
///
/// A nil reply is never an error: commands whose reply may be nil return
/// `Option<T>` instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An IO error occurred.
    #[error("IO error: {source}")]
    Io {
        /// The underlying IO error.
        #[from]
        source: io::Error,
    },

    /// The reply was malformed or had an unexpected shape.
    #[error("protocol error: {message}")]
    Protocol {
        /// Description of the error.
        message: String,
    },

    /// The server returned an error reply.
    #[error("server error: {message}")]
    Server {
        /// Error message from server.
        message: String,
    },

    /// Authentication failed while dialing a connection.
    #[error("authentication failed")]
    Auth,

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of invalid argument.
        message: String,
    },

    /// A read, write, dial or pool checkout deadline elapsed.
    #[error("operation timed out")]
    Timeout,

    /// The pooling layer failed for a reason other than a connection error.
    #[error("pool error: {message}")]
    Pool {
        /// Description of the failure.
        message: String,
    },

    /// The master runs a server version older than the command requires.
    #[error("{command} requires server version {required}, master runs {actual}")]
    NotSupported {
        /// Command name.
        command: &'static str,
        /// Minimum server version for the command.
        required: ServerVersion,
        /// Version reported by the master.
        actual: ServerVersion,
    },
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Error::Protocol {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let error = Error::Io { source: io_err };
        assert!(error.to_string().contains("IO error"));
    }

    #[test]
    fn test_error_display_protocol() {
        let error = Error::protocol("invalid frame");
        assert_eq!(error.to_string(), "protocol error: invalid frame");
    }

    #[test]
    fn test_error_display_server() {
        let error = Error::Server {
            message: "ERR wrong type".to_string(),
        };
        assert_eq!(error.to_string(), "server error: ERR wrong type");
    }

    #[test]
    fn test_error_display_auth() {
        assert_eq!(Error::Auth.to_string(), "authentication failed");
    }

    #[test]
    fn test_error_display_invalid_argument() {
        let error = Error::invalid("missing required field");
        assert_eq!(
            error.to_string(),
            "invalid argument: missing required field"
        );
    }

    #[test]
    fn test_error_display_not_supported() {
        let error = Error::NotSupported {
            command: "UNLINK",
            required: ServerVersion::new(4, 0, 0),
            actual: ServerVersion::new(3, 2, 1),
        };
        assert_eq!(
            error.to_string(),
            "UNLINK requires server version 4.0.0, master runs 3.2.1"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::Other, "test");
        let error: Error = io_err.into();
        assert!(matches!(error, Error::Io { .. }));
    }
}
