//! Error types for broker operations.
//!
//! Errors are categorized so callers can tell a broken session apart
//! from a request the broker refused. Nothing here is retried.

use thiserror::Error;

/// Categories of broker errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Remote session could not be established (WinRM, auth, snap-in)
    Connection,
    /// A referenced record does not exist
    NotFound,
    /// The broker refused a create/update/delete
    Rejected,
    /// No icon could be resolved from the executable path
    Icon,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Connection => "Could not reach the broker",
            Self::NotFound => "Record not found",
            Self::Rejected => "Change rejected by the broker",
            Self::Icon => "Icon could not be resolved",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Connection => {
                "Check the admin address, WinRM connectivity, credentials and that the Citrix snap-ins are installed"
            }
            Self::NotFound => "Verify the desktop group name",
            Self::Rejected => "Check the broker's error message and the delegated admin rights",
            Self::Icon => "Make sure the executable path exists on the broker and contains an icon",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur during broker operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Session/transport failure
    #[error("connection error: {message}")]
    Connection {
        /// Details from the remoting layer
        message: String,
    },

    /// PowerShell host executable not found
    #[error("PowerShell not found: {path}")]
    PowerShellNotFound {
        /// Executable that failed to start
        path: String,
    },

    /// Desktop group not found when one is required
    #[error("desktop group not found: {name}")]
    DesktopGroupNotFound {
        /// Name that was looked up
        name: String,
    },

    /// Broker refused a mutation
    #[error("broker rejected {operation}: {message}")]
    Rejected {
        /// Operation that was attempted
        operation: String,
        /// Broker error text
        message: String,
    },

    /// Icon resolution failed
    #[error("could not resolve icon from '{path}': {message}")]
    Icon {
        /// Executable path the icon was read from
        path: String,
        /// Details
        message: String,
    },

    /// Remote output could not be understood
    #[error("unexpected broker output for {operation}: {message}")]
    Protocol {
        /// Operation whose output was parsed
        operation: String,
        /// Details
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Connection { .. } | Error::PowerShellNotFound { .. } => {
                ErrorCategory::Connection
            }
            Error::DesktopGroupNotFound { .. } => ErrorCategory::NotFound,
            Error::Rejected { .. } => ErrorCategory::Rejected,
            Error::Icon { .. } => ErrorCategory::Icon,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error means no session could be used at all.
    pub fn is_connection(&self) -> bool {
        self.category() == ErrorCategory::Connection
    }

    /// Create an error from PowerShell stderr.
    ///
    /// Remoting and snap-in failures become [`Error::Connection`]; anything
    /// else is attributed to `operation`.
    pub fn from_remote_output(stderr: &str, operation: &str) -> Self {
        let stderr_lower = stderr.to_lowercase();
        let message = stderr.trim().to_string();

        if stderr_lower.contains("connecting to remote server")
            || stderr_lower.contains("winrm")
            || stderr_lower.contains("cannot find the computer")
            || stderr_lower.contains("access is denied")
            || stderr_lower.contains("logon failure")
            || stderr_lower.contains("no snap-ins have been registered")
            || stderr_lower.contains("is not installed on this computer")
            || stderr_lower.contains("psremotingtransportexception")
        {
            return Error::Connection { message };
        }

        Error::Rejected {
            operation: operation.to_string(),
            message,
        }
    }
}

/// Result type for broker operations.
pub type Result<T> = std::result::Result<T, Error>;
