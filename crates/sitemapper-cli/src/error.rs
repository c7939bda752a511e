//! CLI error handling with semantic exit codes.
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | Command completed successfully |
//! | 1 | `Internal` | Unexpected/internal error |
//! | 2 | `Usage` | Invalid arguments, configuration or input |
//! | 3 | `NotFound` | Input file or folder does not exist |
//! | 5 | `Network` | Search-engine notification failed |
//! | 7 | `Storage` | A produced file could not be written |
//!
//! ```bash
//! sitemapper generate --group blog=urls.txt
//! case $? in
//!     0) echo "done" ;;
//!     7) echo "disk problem" ;;
//! esac
//! ```

use sitemapper_core::Error as CoreError;
use std::fmt;
use std::io;

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,

    /// Invalid arguments, configuration or input lines (exit code 2).
    Usage = 2,

    /// Requested file or folder not found (exit code 3).
    NotFound = 3,

    /// Network failure while pinging (exit code 5).
    Network = 5,

    /// Writing produced files failed (exit code 7).
    ///
    /// The affected group halted; other groups may have completed.
    Storage = 7,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::NotFound => "not found",
            Self::Network => "network error",
            Self::Storage => "storage error",
        }
    }

    /// Category of a library error.
    #[must_use]
    pub fn from_core(err: &CoreError) -> Self {
        match err {
            CoreError::Config(_)
            | CoreError::Parse(_)
            | CoreError::InvalidUrl(_)
            | CoreError::Codec(_) => Self::Usage,
            CoreError::Io(e) if e.kind() == io::ErrorKind::NotFound => Self::NotFound,
            CoreError::Network(_) => Self::Network,
            CoreError::Io(_)
            | CoreError::Persistence { .. }
            | CoreError::EntryTooLarge { .. }
            | CoreError::GroupHalted { .. } => Self::Storage,
            CoreError::GroupClosed { .. } | CoreError::Other(_) => Self::Internal,
        }
    }

    /// Infer the error category from an error message.
    ///
    /// Fallback for errors that are neither [`CliError`] nor library errors.
    #[must_use]
    pub fn infer_from_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();

        if msg_lower.contains("not found")
            || msg_lower.contains("no such")
            || msg_lower.contains("does not exist")
        {
            return Self::NotFound;
        }

        if msg_lower.contains("connection")
            || msg_lower.contains("http")
            || msg_lower.contains("timed out")
        {
            return Self::Network;
        }

        if msg_lower.contains("invalid") || msg_lower.contains("missing required") {
            return Self::Usage;
        }

        Self::Internal
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Create a usage error.
    pub fn usage(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Usage, source)
    }

    /// Create a not-found error.
    pub fn not_found(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::NotFound, source)
    }

    /// Create a network error.
    pub fn network(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Network, source)
    }

    /// Create a storage error.
    pub fn storage(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Storage, source)
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.category.exit_code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.source)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Determine the exit code from an `anyhow::Error`.
///
/// An explicit [`CliError`] wins; otherwise the first library error in the
/// chain decides; otherwise the message is inspected.
#[must_use]
pub fn exit_code_from_error(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }

    if let Some(core_err) = err.chain().find_map(|cause| cause.downcast_ref::<CoreError>()) {
        return ErrorCategory::from_core(core_err).exit_code();
    }

    ErrorCategory::infer_from_message(&err.to_string()).exit_code()
}
