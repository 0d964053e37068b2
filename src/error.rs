//! Domain-specific error types for rolling-rhino.
//!
//! This module defines `RhinoError`, a `thiserror`-based enum that provides
//! typed error variants for the halting conditions of the migration
//! workflow. Public API functions return `Result<T, RhinoError>` for
//! programmatic error handling, while the binary boundary uses
//! `anyhow::Result`.
//!
//! Task failures during the maintenance phase are deliberately absent from
//! this enum: they are logged and recovered locally, never propagated.

use std::io;

use camino::Utf8PathBuf;

/// Formats an IO error kind into a human-readable message.
///
/// Provides consistent, user-friendly messages for common IO error kinds
/// (e.g., "I/O error: not found") instead of the OS-level messages
/// (e.g., "No such file or directory (os error 2)"). For unrecognized
/// error kinds, falls back to including the OS-level error message
/// directly.
pub(crate) fn io_error_kind_message(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "I/O error: not found".to_string(),
        io::ErrorKind::PermissionDenied => "I/O error: permission denied".to_string(),
        io::ErrorKind::IsADirectory => "I/O error: is a directory".to_string(),
        _ => format!("I/O error: {}", err),
    }
}

/// Domain-specific error type for rolling-rhino.
///
/// Every variant is a halting condition: the workflow terminates with a
/// non-zero exit status and a single diagnostic line. Variants up to and
/// including `Declined` guarantee that no file has been mutated yet;
/// `PartialMigration` is the one exception and says so in its message.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RhinoError {
    /// The host does not satisfy a migration precondition (wrong OS,
    /// wrong distribution, unsupported release type, no desktop packages).
    #[error("{0}")]
    Environment(String),

    /// The primary sources file already references the devel series.
    /// A no-op halt rather than a failure, but it uses the same
    /// non-zero termination path as every other halting condition.
    #[error("already tracking the devel series, nothing to do")]
    AlreadyMigrated,

    /// The caller does not hold root privileges.
    #[error("you need to be root, current uid: {uid}")]
    Privilege {
        /// Effective uid of the calling process.
        uid: u32,
    },

    /// A required external query tool is not on the search path.
    #[error("required tool not detected: {0}")]
    ToolUnavailable(String),

    /// An I/O operation failed with contextual information.
    #[error("{context}: {message}")]
    Io {
        /// What was being done when the error occurred, usually a file
        /// path or an operation description with a path.
        context: String,
        /// Human-readable description derived from
        /// [`io_error_kind_message`].
        message: String,
        /// The underlying I/O error, preserved for programmatic
        /// inspection.
        #[source]
        source: io::Error,
    },

    /// The primary sources file could not be replaced after the backup
    /// was already written. The system is left partially migrated and
    /// requires manual operator intervention.
    #[error(
        "sources file overwrite failed after the backup was written: \
         the system is partially migrated, restore manually from {backup}"
    )]
    PartialMigration {
        /// Path of the successfully written backup copy.
        backup: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    /// The operator answered the confirmation prompt with anything
    /// other than 'y'.
    #[error("migration declined, no changes were made")]
    Declined,
}

impl RhinoError {
    /// Creates an `Io` variant with the `message` field automatically
    /// derived from the `source` via [`io_error_kind_message`].
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: io_error_kind_message(&source),
            source,
        }
    }
}
