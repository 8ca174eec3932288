//! Error handling for roster runs
//!
//! Only run-level failures live here. Per-line defects (bad dates, missing
//! names, duplicates) are counted in the run statistics and never become errors.

use std::io;
use thiserror::Error;

/// Run-level error type
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Permission denied: {file}")]
    PermissionDenied { file: String },

    #[error("No such file or directory: {file}")]
    FileNotFound { file: String },

    #[error("Is a directory: {file}")]
    IsDirectory { file: String },

    #[error("Input is not valid UTF-8 text (first bad byte at offset {offset})")]
    Decode { offset: usize },

    #[error("Invalid value for {option}: {value}")]
    InvalidOption { option: String, value: String },

    #[error("Conflicting options: {message}")]
    ConflictingOptions { message: String },

    #[error("Run cancelled after {chunks_done} of {chunks_total} chunks")]
    Cancelled {
        chunks_done: usize,
        chunks_total: usize,
    },

    #[error("Run did not complete: {message}")]
    Incomplete { message: String },

    #[error("Thread pool error: {message}")]
    ThreadPoolError { message: String },
}

impl RosterError {
    /// Returns the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RosterError::PermissionDenied { .. }
            | RosterError::FileNotFound { .. }
            | RosterError::IsDirectory { .. }
            | RosterError::Io(_) => crate::IO_FAILURE,

            _ => crate::EXIT_FAILURE,
        }
    }

    pub fn permission_denied(file: &str) -> Self {
        RosterError::PermissionDenied {
            file: file.to_string(),
        }
    }

    pub fn file_not_found(file: &str) -> Self {
        RosterError::FileNotFound {
            file: file.to_string(),
        }
    }

    pub fn is_directory(file: &str) -> Self {
        RosterError::IsDirectory {
            file: file.to_string(),
        }
    }

    /// Create an invalid option value error
    pub fn invalid_option(option: &str, value: &str) -> Self {
        RosterError::InvalidOption {
            option: option.to_string(),
            value: value.to_string(),
        }
    }

    /// Create a conflicting options error
    pub fn conflicting_options(message: &str) -> Self {
        RosterError::ConflictingOptions {
            message: message.to_string(),
        }
    }

    pub fn incomplete(message: &str) -> Self {
        RosterError::Incomplete {
            message: message.to_string(),
        }
    }

    pub fn thread_pool_error(message: &str) -> Self {
        RosterError::ThreadPoolError {
            message: message.to_string(),
        }
    }
}

/// Result type for roster operations
pub type RosterResult<T> = Result<T, RosterError>;

/// Context trait for attaching a file name to I/O failures
pub trait RosterContext<T> {
    fn with_file_context(self, filename: &str) -> RosterResult<T>;
}

fn file_error(io_err: io::Error, filename: &str) -> RosterError {
    match io_err.kind() {
        io::ErrorKind::PermissionDenied => RosterError::permission_denied(filename),
        io::ErrorKind::NotFound => RosterError::file_not_found(filename),
        _ => RosterError::Io(io::Error::new(
            io_err.kind(),
            format!("{}: {}", filename, io_err),
        )),
    }
}

impl<T> RosterContext<T> for Result<T, io::Error> {
    fn with_file_context(self, filename: &str) -> RosterResult<T> {
        self.map_err(|io_err| file_error(io_err, filename))
    }
}

impl<T> RosterContext<T> for RosterResult<T> {
    fn with_file_context(self, filename: &str) -> RosterResult<T> {
        self.map_err(|err| match err {
            RosterError::Io(io_err) => file_error(io_err, filename),
            other => other,
        })
    }
}
