// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::fmt;
use std::process::ExitCode;

/// CLI-specific error type with exit code mapping
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line arguments
    InvalidArgs(String),
    /// Library not loaded, not on the search path and not bundled
    NotFound(String),
    /// Bundled library could not be copied out
    Extraction(String),
    /// No free temporary directory name
    TempDir(String),
    /// Platform loader rejected the library
    LoadFailed(String),
    /// Any other failure
    General(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::NotFound(msg) => write!(f, "Library not found: {}", msg),
            CliError::Extraction(msg) => write!(f, "Extraction failed: {}", msg),
            CliError::TempDir(msg) => write!(f, "Temporary directory error: {}", msg),
            CliError::LoadFailed(msg) => write!(f, "Load failed: {}", msg),
            CliError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::InvalidArgs(_) => ExitCode::from(2),
            CliError::NotFound(_) => ExitCode::from(3),
            CliError::Extraction(_) => ExitCode::from(4),
            CliError::TempDir(_) => ExitCode::from(5),
            CliError::LoadFailed(_) => ExitCode::from(6),
            CliError::General(_) => ExitCode::from(1),
        }
    }
}

/// Map nativelib::Error to CliError with appropriate exit codes
impl From<nativelib::Error> for CliError {
    fn from(err: nativelib::Error) -> Self {
        use nativelib::Error;

        let msg = err.to_string();
        match err {
            Error::NotFound { .. } => CliError::NotFound(msg),
            Error::Extraction { .. } => CliError::Extraction(msg),
            Error::TempDirExhausted { .. } => CliError::TempDir(msg),
            Error::Load { .. } | Error::Symbol { .. } => CliError::LoadFailed(msg),
        }
    }
}

/// Helper function to convert result to exit code
pub fn result_to_exit_code<T>(result: Result<T, CliError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::InvalidArgs("test".into()).exit_code(),
            ExitCode::from(2)
        );
        assert_eq!(
            CliError::NotFound("test".into()).exit_code(),
            ExitCode::from(3)
        );
        assert_eq!(
            CliError::Extraction("test".into()).exit_code(),
            ExitCode::from(4)
        );
        assert_eq!(CliError::TempDir("test".into()).exit_code(), ExitCode::from(5));
        assert_eq!(
            CliError::LoadFailed("test".into()).exit_code(),
            ExitCode::from(6)
        );
        assert_eq!(CliError::General("test".into()).exit_code(), ExitCode::from(1));
    }

    #[test]
    fn test_from_library_error() {
        let err: CliError = nativelib::Error::TempDirExhausted {
            pattern: PathBuf::from("/tmp/demo-1-"),
            attempts: 1000,
        }
        .into();
        assert!(matches!(err, CliError::TempDir(_)));

        let err: CliError = nativelib::Error::NotFound {
            name: "demo".into(),
        }
        .into();
        assert!(err.to_string().starts_with("Library not found: cannot find native library demo"));
    }
}
