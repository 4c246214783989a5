// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use nativelib::bundle::Directory;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Open a bundle directory, rejecting paths which are not directories
pub fn bundle_dir(path: &Path) -> Result<Directory, CliError> {
    if !path.is_dir() {
        return Err(CliError::InvalidArgs(format!(
            "Bundle directory does not exist: {}",
            path.display()
        )));
    }
    Ok(Directory::new(path))
}

/// Resolve the temporary root, defaulting to the system temp directory
pub fn temp_root(path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match path {
        Some(path) if !path.is_dir() => Err(CliError::InvalidArgs(format!(
            "Temporary directory does not exist: {}",
            path.display()
        ))),
        Some(path) => Ok(path),
        None => Ok(std::env::temp_dir()),
    }
}

/// Install signal handler for graceful shutdown on Ctrl+C
///
/// Returns an Arc<AtomicBool> that will be set to true when SIGINT or
/// SIGTERM is received.
pub fn install_signal_handler() -> Result<Arc<AtomicBool>, CliError> {
    let term = Arc::new(AtomicBool::new(false));

    for signal in [SIGINT, SIGTERM] {
        flag::register(signal, Arc::clone(&term))
            .map_err(|e| CliError::General(format!("Failed to register signal handler: {}", e)))?;
    }

    log::debug!("Installed SIGINT/SIGTERM handler");
    Ok(term)
}

/// Block until the termination flag is raised
pub fn wait_for_signal(term: &AtomicBool) {
    while !term.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(100));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_dir_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(bundle_dir(dir.path()).is_ok());
        assert!(matches!(
            bundle_dir(&dir.path().join("missing")),
            Err(CliError::InvalidArgs(_))
        ));
    }

    #[test]
    fn test_temp_root() {
        assert_eq!(temp_root(None).unwrap(), std::env::temp_dir());
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            temp_root(Some(dir.path().to_path_buf())).unwrap(),
            dir.path()
        );
        assert!(temp_root(Some(dir.path().join("missing"))).is_err());
    }

    #[test]
    fn test_wait_returns_once_flag_is_set() {
        let term = AtomicBool::new(true);
        wait_for_signal(&term);
    }
}
