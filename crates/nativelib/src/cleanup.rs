// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Deletion of temporary files and directories at process exit.
//!
//! An extracted library cannot be removed while it is mapped into the
//! process, so its file and directory are queued here and removed by an
//! `atexit` hook once the process ends. Paths are removed in reverse order of
//! registration: register a directory before the files placed inside it so
//! the directory is empty by the time its turn comes.

use std::{
    ffi::c_int,
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, Once, PoisonError},
};

static PENDING: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());
static INSTALL_HOOK: Once = Once::new();

extern "C" {
    fn atexit(callback: extern "C" fn()) -> c_int;
}

extern "C" fn run_at_exit() {
    run_pending();
}

/// Queues `path` for deletion when the process exits.
///
/// Directories are removed only if empty, the same as [`fs::remove_dir`].
pub fn delete_on_exit<P: Into<PathBuf>>(path: P) {
    INSTALL_HOOK.call_once(|| {
        // SAFETY: run_at_exit is a plain extern "C" function without
        // arguments which never unwinds, as atexit requires.
        if unsafe { atexit(run_at_exit) } != 0 {
            log::warn!("atexit registration failed, temporary files will be left behind");
        }
    });

    let path = path.into();
    log::debug!("scheduled {} for deletion at exit", path.display());
    PENDING
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(path);
}

/// Paths currently queued for deletion, in registration order.
pub fn pending() -> Vec<PathBuf> {
    PENDING
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Removes every queued path now, newest first, and empties the queue.
///
/// Returns the number of paths removed. Paths which are already gone count
/// as removed, other failures are logged and skipped.
pub fn run_pending() -> usize {
    let paths = std::mem::take(&mut *PENDING.lock().unwrap_or_else(PoisonError::into_inner));

    paths
        .iter()
        .rev()
        .filter(|path| match remove(path) {
            Ok(()) => true,
            Err(err) if err.kind() == io::ErrorKind::NotFound => true,
            Err(err) => {
                log::warn!("failed to delete {}: {}", path.display(), err);
                false
            }
        })
        .count()
}

fn remove(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}
