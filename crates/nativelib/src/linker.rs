// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Platform loader access.
//!
//! The loader talks to the operating system only through [`Linker`], the
//! default implementation [`SystemLinker`] is backed by `libloading`.

use crate::BoxError;
use libloading::Library;
use std::{
    ffi::{c_void, OsStr},
    path::Path,
};

/// Symbol probe and shared library loading.
pub trait Linker: Send + Sync {
    /// Returns true when `symbol` resolves in the running process.
    fn has_symbol(&self, symbol: &str) -> bool;

    /// Loads a library by file name from the system library search path.
    fn load_system(&self, file_name: &str) -> Result<Library, BoxError>;

    /// Loads the library at `path`.
    fn load_path(&self, path: &Path) -> Result<Library, BoxError>;

    /// Handle to the running process, used when the library was found
    /// already loaded.
    fn process(&self) -> Result<Library, BoxError>;
}

/// [`Linker`] using the operating system loader.
///
/// On Unix libraries are opened with `RTLD_NOW | RTLD_GLOBAL` so their
/// symbols are visible to later probes of the process. On Windows the probe
/// only sees symbols exported by the executable itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLinker;

impl SystemLinker {
    fn open(target: &OsStr) -> Result<Library, libloading::Error> {
        #[cfg(unix)]
        {
            use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};
            // SAFETY: loading runs the library's initializers, which is the
            // purpose of this crate; callers choose which library to trust.
            let lib = unsafe { UnixLibrary::open(Some(target), RTLD_NOW | RTLD_GLOBAL)? };
            Ok(lib.into())
        }
        #[cfg(windows)]
        {
            // SAFETY: see the unix branch.
            unsafe { Library::new(target) }
        }
    }
}

impl Linker for SystemLinker {
    fn has_symbol(&self, symbol: &str) -> bool {
        match process_library() {
            // SAFETY: the symbol is only checked for presence, never read or
            // called through this type.
            Ok(lib) => unsafe { lib.get::<*mut c_void>(symbol.as_bytes()).is_ok() },
            Err(err) => {
                log::debug!("cannot open the process handle: {}", err);
                false
            }
        }
    }

    fn load_system(&self, file_name: &str) -> Result<Library, BoxError> {
        Ok(Self::open(OsStr::new(file_name))?)
    }

    fn load_path(&self, path: &Path) -> Result<Library, BoxError> {
        Ok(Self::open(path.as_os_str())?)
    }

    fn process(&self) -> Result<Library, BoxError> {
        Ok(process_library()?)
    }
}

/// Opens a handle to the running process and everything loaded into its
/// global namespace.
pub fn process_library() -> Result<Library, libloading::Error> {
    #[cfg(unix)]
    {
        Ok(libloading::os::unix::Library::this().into())
    }
    #[cfg(windows)]
    {
        libloading::os::windows::Library::this().map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_probe_libc_symbol() {
        // Every unix process has malloc in its global namespace.
        assert!(SystemLinker.has_symbol("malloc"));
    }

    #[test]
    fn test_probe_missing_symbol() {
        assert!(!SystemLinker.has_symbol("nativelib_symbol_which_does_not_exist"));
    }

    #[test]
    fn test_load_missing_library() {
        let err = SystemLinker
            .load_system(&crate::naming::library_filename("nativelib_missing_library"))
            .unwrap_err();
        assert!(!err.to_string().is_empty());
        assert!(SystemLinker
            .load_path(Path::new("/nonexistent/dir/libmissing.so"))
            .is_err());
    }

    #[test]
    fn test_process_handle() {
        assert!(SystemLinker.process().is_ok());
    }
}
