// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! nativelib for Rust
//!
//! Bootstrap loader which makes a native shared library available to the
//! calling process before any of its functionality is used.
//!
//! Loading is a linear fallback chain:
//!
//! 1. Probe whether a known symbol of the library already resolves in the
//!    process (static linking, an earlier load, or a host library exporting
//!    the same code).
//! 2. Load an explicit path from the `<NAME>_LIBRARY` environment variable.
//! 3. Load the library by name from the system library search path.
//! 4. Extract a bundled copy into a fresh temporary directory and load it
//!    from there. The file and directory are deleted at process exit.
//!
//! # Quick Start
//!
//! ```no_run
//! use nativelib::{bundle::Embedded, LoaderConfig, Probe};
//!
//! static BUNDLED: &[(&str, &[u8])] = &[
//!     // ("libvw_jni.so", include_bytes!("../native/libvw_jni.so")),
//! ];
//!
//! nativelib::native_library! {
//!     pub fn vw_jni() => LoaderConfig::new("vw_jni")
//!         .probe(Probe::symbol("VW_version"))
//!         .bundle(Embedded::new(BUNDLED))
//! }
//!
//! let loaded = vw_jni()?;
//! println!("vw_jni loaded: {}", loaded.origin());
//! # Ok::<(), nativelib::Error>(())
//! ```
//!
//! # Diagnostics
//!
//! Every fallback step is logged through the [`log`] facade. Setting
//! `<NAME>_DEBUG` (for example `VW_JNI_DEBUG=1`) also writes the steps to
//! standard error, which helps in hosts that install no logger.

use std::{error, ffi::OsString, fmt, io, path::PathBuf};

// Re-export libloading for custom linkers and symbol types
pub use libloading;

/// Boxed error returned by [`linker::Linker`] implementations.
pub type BoxError = Box<dyn error::Error + Send + Sync + 'static>;

/// Link failure raised by the loader.
///
/// Every failure of the fallback chain is reported through this one type.
/// The variants carry the cause so callers can print a useful message, there
/// is no recovery path and nothing is retried.
#[derive(Debug)]
pub enum Error {
    /// The library is not loaded, not on the system search path and the
    /// bundle has no resource for it.
    NotFound { name: String },

    /// Copying the bundled resource into the temporary directory failed.
    Extraction { path: PathBuf, source: io::Error },

    /// Every candidate temporary directory name was already taken.
    TempDirExhausted { pattern: PathBuf, attempts: u32 },

    /// The platform loader rejected an explicit or extracted library path.
    Load { target: OsString, source: BoxError },

    /// A symbol could not be resolved in a loaded library.
    Symbol {
        name: String,
        source: libloading::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound { name } => write!(
                f,
                "cannot find native library {}: not loaded, not on the library search path and not bundled",
                name
            ),
            Error::Extraction { path, source } => write!(
                f,
                "unable to extract native library into a temporary file {} ({})",
                path.display(),
                source
            ),
            Error::TempDirExhausted { pattern, attempts } => write!(
                f,
                "could not create a temporary directory (tried to make {}* {} times) to extract native libraries",
                pattern.display(),
                attempts
            ),
            Error::Load { target, source } => write!(
                f,
                "failed to load native library {}: {}",
                target.to_string_lossy(),
                source
            ),
            Error::Symbol { name, source } => write!(f, "symbol {} not found: {}", name, source),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::NotFound { .. } => None,
            Error::Extraction { source, .. } => Some(source),
            Error::TempDirExhausted { .. } => None,
            Error::Load { source, .. } => Some(source.as_ref()),
            Error::Symbol { source, .. } => Some(source),
        }
    }
}

/// Declares a zero-argument accessor which loads the library on first use.
///
/// The generated function owns a process-wide [`NativeLibrary`] built from
/// the configuration expression, which is evaluated at most once.
///
/// ```no_run
/// use nativelib::LoaderConfig;
///
/// nativelib::native_library! {
///     fn zstd() => LoaderConfig::new("zstd")
/// }
///
/// zstd()?;
/// # Ok::<(), nativelib::Error>(())
/// ```
#[macro_export]
macro_rules! native_library {
    ($(#[$meta:meta])* $vis:vis fn $fn_name:ident() => $config:expr $(;)?) => {
        $(#[$meta])*
        $vis fn $fn_name() -> ::std::result::Result<&'static $crate::Loaded, $crate::Error> {
            static LIBRARY: ::std::sync::OnceLock<$crate::NativeLibrary> =
                ::std::sync::OnceLock::new();
            LIBRARY
                .get_or_init(|| $crate::NativeLibrary::new($config))
                .ensure_loaded()
        }
    };
}

/// The bundle module provides the packaged-resource providers.
pub mod bundle;

/// The cleanup module provides deletion of temporary files at process exit.
pub mod cleanup;

/// The config module provides the loader configuration.
pub mod config;

/// The extract module copies bundled libraries into temporary directories.
pub mod extract;

/// The linker module wraps the platform loader.
pub mod linker;

/// The loader module provides the fallback chain.
pub mod loader;

/// The naming module maps logical library names to platform file names.
pub mod naming;

pub use config::{LoaderConfig, Probe};
pub use loader::{Loaded, NativeLibrary, Origin};
