// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! The loading fallback chain.
//!
//! [`NativeLibrary::ensure_loaded`] tries, in order: the probe, the
//! `<NAME>_LIBRARY` override, the system library search path and finally
//! extraction of the bundled copy. The first success is cached for the
//! lifetime of the [`NativeLibrary`], the first failure is returned as is.

use crate::{
    config::{LoaderConfig, Probe},
    extract::{self, Extracted, Retention},
    Error,
};
use libloading::{Library, Symbol};
use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock, PoisonError},
};

/// Where the library came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// The probe found the library's symbols already present.
    AlreadyLoaded,

    /// Loaded from the path given in the `<NAME>_LIBRARY` variable.
    Override(PathBuf),

    /// Loaded by file name from the system library search path.
    SystemPath(String),

    /// Loaded from a copy extracted out of the bundle.
    Extracted(PathBuf),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Origin::AlreadyLoaded => write!(f, "already loaded"),
            Origin::Override(path) => write!(f, "override {}", path.display()),
            Origin::SystemPath(name) => write!(f, "system path {}", name),
            Origin::Extracted(path) => write!(f, "extracted {}", path.display()),
        }
    }
}

/// A successfully loaded library.
///
/// Holds the library handle, so the library stays mapped for as long as the
/// owning [`NativeLibrary`] lives.
#[derive(Debug)]
pub struct Loaded {
    origin: Origin,
    library: Library,
    extracted: Option<Extracted>,
}

impl Loaded {
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Handle of the library, or of the whole process when the library was
    /// found by the probe.
    pub fn library(&self) -> &Library {
        &self.library
    }

    /// The extraction record when the library was loaded from the bundle.
    pub fn extracted(&self) -> Option<&Extracted> {
        self.extracted.as_ref()
    }

    /// Resolves `name` in the loaded library.
    ///
    /// # Safety
    ///
    /// `T` must match the actual type of the symbol, as for
    /// [`Library::get`].
    pub unsafe fn symbol<T>(&self, name: &str) -> Result<Symbol<'_, T>, Error> {
        // SAFETY: forwarded to the caller.
        unsafe { self.library.get(name.as_bytes()) }.map_err(|source| Error::Symbol {
            name: name.to_string(),
            source,
        })
    }
}

/// A native library which is loaded at most once.
///
/// ```no_run
/// use nativelib::{bundle::Directory, LoaderConfig, NativeLibrary, Probe};
///
/// let vw = NativeLibrary::new(
///     LoaderConfig::new("vw_jni")
///         .probe(Probe::symbol("VW_version"))
///         .bundle(Directory::beside_executable("native")?),
/// );
/// let loaded = vw.ensure_loaded()?;
/// println!("{}", loaded.origin());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct NativeLibrary {
    config: LoaderConfig,
    state: OnceLock<Loaded>,
    init_lock: Mutex<()>,
}

impl NativeLibrary {
    pub fn new(config: LoaderConfig) -> Self {
        NativeLibrary {
            config,
            state: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Returns the loaded library without attempting to load it.
    pub fn try_loaded(&self) -> Option<&Loaded> {
        self.state.get()
    }

    /// Makes the library available to the process.
    ///
    /// Runs the fallback chain on the first call. Later calls, including
    /// concurrent ones, return the same [`Loaded`] without touching the
    /// filesystem. A failed attempt is not cached, the next call starts over.
    pub fn ensure_loaded(&self) -> Result<&Loaded, Error> {
        if let Some(loaded) = self.state.get() {
            return Ok(loaded);
        }

        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Double-check after acquiring lock
        if let Some(loaded) = self.state.get() {
            return Ok(loaded);
        }

        let loaded = self.load()?;
        Ok(self.state.get_or_init(|| loaded))
    }

    fn load(&self) -> Result<Loaded, Error> {
        let config = &self.config;
        let linker = &config.linker;

        if self.probe() {
            self.trace(format_args!("isLoaded: true"));
            let library = linker.process().map_err(|source| Error::Load {
                target: OsString::from("<process>"),
                source,
            })?;
            return Ok(Loaded {
                origin: Origin::AlreadyLoaded,
                library,
                extracted: None,
            });
        }

        if let Some(path) = &config.override_path {
            self.trace(format_args!("loading override {}", path.display()));
            let library = load_path(config, path)?;
            return Ok(Loaded {
                origin: Origin::Override(path.clone()),
                library,
                extracted: None,
            });
        }

        let file_name = config.library_filename();
        match linker.load_system(&file_name) {
            Ok(library) => {
                self.trace(format_args!("loaded {} from the search path", file_name));
                return Ok(Loaded {
                    origin: Origin::SystemPath(file_name),
                    library,
                    extracted: None,
                });
            }
            Err(err) => self.trace(format_args!("tryLoadLibrary failed: {}", err)),
        }

        self.trace(format_args!("resource name: {}", file_name));
        let resource = config
            .bundle
            .open(&file_name)
            .map_err(|source| Error::Extraction {
                path: PathBuf::from(&file_name),
                source,
            })?
            .ok_or_else(|| Error::NotFound {
                name: config.name.clone(),
            })?;

        let extracted = extract::extract(
            resource,
            &config.temp_root,
            &config.dir_prefix,
            &file_name,
            Retention::DeleteOnExit,
        )?;
        self.trace(format_args!(
            "copied {} bytes to {}",
            extracted.bytes(),
            extracted.path().display()
        ));

        let library = load_path(config, extracted.path())?;
        Ok(Loaded {
            origin: Origin::Extracted(extracted.path().to_path_buf()),
            library,
            extracted: Some(extracted),
        })
    }

    fn probe(&self) -> bool {
        match &self.config.probe {
            Probe::Disabled => false,
            Probe::Symbol(symbol) => self.config.linker.has_symbol(symbol),
            Probe::Check(check) => check(),
        }
    }

    fn trace(&self, args: fmt::Arguments) {
        log::debug!("{}: {}", self.config.name, args);
        if self.config.debug {
            eprintln!("nativelib: {}: {}", self.config.name, args);
        }
    }
}

impl fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("config", &self.config)
            .field("state", &self.state.get())
            .finish()
    }
}

fn load_path(config: &LoaderConfig, path: &Path) -> Result<Library, Error> {
    config.linker.load_path(path).map_err(|source| Error::Load {
        target: path.as_os_str().to_os_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::Empty;

    #[test]
    fn test_origin_display() {
        assert_eq!(Origin::AlreadyLoaded.to_string(), "already loaded");
        assert_eq!(
            Origin::SystemPath("libvw_jni.so".into()).to_string(),
            "system path libvw_jni.so"
        );
        assert_eq!(
            Origin::Extracted(PathBuf::from("/tmp/a/libvw_jni.so")).to_string(),
            "extracted /tmp/a/libvw_jni.so"
        );
    }

    #[test]
    fn test_check_probe_short_circuits() {
        let root = tempfile::tempdir().unwrap();
        let lib = NativeLibrary::new(
            LoaderConfig::new("nativelib_probe_check")
                .probe(Probe::Check(|| true))
                .bundle(Empty)
                .temp_root(root.path()),
        );

        let loaded = lib.ensure_loaded().unwrap();
        assert_eq!(loaded.origin(), &Origin::AlreadyLoaded);
        assert!(loaded.extracted().is_none());
        assert!(lib.try_loaded().is_some());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symbol_lookup_through_process_handle() {
        let lib = NativeLibrary::new(
            LoaderConfig::new("nativelib_probe_malloc").probe(Probe::symbol("malloc")),
        );
        let loaded = lib.ensure_loaded().unwrap();
        assert_eq!(loaded.origin(), &Origin::AlreadyLoaded);

        let malloc = unsafe { loaded.symbol::<unsafe extern "C" fn(usize) -> *mut u8>("malloc") };
        assert!(malloc.is_ok());
        let missing = unsafe { loaded.symbol::<unsafe extern "C" fn()>("nativelib_no_such_fn") };
        assert!(matches!(missing, Err(Error::Symbol { .. })));
    }

    #[test]
    fn test_not_found_without_bundle() {
        let root = tempfile::tempdir().unwrap();
        let lib = NativeLibrary::new(
            LoaderConfig::new("nativelib_absent_everywhere")
                .override_path(None::<PathBuf>)
                .temp_root(root.path()),
        );

        match lib.ensure_loaded() {
            Err(Error::NotFound { name }) => assert_eq!(name, "nativelib_absent_everywhere"),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(lib.try_loaded().is_none());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
