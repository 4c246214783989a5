// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::{
    bundle::{Bundle, Empty},
    linker::{Linker, SystemLinker},
    naming,
};
use std::{
    env, fmt,
    path::{Path, PathBuf},
};

/// How the loader detects that the library is already available.
#[derive(Debug, Clone, Default)]
pub enum Probe {
    /// Skip the probe and always go through the loading steps.
    #[default]
    Disabled,

    /// Resolve an exported symbol of the library in the running process.
    ///
    /// Any symbol the library always exports will do, typically a version or
    /// initialization entry point.
    Symbol(String),

    /// Run a caller supplied check, returning true when the library's
    /// functionality is usable.
    Check(fn() -> bool),
}

impl Probe {
    pub fn symbol<S: Into<String>>(name: S) -> Self {
        Probe::Symbol(name.into())
    }
}

/// Configuration of a [`crate::NativeLibrary`].
///
/// [`LoaderConfig::new`] reads the per-library environment toggles, where
/// `NAME` is the library name as formatted by [`naming::env_prefix`]:
///
/// - `NAME_DEBUG`: when set, every loading step is also printed to stderr.
/// - `NAME_LIBRARY`: explicit path of the library, loaded instead of
///   searching the system path and the bundle.
pub struct LoaderConfig {
    pub(crate) name: String,
    pub(crate) probe: Probe,
    pub(crate) bundle: Box<dyn Bundle>,
    pub(crate) linker: Box<dyn Linker>,
    pub(crate) temp_root: PathBuf,
    pub(crate) dir_prefix: String,
    pub(crate) debug: bool,
    pub(crate) override_path: Option<PathBuf>,
}

impl LoaderConfig {
    pub fn new<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        let prefix = naming::env_prefix(&name);

        let debug = env::var_os(format!("{}_DEBUG", prefix)).is_some();
        let override_path = env::var_os(format!("{}_LIBRARY", prefix))
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        LoaderConfig {
            dir_prefix: naming::temp_dir_prefix(&name),
            name,
            probe: Probe::Disabled,
            bundle: Box::new(Empty),
            linker: Box::new(SystemLinker),
            temp_root: env::temp_dir(),
            debug,
            override_path,
        }
    }

    pub fn probe(mut self, probe: Probe) -> Self {
        self.probe = probe;
        self
    }

    pub fn bundle<B: Bundle + 'static>(mut self, bundle: B) -> Self {
        self.bundle = Box::new(bundle);
        self
    }

    /// Replaces the platform loader, mostly useful for tests.
    pub fn linker<L: Linker + 'static>(mut self, linker: L) -> Self {
        self.linker = Box::new(linker);
        self
    }

    /// Directory under which extraction directories are created, defaults to
    /// [`env::temp_dir`].
    pub fn temp_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.temp_root = root.as_ref().to_path_buf();
        self
    }

    pub fn dir_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.dir_prefix = prefix.into();
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn override_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        self.override_path = path.map(|p| p.as_ref().to_path_buf());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Platform file name of the library, also its resource name in bundles.
    pub fn library_filename(&self) -> String {
        naming::library_filename(&self.name)
    }

    pub fn temp_root_path(&self) -> &Path {
        &self.temp_root
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn override_path_value(&self) -> Option<&Path> {
        self.override_path.as_deref()
    }
}

impl fmt::Debug for LoaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderConfig")
            .field("name", &self.name)
            .field("probe", &self.probe)
            .field("temp_root", &self.temp_root)
            .field("dir_prefix", &self.dir_prefix)
            .field("debug", &self.debug)
            .field("override_path", &self.override_path)
            .finish_non_exhaustive()
    }
}
