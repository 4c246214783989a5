// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Packaged resources which may carry a copy of the native library.
//!
//! A bundle is looked up by the platform file name of the library, see
//! [`crate::naming::library_filename`]. A bundle that does not carry the
//! resource answers `Ok(None)`, which the loader reports as
//! [`crate::Error::NotFound`]. This is the normal outcome for builds which
//! link the native code statically and ship no standalone library.

use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

/// Source of packaged native libraries.
pub trait Bundle: Send + Sync {
    /// Opens the resource for reading, or returns `Ok(None)` when the
    /// bundle does not carry it.
    fn open(&self, resource: &str) -> io::Result<Option<Box<dyn Read + '_>>>;
}

impl<B: Bundle + ?Sized> Bundle for Box<B> {
    fn open(&self, resource: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
        (**self).open(resource)
    }
}

/// Bundles searched in order, the first one carrying the resource wins.
impl Bundle for Vec<Box<dyn Bundle>> {
    fn open(&self, resource: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
        for bundle in self {
            if let Some(reader) = bundle.open(resource)? {
                return Ok(Some(reader));
            }
        }
        Ok(None)
    }
}

/// Libraries compiled into the binary, usually with `include_bytes!`.
///
/// ```
/// use nativelib::bundle::{Bundle, Embedded};
///
/// static BUNDLED: &[(&str, &[u8])] = &[("libdemo.so", b"\x7fELF")];
///
/// let bundle = Embedded::new(BUNDLED);
/// assert!(bundle.open("libdemo.so").unwrap().is_some());
/// assert!(bundle.open("libother.so").unwrap().is_none());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Embedded {
    entries: &'static [(&'static str, &'static [u8])],
}

impl Embedded {
    pub const fn new(entries: &'static [(&'static str, &'static [u8])]) -> Self {
        Embedded { entries }
    }
}

impl Bundle for Embedded {
    fn open(&self, resource: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
        Ok(self
            .entries
            .iter()
            .find(|(name, _)| *name == resource)
            .map(|(_, bytes)| Box::new(*bytes) as Box<dyn Read + '_>))
    }
}

/// Libraries shipped as plain files in a directory.
#[derive(Debug, Clone)]
pub struct Directory {
    root: PathBuf,
}

impl Directory {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Directory {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory `subdir` next to the running executable.
    pub fn beside_executable<P: AsRef<Path>>(subdir: P) -> io::Result<Self> {
        let exe = std::env::current_exe()?;
        let parent = exe.parent().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("executable {} has no parent directory", exe.display()),
            )
        })?;
        Ok(Directory::new(parent.join(subdir)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Bundle for Directory {
    fn open(&self, resource: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
        let path = self.root.join(resource);
        if path.is_dir() {
            return Ok(None);
        }
        match File::open(&path) {
            Ok(file) => Ok(Some(Box::new(file))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Bundle carrying nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Empty;

impl Bundle for Empty {
    fn open(&self, _resource: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
        Ok(None)
    }
}
