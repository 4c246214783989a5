// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Extraction of bundled libraries into fresh temporary directories.
//!
//! Each extraction gets its own directory named
//! `<prefix>-<unix millis>-<attempt>`, so concurrent processes never share
//! or overwrite each other's copies.

use crate::{cleanup, Error};
use std::{
    fs::{self, OpenOptions},
    io::{self, Read, Write},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

/// Number of directory names tried before giving up.
pub const MAX_ATTEMPTS: u32 = 1000;

/// Size of the copy buffer.
pub const BUFFER_SIZE: usize = 1 << 20;

/// What happens to extracted files once the process exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Retention {
    /// Delete the file and its directory at process exit.
    #[default]
    DeleteOnExit,

    /// Leave the files in place.
    Keep,
}

/// A library copied out of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    dir: PathBuf,
    path: PathBuf,
    bytes: u64,
}

impl Extracted {
    /// Temporary directory created for this extraction.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute path of the extracted library.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes copied from the resource.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

/// Creates a new directory under `root` for one extraction.
pub fn create_temp_dir(root: &Path, prefix: &str) -> Result<PathBuf, Error> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    create_numbered_dir(root, &format!("{}-{}-", prefix, millis))
}

fn create_numbered_dir(root: &Path, base: &str) -> Result<PathBuf, Error> {
    for attempt in 0..MAX_ATTEMPTS {
        let candidate = root.join(format!("{}{}", base, attempt));
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(err) => log::trace!("cannot create {}: {}", candidate.display(), err),
        }
    }

    Err(Error::TempDirExhausted {
        pattern: root.join(base),
        attempts: MAX_ATTEMPTS,
    })
}

/// Copies `resource` to `<new temp dir>/<file_name>`.
///
/// The resource is consumed and closed before returning, whether the copy
/// succeeded or not. With [`Retention::DeleteOnExit`] the directory is queued
/// for deletion before the file, so the file goes first at exit, and both
/// are queued before any byte is written so a partial copy is removed too.
pub fn extract(
    resource: Box<dyn Read + '_>,
    root: &Path,
    prefix: &str,
    file_name: &str,
    retention: Retention,
) -> Result<Extracted, Error> {
    let dir = create_temp_dir(root, prefix)?;
    let path = dir.join(file_name);
    if retention == Retention::DeleteOnExit {
        cleanup::delete_on_exit(&dir);
        cleanup::delete_on_exit(&path);
    }

    log::debug!("extracting native library to: {}", path.display());
    let bytes = write_resource(resource, &path).map_err(|source| Error::Extraction {
        path: path.clone(),
        source,
    })?;
    log::debug!("copied {} bytes to {}", bytes, path.display());

    Ok(Extracted { dir, path, bytes })
}

fn write_resource(mut resource: Box<dyn Read + '_>, path: &Path) -> io::Result<u64> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    copy_stream(&mut resource, &mut file)
}

/// Copies `src` to `dst` through a [`BUFFER_SIZE`] buffer, returning the
/// number of bytes copied. Reads interrupted by a signal are retried.
pub fn copy_stream<R, W>(src: &mut R, dst: &mut W) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = match src.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        dst.write_all(&buffer[..n])?;
        total += n as u64;
    }
    dst.flush()?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    /// Reader yielding `data`, then failing, and flagging its own drop.
    struct FailingReader {
        data: Vec<u8>,
        interrupt_first: bool,
        dropped: Arc<AtomicBool>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interrupt_first {
                self.interrupt_first = false;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            if self.data.is_empty() {
                return Err(io::Error::new(io::ErrorKind::Other, "device removed"));
            }
            let n = buf.len().min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data.drain(..n);
            Ok(n)
        }
    }

    impl Drop for FailingReader {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_temp_dir_naming() {
        let root = tempfile::tempdir().unwrap();
        let dir = create_temp_dir(root.path(), "demo_native_libraries").unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.parent().unwrap(), root.path());

        let name = dir.file_name().unwrap().to_str().unwrap();
        let rest = name.strip_prefix("demo_native_libraries-").unwrap();
        let (millis, attempt) = rest.split_once('-').unwrap();
        assert!(millis.parse::<u128>().is_ok());
        assert_eq!(attempt, "0");
    }

    #[test]
    fn test_collisions_use_next_suffix() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("base-0")).unwrap();
        fs::create_dir(root.path().join("base-1")).unwrap();

        let dir = create_numbered_dir(root.path(), "base-").unwrap();
        assert_eq!(dir, root.path().join("base-2"));
    }

    #[test]
    fn test_exhausted_attempts() {
        let root = tempfile::tempdir().unwrap();
        for attempt in 0..MAX_ATTEMPTS {
            fs::create_dir(root.path().join(format!("full-{}", attempt))).unwrap();
        }

        match create_numbered_dir(root.path(), "full-") {
            Err(Error::TempDirExhausted { pattern, attempts }) => {
                assert_eq!(pattern, root.path().join("full-"));
                assert_eq!(attempts, MAX_ATTEMPTS);
            }
            other => panic!("expected TempDirExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_copy_stream_spans_buffers() {
        let mut data = vec![0u8; BUFFER_SIZE * 2 + 17];
        rand::rng().fill_bytes(&mut data);

        let mut out = Vec::new();
        let copied = copy_stream(&mut data.as_slice(), &mut out).unwrap();
        assert_eq!(copied, data.len() as u64);
        assert_eq!(out, data);
    }

    #[test]
    fn test_extract_keep() {
        let root = tempfile::tempdir().unwrap();
        let mut data = vec![0u8; 4096];
        rand::rng().fill_bytes(&mut data);

        let extracted = extract(
            Box::new(data.as_slice()),
            root.path(),
            "demo",
            "libdemo.so",
            Retention::Keep,
        )
        .unwrap();

        assert_eq!(extracted.bytes(), 4096);
        assert_eq!(extracted.path(), extracted.dir().join("libdemo.so"));
        assert_eq!(fs::read(extracted.path()).unwrap(), data);
        assert_eq!(fs::read_dir(extracted.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_extract_failure_closes_stream_and_file() {
        let root = tempfile::tempdir().unwrap();
        let dropped = Arc::new(AtomicBool::new(false));
        let reader = FailingReader {
            data: vec![7u8; 1000],
            interrupt_first: true,
            dropped: Arc::clone(&dropped),
        };

        let err = extract(
            Box::new(reader),
            root.path(),
            "demo",
            "libdemo.so",
            Retention::Keep,
        )
        .unwrap_err();

        assert!(dropped.load(Ordering::SeqCst));
        let path = match err {
            Error::Extraction { path, source } => {
                assert_eq!(source.to_string(), "device removed");
                path
            }
            other => panic!("expected Extraction, got {:?}", other),
        };

        // Partial copy is on disk and no handle keeps it open.
        assert_eq!(fs::metadata(&path).unwrap().len(), 1000);
        fs::remove_file(&path).unwrap();
        fs::remove_dir(path.parent().unwrap()).unwrap();
    }
}
