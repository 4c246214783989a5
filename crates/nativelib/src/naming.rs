// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};

/// Maps a logical library name to the platform's shared library file name.
///
/// The same name is used to search the system path and to look up the
/// resource in a bundle.
///
/// # Examples
/// ```
/// let name = nativelib::naming::library_filename("vw_jni");
/// #[cfg(target_os = "linux")]
/// assert_eq!(name, "libvw_jni.so");
/// #[cfg(target_os = "macos")]
/// assert_eq!(name, "libvw_jni.dylib");
/// #[cfg(windows)]
/// assert_eq!(name, "vw_jni.dll");
/// ```
pub fn library_filename(name: &str) -> String {
    format!("{}{}{}", DLL_PREFIX, name, DLL_SUFFIX)
}

/// Environment variable prefix for a library, `vw_jni` becomes `VW_JNI`.
pub fn env_prefix(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Default prefix of the temporary directories holding extracted copies.
pub fn temp_dir_prefix(name: &str) -> String {
    format!("{}_native_libraries", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_filename() {
        let name = library_filename("vw_jni");
        #[cfg(target_os = "linux")]
        assert_eq!(name, "libvw_jni.so");
        #[cfg(target_os = "macos")]
        assert_eq!(name, "libvw_jni.dylib");
        #[cfg(windows)]
        assert_eq!(name, "vw_jni.dll");
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(env_prefix("vw_jni"), "VW_JNI");
        assert_eq!(env_prefix("foo-bar.2"), "FOO_BAR_2");
    }

    #[test]
    fn test_temp_dir_prefix() {
        assert_eq!(temp_dir_prefix("vw_jni"), "vw_jni_native_libraries");
    }
}
