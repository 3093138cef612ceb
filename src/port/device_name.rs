//! Device name normalization.
//!
//! Windows only resolves `COM1`..`COM9` by their short name; higher ports
//! must be addressed through the `\\.\` device namespace. POSIX paths are
//! used as given.

use std::borrow::Cow;

/// Prefix of the Win32 device namespace.
pub const WINDOWS_DEVICE_PREFIX: &str = r"\\.\";

/// Rewrite a short Windows port name (`COM12`) into its device path
/// (`\\.\COM12`). Names already starting with a backslash are left alone.
pub fn windows_device_path(name: &str) -> Cow<'_, str> {
    if name.starts_with('\\') {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{WINDOWS_DEVICE_PREFIX}{name}"))
    }
}

/// POSIX device paths need no rewriting.
pub fn posix_device_path(name: &str) -> Cow<'_, str> {
    Cow::Borrowed(name)
}

/// Normalize `name` for the platform this crate was built for.
pub fn normalize_device_name(name: &str) -> Cow<'_, str> {
    if cfg!(windows) {
        windows_device_path(name)
    } else {
        posix_device_path(name)
    }
}
