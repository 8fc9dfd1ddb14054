//! Small helpers for turning record bytes into text.
//!

use bytes::Bytes;
use std::str::Utf8Error;

/// Borrow a [`Bytes`] slice as a `&str`.
///
/// Returns an error if the slice contains invalid UTF-8.
#[inline]
pub fn str_from_bytes(buf: &Bytes) -> Result<&str, Utf8Error> {
    std::str::from_utf8(buf.as_ref())
}

/// Render bytes for diagnostics, replacing invalid UTF-8 sequences.
pub fn lossy_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf).into_owned()
}
