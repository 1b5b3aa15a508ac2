//! Single-byte legacy text decoding.
//!
//! Strings inside `.rip` captures and the dumped shader listings are written
//! in the DOS code page 437, not UTF-8.

use codepage_437::{FromCp437, CP437_CONTROL};

/// Decode code page 437 bytes into a `String`.
///
/// Bytes below 0x20 are treated as ASCII control characters, so plain ASCII
/// text (including newlines and tabs) decodes unchanged.
pub fn decode_cp437(bytes: Vec<u8>) -> String {
    String::from_cp437(bytes, &CP437_CONTROL)
}
