//! Diagnostic hex codec.
//!
//! Byte payloads are logged as uppercase, dash-separated hex pairs
//! (`[0x1A, 0x2B]` <-> `"1A-2B"`). Encoding never fails; decoding
//! validates that every dash-separated group is exactly one hex pair.

use crate::{Result, error::Error};

/// Encode bytes as uppercase dash-separated hex pairs.
///
/// Produces no trailing dash; an empty slice encodes to an empty string.
///
/// # Examples
///
/// ```
/// use gattlink_core::hex;
///
/// assert_eq!(hex::encode(&[0x1A, 0x2B]), "1A-2B");
/// assert_eq!(hex::encode(&[]), "");
/// ```
pub fn encode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join("-")
}

/// Decode a dash-separated hex string back into bytes.
///
/// Accepts both cases; the empty string decodes to an empty vector.
///
/// # Errors
/// Returns `Error::InvalidHex` if any dash-separated group is not exactly
/// two hex digits.
///
/// # Examples
///
/// ```
/// use gattlink_core::hex;
///
/// assert_eq!(hex::decode("1A-2B").unwrap(), vec![0x1A, 0x2B]);
/// assert!(hex::decode("1A-2").is_err());
/// ```
pub fn decode(input: &str) -> Result<Vec<u8>> {
    if input.is_empty() {
        return Ok(Vec::new());
    }

    input
        .split('-')
        .map(|pair| {
            if pair.len() != 2 || !pair.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(Error::InvalidHex(format!("bad group {pair:?}")));
            }
            u8::from_str_radix(pair, 16).map_err(|_| Error::InvalidHex(format!("bad group {pair:?}")))
        })
        .collect()
}
