//! Byte-order transforms shared with the HiTag2 reference tooling.
//!
//! Three conventions stack on top of each other in the classic toolchain and
//! every one of them must be reproduced bit-exactly or keys and nonce files
//! from other implementations become garbage:
//!   - `rev*`: reverse the bits *within each byte* of a value;
//!   - `byte_swap6`: reverse the byte order of a 48-bit value;
//!   - "hex reversed" parsing: 8 hex chars read as byte pairs, LSB first.

use crate::error::Error;

/// Reverse the bits within each byte of a 32-bit value.
#[inline]
pub fn rev32(x: u32) -> u32 {
    // Reversing the whole word reverses both bit and byte order; swapping
    // the bytes back leaves only the per-byte bit reversal.
    x.reverse_bits().swap_bytes()
}

/// Reverse the bits within each byte of a 64-bit value.
#[inline]
pub fn rev64(x: u64) -> u64 {
    x.reverse_bits().swap_bytes()
}

/// Reverse the byte order of a 48-bit value.
#[inline]
pub fn byte_swap6(x: u64) -> u64 {
    (x & 0xFFFF_FFFF_FFFF).swap_bytes() >> 16
}

/// Parse 8 hex chars as byte pairs LSB-first: `"12345678"` -> `0x78563412`.
pub fn hex_reversed_to_u32(s: &str) -> Result<u32, Error> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::invalid_input(format!(
            "expected 8 hex chars, got {:?}",
            s
        )));
    }
    let v = u32::from_str_radix(s, 16)
        .map_err(|_| Error::invalid_input(format!("bad hex value {:?}", s)))?;
    Ok(v.swap_bytes())
}

/// Parse a 32-bit UID / IV / authenticator from its 8-hex-char file form.
pub fn hex32_to_internal(s: &str) -> Result<u32, Error> {
    Ok(rev32(hex_reversed_to_u32(s)?))
}

/// Format a 32-bit internal value back to its 8-hex-char file form.
pub fn internal32_to_hex(v: u32) -> String {
    format!("{:08X}", rev32(v).swap_bytes())
}

/// Decode one nonce-file line: `<IV_HEX> <AUTH_HEX>`.
///
/// The authenticator on the wire is the bit-inverse of the first 32
/// keystream bits, so the returned pair is already `(iv, keystream)` in
/// internal form.
pub fn parse_nonce_line(line: &str) -> Result<(u32, u32), Error> {
    let mut fields = line.split_ascii_whitespace();
    let (Some(a), Some(b), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(Error::invalid_input(format!(
            "expected \"IV AUTH\", got {:?}",
            line
        )));
    };
    let iv = hex32_to_internal(a)?;
    let ks = hex32_to_internal(b)? ^ 0xFFFF_FFFF;
    Ok((iv, ks))
}

/// Encode one nonce-file line from internal `(iv, keystream)` form.
pub fn format_nonce_line(iv: u32, ks: u32) -> String {
    format!(
        "{} {}",
        internal32_to_hex(iv),
        internal32_to_hex(ks ^ 0xFFFF_FFFF)
    )
}
