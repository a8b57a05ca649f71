//! FNV-1a 64 bit hashing used to key asset lookups.
//!
//! Hashes are computed over UTF-16 code units, one character code at a time, with optional
//! case folding applied to every character before it is mixed in.

use crate::error::{Error, Result};

const FNV_OFFSET: u64 = 0xCBF29CE484222325;
const FNV_PRIME: u64 = 0x100000001B3;

/// Case folding applied before hashing
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum CaseMode {
    /// Hash characters as they are
    #[default]
    Any,
    /// Lower case every character
    Lower,
    /// Upper case every character
    Upper,
}

/// Hash `text` with FNV-1a 64
pub fn hash64(text: &str, case: CaseMode) -> u64 {
    let mut units = [0u16; 2];
    text.chars()
        .flat_map(|c| -> Box<dyn Iterator<Item = char>> {
            match case {
                CaseMode::Any => Box::new(std::iter::once(c)),
                CaseMode::Lower => Box::new(c.to_lowercase()),
                CaseMode::Upper => Box::new(c.to_uppercase()),
            }
        })
        .fold(FNV_OFFSET, |hash, c| {
            c.encode_utf16(&mut units)
                .iter()
                .fold(hash, |hash, unit| (hash ^ *unit as u64).wrapping_mul(FNV_PRIME))
        })
}

/// Hex form of the eight on-disk bytes of `hash`
///
/// Lookups store the hash little-endian, so this is the numeric value byte-reversed.
pub fn hex_hash(hash: u64) -> String {
    format!("{:016x}", hash.swap_bytes())
}

/// Parse the hex form of the on-disk bytes back to the numeric hash
pub fn parse_hex_hash(hex: &str) -> Result<u64> {
    if hex.len() != 16 {
        return Err(Error::InvalidHash(hex.to_owned()));
    }
    u64::from_str_radix(hex, 16)
        .map(u64::swap_bytes)
        .map_err(|_| Error::InvalidHash(hex.to_owned()))
}

/// Parse the base-10 form of a hash
pub fn parse_hash(text: &str) -> Result<u64> {
    text.trim()
        .parse()
        .map_err(|_| Error::InvalidHash(text.to_owned()))
}
