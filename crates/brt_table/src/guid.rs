//! Instance GUID stored in the Guid and CompressedStrings headers.
//!
//! The on-disk bytes use the mixed-endian layout of a Windows `GUID`: the first three groups
//! (4, 2 and 2 bytes) are stored byte-reversed, the last two groups (2 and 6 bytes) are stored
//! in order. [`Guid`] keeps the raw bytes so writing always reproduces the input exactly, and
//! converts to the canonical `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` form for display.

use std::{fmt, str::FromStr};

use derive_more::derive::{AsRef, Constructor};
use serde::{Deserialize, Serialize};

use crate::error::Error;

const GROUPS: [(usize, usize, bool); 5] = [
    (0, 4, true),
    (4, 2, true),
    (6, 2, true),
    (8, 2, false),
    (10, 6, false),
];

/// A 16 byte identifier in its on-disk byte order
#[derive(Constructor, AsRef, Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Guid([u8; 16]);

impl Guid {
    /// Size of the GUID on disk
    pub const SIZE: usize = 16;

    /// The raw bytes as stored in the file
    pub fn to_bytes(self) -> [u8; 16] {
        self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (start, length, swapped)) in GROUPS.into_iter().enumerate() {
            if index > 0 {
                f.write_str("-")?;
            }
            let group = &self.0[start..start + length];
            if swapped {
                group.iter().rev().try_for_each(|b| write!(f, "{b:02x}"))?;
            } else {
                group.iter().try_for_each(|b| write!(f, "{b:02x}"))?;
            }
        }
        Ok(())
    }
}

impl FromStr for Guid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidGuid(s.to_owned());

        let groups = s.trim().split('-').collect::<Vec<_>>();
        if groups.len() != GROUPS.len() {
            return Err(invalid());
        }

        let mut bytes = [0u8; 16];
        for (text, (start, length, swapped)) in groups.into_iter().zip(GROUPS) {
            if text.len() != length * 2 || !text.is_ascii() {
                return Err(invalid());
            }

            let mut group = (0..length)
                .map(|i| u8::from_str_radix(&text[i * 2..i * 2 + 2], 16).map_err(|_| invalid()))
                .collect::<Result<Vec<_>, _>>()?;
            if swapped {
                group.reverse();
            }
            bytes[start..start + length].copy_from_slice(&group);
        }

        Ok(Guid(bytes))
    }
}

impl TryFrom<String> for Guid {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Guid> for String {
    fn from(value: Guid) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::Result;
    use crate::guid::Guid;

    #[rustfmt::skip]
    const RAW: [u8; 16] = [
        0x33, 0x22, 0x11, 0x00,
        0x55, 0x44,
        0x77, 0x66,
        0x88, 0x99,
        0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
    ];

    #[test]
    fn display_swizzles_leading_groups() {
        let guid = Guid::new(RAW);
        assert_eq!(guid.to_string(), "00112233-4455-6677-8899-aabbccddeeff");
    }

    #[test]
    fn parse_restores_raw_bytes() -> Result<()> {
        let guid: Guid = "00112233-4455-6677-8899-AABBCCDDEEFF".parse()?;
        assert_eq!(guid.to_bytes(), RAW);
        Ok(())
    }

    #[test]
    fn bytes_survive_display_and_parse() -> Result<()> {
        let samples: [[u8; 16]; 3] = [[0; 16], [0xFF; 16], RAW];
        for raw in samples {
            let parsed: Guid = Guid::new(raw).to_string().parse()?;
            assert_eq!(parsed.to_bytes(), raw);
        }

        let mut raw = [0u8; 16];
        for seed in 0..=255u8 {
            raw.iter_mut()
                .enumerate()
                .for_each(|(i, b)| *b = seed.wrapping_mul(31).wrapping_add(i as u8 * 17));
            let parsed: Guid = Guid::new(raw).to_string().parse()?;
            assert_eq!(parsed.to_bytes(), raw);
        }

        Ok(())
    }

    #[test]
    fn reject_malformed() {
        assert!("".parse::<Guid>().is_err());
        assert!("00112233-4455-6677-8899".parse::<Guid>().is_err());
        assert!("0011223-34455-6677-8899-aabbccddeeff".parse::<Guid>().is_err());
        assert!("0011223g-4455-6677-8899-aabbccddeeff".parse::<Guid>().is_err());
    }

    #[test]
    fn serializes_as_string() -> Result<()> {
        let guid = Guid::new(RAW);
        let json = serde_json::to_string(&guid)?;
        assert_eq!(json, "\"00112233-4455-6677-8899-aabbccddeeff\"");
        assert_eq!(serde_json::from_str::<Guid>(&json)?, guid);
        Ok(())
    }
}
