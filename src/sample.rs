//! Complex sample packing for the 32-bit data bus.

use serde::{Deserialize, Serialize};

/// Pack two 16-bit components into one bus word, `lo` in bits 0..16.
pub const fn pack(lo: u16, hi: u16) -> u32 {
    (hi as u32) << 16 | lo as u32
}

pub const fn unpack(word: u32) -> (u16, u16) {
    (word as u16, (word >> 16) as u16)
}

/// Two complex samples as they occupy one address slot of the core:
/// `[re0, im0, re1, im1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleQuad(pub [u16; 4]);

impl SampleQuad {
    pub const fn new(s0: u16, s1: u16, s2: u16, s3: u16) -> Self {
        Self([s0, s1, s2, s3])
    }

    pub const fn from_words(lo: u32, hi: u32) -> Self {
        let (s0, s1) = unpack(lo);
        let (s2, s3) = unpack(hi);
        Self([s0, s1, s2, s3])
    }

    /// Word carried by `WRITE_DATA_LO` / `READ_DATA_LO`.
    pub const fn low_word(&self) -> u32 {
        pack(self.0[0], self.0[1])
    }

    /// Word carried by `WRITE_DATA_HI` / `READ_DATA_HI`.
    pub const fn high_word(&self) -> u32 {
        pack(self.0[2], self.0[3])
    }

    /// The two complex points as signed (re, im) pairs.
    pub fn points(&self) -> [(i16, i16); 2] {
        let [a, b, c, d] = self.0;
        [(a as i16, b as i16), (c as i16, d as i16)]
    }
}

impl From<[u16; 4]> for SampleQuad {
    fn from(value: [u16; 4]) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SampleQuad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "[{a:#06x}, {b:#06x}, {c:#06x}, {d:#06x}]")
    }
}
