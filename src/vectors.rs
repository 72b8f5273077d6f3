//! Test vector sets: input blocks paired with their golden outputs.

use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::sample::SampleQuad;

/// Address slots per block; each slot carries two complex samples.
pub const SLOTS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub inputs: Vec<SampleQuad>,
    pub golden: Vec<SampleQuad>,
}

impl TestCase {
    /// Slot `j` holds `offset + 4j .. offset + 4j + 3`, wrapping at 16 bits.
    pub fn ramp(name: impl Into<String>, offset: u16, golden: &[[u16; 4]]) -> Self {
        let inputs = (0..SLOTS as u16)
            .map(|j| {
                let base = offset.wrapping_add(4 * j);
                SampleQuad::new(
                    base,
                    base.wrapping_add(1),
                    base.wrapping_add(2),
                    base.wrapping_add(3),
                )
            })
            .collect();
        Self {
            name: name.into(),
            inputs,
            golden: golden.iter().copied().map(SampleQuad).collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let shape = |reason: String| HarnessError::VectorShape {
            case: self.name.clone(),
            reason,
        };
        if self.inputs.len() != SLOTS {
            return Err(shape(format!(
                "{} input slots, expected {SLOTS}",
                self.inputs.len()
            )));
        }
        if self.golden.len() != SLOTS {
            return Err(shape(format!(
                "{} golden slots, expected {SLOTS}",
                self.golden.len()
            )));
        }
        Ok(())
    }
}

/// Ordered table of test cases, run uniformly by the harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorSet {
    pub cases: Vec<TestCase>,
}

impl VectorSet {
    /// The two ramp cases the core ships with.
    pub fn builtin() -> Self {
        Self {
            cases: vec![
                TestCase::ramp("ramp", 0, &CASE0_GOLDEN),
                TestCase::ramp("ramp+128", 128, &CASE1_GOLDEN),
            ],
        }
    }

    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| HarnessError::VectorFile {
            path: path.to_owned(),
            source,
        })?;
        let set: Self =
            serde_json::from_str(&text).map_err(|source| HarnessError::VectorFormat {
                path: path.to_owned(),
                source,
            })?;
        set.validate()?;
        Ok(set)
    }

    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        let text =
            serde_json::to_string_pretty(self).map_err(|source| HarnessError::VectorFormat {
                path: path.to_owned(),
                source,
            })?;
        fs::write(path, text).map_err(|source| HarnessError::VectorFile {
            path: path.to_owned(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.cases.is_empty() {
            return Err(HarnessError::VectorShape {
                case: String::from("<set>"),
                reason: String::from("no test cases"),
            });
        }
        self.cases.iter().try_for_each(TestCase::validate)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

// 64-point DFT of the ramp inputs, scaled by 1/64.
pub const CASE0_GOLDEN: [[u16; 4]; SLOTS] = [
    [0x003F, 0x0040, 0xFFEB, 0x0013],
    [0xFFF5, 0x0009, 0xFFF8, 0x0006],
    [0xFFFA, 0x0004, 0xFFFB, 0x0003],
    [0xFFFC, 0x0002, 0xFFFC, 0x0002],
    [0xFFFD, 0x0001, 0xFFFD, 0x0001],
    [0xFFFD, 0x0001, 0xFFFD, 0x0001],
    [0xFFFE, 0x0000, 0xFFFE, 0x0000],
    [0xFFFE, 0x0000, 0xFFFE, 0x0000],
    [0xFFFE, 0x0000, 0xFFFE, 0x0000],
    [0xFFFE, 0x0000, 0xFFFE, 0x0000],
    [0xFFFE, 0x0000, 0xFFFE, 0x0000],
    [0xFFFE, 0x0000, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0x0000, 0xFFFE, 0x0000, 0xFFFE],
    [0x0000, 0xFFFE, 0x0000, 0xFFFE],
    [0x0000, 0xFFFE, 0x0000, 0xFFFE],
    [0x0000, 0xFFFE, 0x0000, 0xFFFE],
    [0x0000, 0xFFFE, 0x0000, 0xFFFE],
    [0x0000, 0xFFFE, 0x0001, 0xFFFD],
    [0x0001, 0xFFFD, 0x0001, 0xFFFD],
    [0x0001, 0xFFFD, 0x0002, 0xFFFC],
    [0x0002, 0xFFFC, 0x0003, 0xFFFB],
    [0x0004, 0xFFFA, 0x0006, 0xFFF8],
    [0x0009, 0xFFF5, 0x0013, 0xFFEB],
];

pub const CASE1_GOLDEN: [[u16; 4]; SLOTS] = [
    [0x00BF, 0x00C0, 0xFFEB, 0x0013],
    [0xFFF5, 0x0009, 0xFFF8, 0x0006],
    [0xFFFA, 0x0004, 0xFFFB, 0x0003],
    [0xFFFC, 0x0002, 0xFFFC, 0x0002],
    [0xFFFD, 0x0001, 0xFFFD, 0x0001],
    [0xFFFD, 0x0001, 0xFFFD, 0x0001],
    [0xFFFE, 0x0000, 0xFFFE, 0x0000],
    [0xFFFE, 0x0000, 0xFFFE, 0x0000],
    [0xFFFE, 0x0000, 0xFFFE, 0x0000],
    [0xFFFE, 0x0000, 0xFFFE, 0x0000],
    [0xFFFE, 0x0000, 0xFFFE, 0x0000],
    [0xFFFE, 0x0000, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF],
    [0x0000, 0xFFFE, 0x0000, 0xFFFE],
    [0x0000, 0xFFFE, 0x0000, 0xFFFE],
    [0x0000, 0xFFFE, 0x0000, 0xFFFE],
    [0x0000, 0xFFFE, 0x0000, 0xFFFE],
    [0x0000, 0xFFFE, 0x0000, 0xFFFE],
    [0x0000, 0xFFFE, 0x0001, 0xFFFD],
    [0x0001, 0xFFFD, 0x0001, 0xFFFD],
    [0x0001, 0xFFFD, 0x0002, 0xFFFC],
    [0x0002, 0xFFFC, 0x0003, 0xFFFB],
    [0x0004, 0xFFFA, 0x0006, 0xFFF8],
    [0x0009, 0xFFF5, 0x0013, 0xFFEB],
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::transform;

    #[test]
    fn ramp_inputs_are_arithmetic() {
        let set = VectorSet::builtin();
        assert_eq!(set.cases[0].inputs[0], SampleQuad::new(0, 1, 2, 3));
        assert_eq!(set.cases[0].inputs[31], SampleQuad::new(124, 125, 126, 127));
        assert_eq!(set.cases[1].inputs[0], SampleQuad::new(128, 129, 130, 131));
        assert_eq!(set.cases[1].inputs[31], SampleQuad::new(252, 253, 254, 255));
        set.validate().unwrap();
    }

    #[test]
    fn ramp_wraps_near_the_top_of_the_range() {
        let case = TestCase::ramp("wrap", 0xFFF0, &CASE0_GOLDEN);
        assert_eq!(case.inputs[0], SampleQuad::new(0xFFF0, 0xFFF1, 0xFFF2, 0xFFF3));
        assert_eq!(case.inputs[3], SampleQuad::new(0xFFFC, 0xFFFD, 0xFFFE, 0xFFFF));
        assert_eq!(case.inputs[4], SampleQuad::new(0, 1, 2, 3));
        assert_eq!(case.inputs[SLOTS - 1].0[3], 0x006F);
    }

    #[test]
    fn golden_tables_match_reference_transform() {
        for case in VectorSet::builtin().cases {
            let inputs: [SampleQuad; SLOTS] = case.inputs.clone().try_into().unwrap();
            assert_eq!(transform(&inputs).to_vec(), case.golden, "{}", case.name);
        }
    }

    #[test]
    fn short_case_is_rejected() {
        let mut set = VectorSet::builtin();
        set.cases[1].golden.pop();
        let err = set.validate().unwrap_err();
        assert!(matches!(err, HarnessError::VectorShape { ref case, .. } if case == "ramp+128"));
    }

    #[test]
    fn empty_set_is_rejected() {
        assert!(VectorSet { cases: Vec::new() }.validate().is_err());
    }
}
