//! Golden comparison and the aggregate pass/fail verdict.

use log::{debug, info};

use crate::sample::SampleQuad;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub case: String,
    pub index: usize,
    pub component: usize,
    pub expected: u16,
    pub actual: u16,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} slot {:02} component {}: expected {:#06x}, got {:#06x}",
            self.case, self.index, self.component, self.expected, self.actual
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn passed(self) -> bool {
        self == Verdict::Pass
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => f.write_str("PASS"),
            Verdict::Fail => f.write_str("FAIL"),
        }
    }
}

/// Folds every comparison into one verdict. A single mismatch fails the
/// run for good; later matches cannot undo it.
#[derive(Debug, Clone)]
pub struct Verifier {
    case: String,
    verdict: bool,
    compared: usize,
    mismatches: Vec<Mismatch>,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier {
    pub fn new() -> Self {
        Self {
            case: String::new(),
            verdict: true,
            compared: 0,
            mismatches: Vec::new(),
        }
    }

    /// Label subsequent mismatches with `name`.
    pub fn begin_case(&mut self, name: &str) {
        self.case = name.to_owned();
    }

    /// True iff all four components of `actual` equal `expected`.
    pub fn compare(&mut self, index: usize, expected: &SampleQuad, actual: &SampleQuad) -> bool {
        let mut ok = true;
        for (component, (&want, &got)) in expected.0.iter().zip(&actual.0).enumerate() {
            if want != got {
                let mismatch = Mismatch {
                    case: self.case.clone(),
                    index,
                    component,
                    expected: want,
                    actual: got,
                };
                println!("Mismatch: {mismatch}");
                self.mismatches.push(mismatch);
                ok = false;
            }
        }
        if ok {
            debug!("{} slot {index:02}: {actual}", self.case);
        }
        self.compared += 1;
        self.verdict &= ok;
        ok
    }

    pub fn verdict(&self) -> Verdict {
        if self.verdict {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    /// Samples compared so far.
    pub fn compared(&self) -> usize {
        self.compared
    }

    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    /// Append the results of a run that happened after this one.
    pub fn merge(&mut self, other: Verifier) {
        self.verdict &= other.verdict;
        self.compared += other.compared;
        self.mismatches.extend(other.mismatches);
    }

    /// Verdict line followed by one line per mismatching component.
    pub fn summary(&self) -> String {
        let verdict = self.verdict();
        let mut text = match verdict {
            Verdict::Pass => format!("Test {verdict}: {} samples matched", self.compared),
            Verdict::Fail => format!(
                "Test {verdict}: {} mismatching components across {} samples",
                self.mismatches.len(),
                self.compared
            ),
        };
        for mismatch in &self.mismatches {
            text.push_str("\n  ");
            text.push_str(&mismatch.to_string());
        }
        text
    }

    /// Print the final outcome. Never fails; the caller decides what a
    /// failing verdict means for the process.
    pub fn report_verdict(&self) -> Verdict {
        let verdict = self.verdict();
        println!("{}", self.summary());
        info!("Verdict {verdict}");
        verdict
    }
}
