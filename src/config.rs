use camino::{Utf8Path, Utf8PathBuf};

use crate::bus::BusTiming;
use crate::regs::DEFAULT_BASE_ADDRESS;

pub const DEFAULT_TRACE_PATH: &str = "obj_dir/dft_top.vcd";

/// Waveform output, decided at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    pub enabled: bool,
    pub path: Utf8PathBuf,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: Utf8PathBuf::from(DEFAULT_TRACE_PATH),
        }
    }
}

impl TraceConfig {
    /// Same settings, writing to `<stem>_<suffix>.<ext>` instead.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let stem = self.path.file_stem().unwrap_or("trace");
        let name = match self.path.extension() {
            Some(ext) => format!("{stem}_{suffix}.{ext}"),
            None => format!("{stem}_{suffix}"),
        };
        Self {
            enabled: self.enabled,
            path: self
                .path
                .parent()
                .map_or_else(|| Utf8PathBuf::from(&name), |dir| dir.join(&name)),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Base of the core's register window.
    pub base_address: u32,
    pub bus: BusTiming,
    /// Cycles to poll for valid output after a start pulse.
    pub valid_timeout: u64,
    pub reset_cycles: u32,
    pub trace: TraceConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_address: DEFAULT_BASE_ADDRESS,
            bus: BusTiming::default(),
            valid_timeout: 100_000,
            reset_cycles: 100,
            trace: TraceConfig::default(),
        }
    }
}
