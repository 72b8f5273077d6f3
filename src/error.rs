use camino::Utf8PathBuf;
use thiserror::Error;

use crate::bus::BusOp;

/// Everything that can stop a harness run. Data mismatches are not errors;
/// they are folded into the [`Verifier`](crate::verify::Verifier) verdict.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("no acknowledge for {op} at {address:#010x} after {cycles} cycles")]
    AckTimeout { op: BusOp, address: u32, cycles: u64 },

    #[error("acknowledge still high {cycles} cycles after {op} at {address:#010x}")]
    AckStuck { op: BusOp, address: u32, cycles: u64 },

    #[error("output never became valid within {cycles} cycles")]
    ValidTimeout { cycles: u64 },

    #[error("waveform trace {path}: {source}")]
    Trace {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("test vector file {path}: {source}")]
    VectorFile {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("test vector file {path}: {source}")]
    VectorFormat {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("test case `{case}`: {reason}")]
    VectorShape { case: String, reason: String },

    #[error("harness task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("device setup: {0}")]
    Device(String),
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
