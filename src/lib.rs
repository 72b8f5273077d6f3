pub mod bus;
pub mod config;
pub mod device;
pub mod error;
pub mod harness;
pub mod model;
pub mod regs;
pub mod sample;
pub mod sequencer;
pub mod testbench;
pub mod trace;
pub mod vectors;
pub mod verify;
#[cfg(feature = "verilator")]
pub mod verilated;

pub use bus::{BusOp, BusTiming, Transaction, WishboneMaster};
pub use config::{HarnessConfig, TraceConfig};
pub use device::{BusPorts, WishboneDevice};
pub use error::{HarnessError, Result};
pub use harness::{run_parallel, Harness};
pub use model::{DftModel, ModelConfig};
pub use regs::Register;
pub use sample::{pack, unpack, SampleQuad};
pub use sequencer::DftDriver;
pub use testbench::Testbench;
pub use vectors::{TestCase, VectorSet, SLOTS};
pub use verify::{Mismatch, Verdict, Verifier};
