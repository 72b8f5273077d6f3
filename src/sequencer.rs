//! Register-level driver for the transform core: load, start, poll, fetch.

use log::{debug, info};

use crate::bus::{BusTiming, WishboneMaster};
use crate::device::WishboneDevice;
use crate::error::{HarnessError, Result};
use crate::regs::Register;
use crate::sample::SampleQuad;
use crate::testbench::Testbench;
use crate::vectors::TestCase;
use crate::verify::Verifier;

#[derive(Debug)]
pub struct DftDriver<'tb, D> {
    bus: WishboneMaster<'tb, D>,
    base: u32,
    valid_timeout: u64,
}

impl<'tb, D: WishboneDevice> DftDriver<'tb, D> {
    pub fn new(tb: &'tb mut Testbench<D>, base: u32, timing: BusTiming, valid_timeout: u64) -> Self {
        Self::from_bus(WishboneMaster::new(tb, timing), base, valid_timeout)
    }

    pub fn from_bus(bus: WishboneMaster<'tb, D>, base: u32, valid_timeout: u64) -> Self {
        Self {
            bus,
            base,
            valid_timeout,
        }
    }

    pub fn bus(&mut self) -> &mut WishboneMaster<'tb, D> {
        &mut self.bus
    }

    fn write(&mut self, reg: Register, data: u32) -> Result<()> {
        self.bus.write(reg.address(self.base), data)
    }

    fn read(&mut self, reg: Register) -> Result<u32> {
        self.bus.read(reg.address(self.base))
    }

    /// Strobe registers are edge-triggered: 1 then 0.
    fn pulse(&mut self, reg: Register) -> Result<()> {
        self.write(reg, 1)?;
        self.write(reg, 0)
    }

    /// Nonzero `READ_ADDR` means the last computation has completed.
    pub fn is_ready(&mut self) -> Result<bool> {
        Ok(self.read(Register::ReadAddr)? != 0)
    }

    pub fn start(&mut self) -> Result<()> {
        self.pulse(Register::Control)
    }

    /// Stage both words of slot `index` and commit each with a load strobe.
    pub fn load_sample(&mut self, index: u16, quad: SampleQuad) -> Result<()> {
        self.write(Register::WriteDataLo, quad.low_word())?;
        self.write(Register::WriteAddr, u32::from(index))?;
        self.pulse(Register::LoadStrobe)?;

        self.write(Register::WriteDataHi, quad.high_word())?;
        self.write(Register::WriteAddr, u32::from(index))?;
        self.pulse(Register::LoadStrobe)
    }

    pub fn fetch_sample(&mut self, index: u16) -> Result<SampleQuad> {
        self.write(Register::ReadAddr, u32::from(index))?;
        let lo = self.read(Register::ReadDataLo)?;
        let hi = self.read(Register::ReadDataHi)?;
        Ok(SampleQuad::from_words(lo, hi))
    }

    /// Poll until the core reports valid output, one cycle between polls.
    pub fn wait_for_valid_output(&mut self) -> Result<()> {
        let started = self.bus.testbench().cycles();
        while !self.is_ready()? {
            let waited = self.bus.testbench().cycles() - started;
            if waited >= self.valid_timeout {
                return Err(HarnessError::ValidTimeout { cycles: waited });
            }
            self.bus.testbench().advance(1)?;
        }
        debug!(
            "Output valid after {} cycles",
            self.bus.testbench().cycles() - started
        );
        Ok(())
    }

    pub fn load_block(&mut self, inputs: &[SampleQuad]) -> Result<()> {
        for (index, quad) in (0u16..).zip(inputs) {
            self.load_sample(index, *quad)?;
        }
        Ok(())
    }

    pub fn fetch_block(&mut self, slots: usize) -> Result<Vec<SampleQuad>> {
        (0u16..).take(slots).map(|index| self.fetch_sample(index)).collect()
    }

    /// Load the case's inputs, run the core once and check every output
    /// slot against the golden block.
    pub fn run_case(&mut self, case: &TestCase, verifier: &mut Verifier) -> Result<()> {
        info!("Loading {} input slots for `{}`", case.inputs.len(), case.name);
        self.load_block(&case.inputs)?;
        self.start()?;
        self.wait_for_valid_output()?;
        self.bus.testbench().advance(1)?;

        verifier.begin_case(&case.name);
        for (index, expected) in (0u16..).zip(&case.golden) {
            let actual = self.fetch_sample(index)?;
            verifier.compare(usize::from(index), expected, &actual);
        }
        Ok(())
    }
}
