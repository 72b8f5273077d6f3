//! Behavioral stand-in for the DFT core's Wishbone wrapper.
//!
//! The model reproduces the register interface cycle by cycle: acknowledge
//! after a fixed number of rising edges, edge-triggered load and start
//! strobes, a valid flag behind `READ_ADDR`, and output slots selected by the
//! last `READ_ADDR` write. The transform itself is a plain integer DFT, good
//! enough to regenerate the golden tables.

use std::f64::consts::PI;

use log::{debug, trace};

use crate::device::WishboneDevice;
use crate::error::Result;
use crate::regs::{Register, DEFAULT_BASE_ADDRESS};
use crate::sample::SampleQuad;
use crate::vectors::SLOTS;

/// Complex points per transform; each slot carries two.
pub const POINTS: usize = SLOTS * 2;

/// Twiddle factors are Q14.
const TWIDDLE_ONE: f64 = 16384.0;
/// Q14 product scaled by 1/64.
const OUTPUT_SHIFT: u32 = 14 + 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    pub base_address: u32,
    /// Rising edges between strobe and acknowledge; `None` never acknowledges.
    pub ack_latency: Option<u32>,
    /// Rising edges from start to valid output; `None` never completes.
    pub compute_latency: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_address: DEFAULT_BASE_ADDRESS,
            ack_latency: Some(2),
            compute_latency: Some(200),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DftModel {
    config: ModelConfig,

    clk: bool,
    prev_clk: bool,
    adr: u32,
    dat_i: u32,
    we: bool,
    stb: bool,

    dat_o: u32,
    ack: bool,
    wait: u32,

    control: u32,
    load: u32,
    write_addr: u32,
    write_lo: u32,
    write_hi: u32,
    read_addr: u32,

    inputs: [SampleQuad; SLOTS],
    pending: [SampleQuad; SLOTS],
    outputs: [SampleQuad; SLOTS],
    busy: Option<u32>,
    stalled: bool,
    valid: bool,

    starts: usize,
    commits: usize,
}

impl DftModel {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            clk: false,
            prev_clk: false,
            adr: 0,
            dat_i: 0,
            we: false,
            stb: false,
            dat_o: 0,
            ack: false,
            wait: 0,
            control: 0,
            load: 0,
            write_addr: 0,
            write_lo: 0,
            write_hi: 0,
            read_addr: 0,
            inputs: [SampleQuad::default(); SLOTS],
            pending: [SampleQuad::default(); SLOTS],
            outputs: [SampleQuad::default(); SLOTS],
            busy: None,
            stalled: false,
            valid: false,
            starts: 0,
            commits: 0,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Input slots as committed by load strobes.
    pub fn inputs(&self) -> &[SampleQuad; SLOTS] {
        &self.inputs
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Number of accepted start pulses.
    pub fn starts(&self) -> usize {
        self.starts
    }

    /// Number of accepted load strobes.
    pub fn commits(&self) -> usize {
        self.commits
    }

    fn rising_edge(&mut self) {
        if let Some(remaining) = self.busy {
            if remaining <= 1 {
                self.outputs = self.pending;
                self.valid = true;
                self.busy = None;
                debug!("Transform complete");
            } else {
                self.busy = Some(remaining - 1);
            }
        }

        if !self.stb {
            self.ack = false;
            self.wait = 0;
            return;
        }
        if self.ack {
            return;
        }
        let Some(latency) = self.config.ack_latency else {
            return;
        };
        if self.wait < latency {
            self.wait += 1;
            return;
        }

        if self.we {
            self.write_register(self.adr, self.dat_i);
        } else {
            self.dat_o = self.read_register(self.adr);
        }
        self.ack = true;
    }

    fn decode(&self, address: u32) -> Option<Register> {
        Register::from_offset(address.wrapping_sub(self.config.base_address))
    }

    fn write_register(&mut self, address: u32, data: u32) {
        match self.decode(address) {
            Some(Register::Control) => {
                let bit = data & 1;
                if bit == 1 && self.control == 0 {
                    self.start();
                }
                self.control = bit;
            }
            Some(Register::LoadStrobe) => {
                let bit = data & 1;
                if bit == 1 && self.load == 0 {
                    self.commit();
                }
                self.load = bit;
            }
            Some(Register::WriteAddr) => self.write_addr = data,
            Some(Register::WriteDataLo) => self.write_lo = data,
            Some(Register::WriteDataHi) => self.write_hi = data,
            Some(Register::ReadAddr) => self.read_addr = data,
            Some(reg @ (Register::ReadDataLo | Register::ReadDataHi)) => {
                trace!("Ignoring write to read-only {reg}");
            }
            None => trace!("Ignoring write to unmapped {address:#010x}"),
        }
    }

    fn read_register(&self, address: u32) -> u32 {
        let slot = self.read_addr as usize % SLOTS;
        match self.decode(address) {
            Some(Register::Control | Register::LoadStrobe) | None => 0,
            Some(Register::WriteAddr) => self.write_addr,
            Some(Register::WriteDataLo) => self.write_lo,
            Some(Register::WriteDataHi) => self.write_hi,
            Some(Register::ReadAddr) => self.valid as u32,
            Some(Register::ReadDataLo) => self.outputs[slot].low_word(),
            Some(Register::ReadDataHi) => self.outputs[slot].high_word(),
        }
    }

    fn commit(&mut self) {
        let slot = self.write_addr as usize % SLOTS;
        self.inputs[slot] = SampleQuad::from_words(self.write_lo, self.write_hi);
        self.commits += 1;
        trace!("Slot {slot} <- {}", self.inputs[slot]);
    }

    fn start(&mut self) {
        self.starts += 1;
        self.valid = false;
        self.pending = transform(&self.inputs);
        self.busy = self.config.compute_latency;
        self.stalled = self.busy.is_none();
        debug!("Transform started (run {})", self.starts);
    }
}

impl Default for DftModel {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

impl WishboneDevice for DftModel {
    fn set_clock(&mut self, high: bool) {
        self.clk = high;
    }

    fn set_address(&mut self, address: u32) {
        self.adr = address;
    }

    fn set_data_in(&mut self, data: u32) {
        self.dat_i = data;
    }

    fn set_write_enable(&mut self, enable: bool) {
        self.we = enable;
    }

    fn set_strobe(&mut self, active: bool) {
        self.stb = active;
    }

    fn data_out(&self) -> u32 {
        self.dat_o
    }

    fn acknowledge(&self) -> bool {
        self.ack
    }

    fn eval(&mut self) -> Result<()> {
        if self.clk && !self.prev_clk {
            self.rising_edge();
        }
        self.prev_clk = self.clk;
        Ok(())
    }

    fn finish(&mut self) {
        if self.stalled {
            debug!("Model finished with a transform that never completed");
        }
    }
}

fn twiddles() -> Vec<(i64, i64)> {
    (0..POINTS)
        .map(|m| {
            let angle = 2.0 * PI * m as f64 / POINTS as f64;
            (
                (TWIDDLE_ONE * angle.cos()).round() as i64,
                (-TWIDDLE_ONE * angle.sin()).round() as i64,
            )
        })
        .collect()
}

/// 64-point forward DFT over the slot layout, scaled by 1/64 and rounded
/// half up, truncated to 16 bits per component.
pub fn transform(inputs: &[SampleQuad; SLOTS]) -> [SampleQuad; SLOTS] {
    let points: Vec<(i64, i64)> = inputs
        .iter()
        .flat_map(|quad| quad.points())
        .map(|(re, im)| (re as i64, im as i64))
        .collect();
    let twiddles = twiddles();
    let round = 1i64 << (OUTPUT_SHIFT - 1);

    let bins: Vec<(u16, u16)> = (0..POINTS)
        .map(|k| {
            let (mut re, mut im) = (0i64, 0i64);
            for (n, &(xr, xi)) in points.iter().enumerate() {
                let (wr, wi) = twiddles[(n * k) % POINTS];
                re += xr * wr - xi * wi;
                im += xr * wi + xi * wr;
            }
            (
                ((re + round) >> OUTPUT_SHIFT) as u16,
                ((im + round) >> OUTPUT_SHIFT) as u16,
            )
        })
        .collect();

    std::array::from_fn(|j| {
        let (a, b) = bins[2 * j];
        let (c, d) = bins[2 * j + 1];
        SampleQuad::new(a, b, c, d)
    })
}
