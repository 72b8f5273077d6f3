//! Clock and time base for a single device under test.

use log::{debug, info};

use crate::device::{BusPorts, WishboneDevice};
use crate::error::Result;
use crate::trace::VcdTracer;

/// Exclusive owner of the device handle. Every bus signal goes through here
/// so the waveform trace sees exactly what the device saw.
#[derive(Debug)]
pub struct Testbench<D> {
    device: D,
    ports: BusPorts,
    /// Half-period ticks since construction.
    time: u64,
    tracer: Option<VcdTracer>,
}

impl<D: WishboneDevice> Testbench<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            ports: BusPorts::default(),
            time: 0,
            tracer: None,
        }
    }

    pub fn with_tracer(mut self, tracer: VcdTracer) -> Self {
        info!("Tracing bus signals to {}", tracer.path());
        self.tracer = Some(tracer);
        self
    }

    /// Drive every input low and clock the device for `cycles`.
    pub fn reset(&mut self, cycles: u32) -> Result<()> {
        self.ports.clock = false;
        self.device.set_clock(false);
        self.set_data_in(0);
        self.set_write_enable(false);
        self.set_address(0);
        self.set_strobe(false);
        self.device.eval()?;
        self.advance(cycles)?;
        println!("Reset complete");
        debug!("Reset held for {cycles} cycles");
        Ok(())
    }

    /// Run the clock for `cycles` full periods, evaluating the device after
    /// every edge.
    pub fn advance(&mut self, cycles: u32) -> Result<()> {
        for _ in 0..cycles {
            self.half_period()?;
            self.half_period()?;
        }
        Ok(())
    }

    fn half_period(&mut self) -> Result<()> {
        self.ports.clock = !self.ports.clock;
        self.device.set_clock(self.ports.clock);
        self.device.eval()?;
        self.time += 1;
        if let Some(tracer) = self.tracer.as_mut() {
            let ports = BusPorts {
                data_out: self.device.data_out(),
                acknowledge: self.device.acknowledge(),
                ..self.ports
            };
            tracer.sample(self.time, &ports)?;
        }
        Ok(())
    }

    pub fn set_address(&mut self, address: u32) {
        self.ports.address = address;
        self.device.set_address(address);
    }

    pub fn set_data_in(&mut self, data: u32) {
        self.ports.data_in = data;
        self.device.set_data_in(data);
    }

    pub fn set_write_enable(&mut self, enable: bool) {
        self.ports.write_enable = enable;
        self.device.set_write_enable(enable);
    }

    pub fn set_strobe(&mut self, active: bool) {
        self.ports.strobe = active;
        self.device.set_strobe(active);
    }

    pub fn data_out(&self) -> u32 {
        self.device.data_out()
    }

    pub fn acknowledge(&self) -> bool {
        self.device.acknowledge()
    }

    /// Current driven inputs plus sampled outputs.
    pub fn ports(&self) -> BusPorts {
        BusPorts {
            data_out: self.device.data_out(),
            acknowledge: self.device.acknowledge(),
            ..self.ports
        }
    }

    /// Simulated time in half-period ticks.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Completed clock cycles.
    pub fn cycles(&self) -> u64 {
        self.time / 2
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Close the trace and hand the device back.
    pub fn finish(mut self) -> Result<D> {
        if let Some(tracer) = self.tracer.take() {
            tracer.close()?;
        }
        self.device.finish();
        debug!("Testbench finished at cycle {}", self.cycles());
        Ok(self.device)
    }
}
