//! Signal-level view of the device under test.

use crate::error::Result;

/// The Wishbone slave port of the transform core.
///
/// Inputs are latched by the setters and only take effect on the next
/// [`eval`](WishboneDevice::eval); outputs reflect the last evaluation.
pub trait WishboneDevice {
    fn set_clock(&mut self, high: bool);
    fn set_address(&mut self, address: u32);
    fn set_data_in(&mut self, data: u32);
    fn set_write_enable(&mut self, enable: bool);
    fn set_strobe(&mut self, active: bool);

    fn data_out(&self) -> u32;
    fn acknowledge(&self) -> bool;

    /// Settle the model after an input change. A backend that could not
    /// apply an input or sample an output reports it here.
    fn eval(&mut self) -> Result<()>;

    /// Called once when the testbench is torn down.
    fn finish(&mut self) {}
}

impl<D: WishboneDevice + ?Sized> WishboneDevice for Box<D> {
    fn set_clock(&mut self, high: bool) {
        (**self).set_clock(high)
    }

    fn set_address(&mut self, address: u32) {
        (**self).set_address(address)
    }

    fn set_data_in(&mut self, data: u32) {
        (**self).set_data_in(data)
    }

    fn set_write_enable(&mut self, enable: bool) {
        (**self).set_write_enable(enable)
    }

    fn set_strobe(&mut self, active: bool) {
        (**self).set_strobe(active)
    }

    fn data_out(&self) -> u32 {
        (**self).data_out()
    }

    fn acknowledge(&self) -> bool {
        (**self).acknowledge()
    }

    fn eval(&mut self) -> Result<()> {
        (**self).eval()
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}

/// Snapshot of every bus signal, as recorded in waveform traces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusPorts {
    pub clock: bool,
    pub address: u32,
    pub data_in: u32,
    pub data_out: u32,
    pub write_enable: bool,
    pub strobe: bool,
    pub acknowledge: bool,
}
