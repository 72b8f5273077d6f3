//! Verilator-backed device: the real RTL top, loaded at run time.

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use marlin::verilator::{
    DynamicVerilatedModel, PortDirection, VerilatedModelConfig, VerilatorRuntime,
    VerilatorRuntimeOptions, VerilatorValue,
};

use crate::device::WishboneDevice;
use crate::error::{HarnessError, Result};

const CLOCK: &str = "wb_clk_i";
const ADDRESS: &str = "wb_adr_i";
const DATA_IN: &str = "wb_dat_i";
const DATA_OUT: &str = "wb_dat_o";
const WRITE_ENABLE: &str = "wb_we_i";
const STROBE: &str = "wb_stb_i";
const ACKNOWLEDGE: &str = "wb_ack_o";

/// Where to find the RTL and where Verilator may build it.
#[derive(Debug, Clone)]
pub struct RtlSource {
    pub top: String,
    pub files: Vec<Utf8PathBuf>,
    pub include_dirs: Vec<Utf8PathBuf>,
    pub artifacts: Utf8PathBuf,
}

pub fn create_runtime(rtl: &RtlSource) -> Result<VerilatorRuntime> {
    let src_files: Vec<&Utf8Path> = rtl.files.iter().map(|p| p.as_path()).collect();
    let include_paths: Vec<&Utf8Path> = rtl.include_dirs.iter().map(|p| p.as_path()).collect();

    VerilatorRuntime::new(
        &rtl.artifacts,
        &src_files,
        &include_paths,
        [],
        VerilatorRuntimeOptions::default_logging(),
    )
    .map_err(|e| HarnessError::Device(format!("Failed to create runtime: {e}")))
}

/// Bus ports of a verilated top. Outputs are sampled after every `eval`.
///
/// The setters cannot fail, so the first rejected pin is held in `fault` and
/// returned by the next `eval`.
pub struct VerilatedDevice<'ctx> {
    model: DynamicVerilatedModel<'ctx>,
    data_out: u32,
    acknowledge: bool,
    fault: Option<HarnessError>,
}

impl std::fmt::Debug for VerilatedDevice<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerilatedDevice")
            .field("data_out", &self.data_out)
            .field("acknowledge", &self.acknowledge)
            .field("fault", &self.fault)
            .finish()
    }
}

impl<'ctx> VerilatedDevice<'ctx> {
    pub fn new(runtime: &'ctx VerilatorRuntime, rtl: &RtlSource) -> Result<Self> {
        let top_file = rtl
            .files
            .first()
            .ok_or_else(|| HarnessError::Device(String::from("no RTL files given")))?;
        let model = runtime
            .create_dyn_model(
                &rtl.top,
                top_file.as_str(),
                &[
                    (CLOCK, 0, 0, PortDirection::Input),
                    (ADDRESS, 31, 0, PortDirection::Input),
                    (DATA_IN, 31, 0, PortDirection::Input),
                    (WRITE_ENABLE, 0, 0, PortDirection::Input),
                    (STROBE, 0, 0, PortDirection::Input),
                    (DATA_OUT, 31, 0, PortDirection::Output),
                    (ACKNOWLEDGE, 0, 0, PortDirection::Output),
                ],
                VerilatedModelConfig::default(),
            )
            .map_err(|e| HarnessError::Device(format!("Failed to create model: {e:?}")))?;
        info!("Verilated `{}` from {}", rtl.top, top_file);

        let mut device = Self {
            model,
            data_out: 0,
            acknowledge: false,
            fault: None,
        };
        // Every port must accept a value and every output must read back
        // before the first clock edge.
        for port in [CLOCK, WRITE_ENABLE, STROBE] {
            device.try_pin_u8(port, false)?;
        }
        for port in [ADDRESS, DATA_IN] {
            device.try_pin_u32(port, 0)?;
        }
        device.model.eval();
        device.sample()?;
        Ok(device)
    }

    fn try_pin_u8(&mut self, port: &str, value: bool) -> Result<()> {
        self.model
            .pin(port, u8::from(value))
            .map_err(|e| HarnessError::Device(format!("pin {port}: {e:?}")))
    }

    fn try_pin_u32(&mut self, port: &str, value: u32) -> Result<()> {
        self.model
            .pin(port, value)
            .map_err(|e| HarnessError::Device(format!("pin {port}: {e:?}")))
    }

    fn pin_u8(&mut self, port: &str, value: bool) {
        if let Err(e) = self.try_pin_u8(port, value) {
            self.fault.get_or_insert(e);
        }
    }

    fn pin_u32(&mut self, port: &str, value: u32) {
        if let Err(e) = self.try_pin_u32(port, value) {
            self.fault.get_or_insert(e);
        }
    }

    fn read_u32(&self, port: &str) -> Result<u32> {
        let value = self
            .model
            .read(port)
            .map_err(|e| HarnessError::Device(format!("read {port}: {e:?}")))?;
        match value {
            VerilatorValue::CData(v) => Ok(u32::from(v)),
            VerilatorValue::SData(v) => Ok(u32::from(v)),
            VerilatorValue::IData(v) => Ok(v),
            VerilatorValue::QData(v) => Ok(v as u32),
            _ => Err(HarnessError::Device(format!("{port} is wider than 64 bits"))),
        }
    }

    fn sample(&mut self) -> Result<()> {
        self.data_out = self.read_u32(DATA_OUT)?;
        self.acknowledge = self.read_u32(ACKNOWLEDGE)? != 0;
        Ok(())
    }
}

impl WishboneDevice for VerilatedDevice<'_> {
    fn set_clock(&mut self, high: bool) {
        self.pin_u8(CLOCK, high);
    }

    fn set_address(&mut self, address: u32) {
        self.pin_u32(ADDRESS, address);
    }

    fn set_data_in(&mut self, data: u32) {
        self.pin_u32(DATA_IN, data);
    }

    fn set_write_enable(&mut self, enable: bool) {
        self.pin_u8(WRITE_ENABLE, enable);
    }

    fn set_strobe(&mut self, active: bool) {
        self.pin_u8(STROBE, active);
    }

    fn data_out(&self) -> u32 {
        self.data_out
    }

    fn acknowledge(&self) -> bool {
        self.acknowledge
    }

    fn eval(&mut self) -> Result<()> {
        if let Some(fault) = self.fault.take() {
            return Err(fault);
        }
        self.model.eval();
        self.sample()
    }
}
