//! Value change dump of the bus signal set.

use std::fs::{self, File};
use std::io::{BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};

use crate::device::BusPorts;
use crate::error::{HarnessError, Result};

const CLOCK: &str = "!";
const ADDRESS: &str = "\"";
const DATA_IN: &str = "#";
const DATA_OUT: &str = "$";
const WRITE_ENABLE: &str = "%";
const STROBE: &str = "&";
const ACKNOWLEDGE: &str = "'";

/// Writes one VCD scope holding the Wishbone signals, emitting only the
/// signals that changed since the previous sample.
pub struct VcdTracer {
    out: Box<dyn Write + Send>,
    path: Utf8PathBuf,
    last: Option<BusPorts>,
}

impl std::fmt::Debug for VcdTracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VcdTracer")
            .field("path", &self.path)
            .field("last", &self.last)
            .finish()
    }
}

impl VcdTracer {
    /// Create (or truncate) `path`, creating parent directories as needed.
    pub fn create(path: &Utf8Path, scope: &str) -> Result<Self> {
        let wrap = |source| HarnessError::Trace {
            path: path.to_owned(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        let file = File::create(path).map_err(wrap)?;
        Self::from_writer(BufWriter::new(file), path, scope)
    }

    /// Trace into an arbitrary sink; `label` is only used in error messages.
    pub fn from_writer<W: Write + Send + 'static>(
        writer: W,
        label: &Utf8Path,
        scope: &str,
    ) -> Result<Self> {
        let mut tracer = Self {
            out: Box::new(writer),
            path: label.to_owned(),
            last: None,
        };
        tracer.header(scope)?;
        Ok(tracer)
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn header(&mut self, scope: &str) -> Result<()> {
        let vars = [
            (1, CLOCK, "clock"),
            (32, ADDRESS, "address"),
            (32, DATA_IN, "data_in"),
            (32, DATA_OUT, "data_out"),
            (1, WRITE_ENABLE, "write_enable"),
            (1, STROBE, "strobe"),
            (1, ACKNOWLEDGE, "acknowledge"),
        ];
        let mut text = String::from("$timescale 1ns $end\n");
        text.push_str(&format!("$scope module {scope} $end\n"));
        for (width, id, name) in vars {
            text.push_str(&format!("$var wire {width} {id} {name} $end\n"));
        }
        text.push_str("$upscope $end\n$enddefinitions $end\n");
        self.emit(&text)
    }

    /// Record the signal values at `time`.
    pub fn sample(&mut self, time: u64, ports: &BusPorts) -> Result<()> {
        let prev = self.last;
        let changed = |f: fn(&BusPorts) -> u32| prev.map_or(true, |p| f(&p) != f(ports));

        let mut text = format!("#{time}\n");
        let scalars: [(fn(&BusPorts) -> u32, &str); 4] = [
            (|p: &BusPorts| p.clock as u32, CLOCK),
            (|p: &BusPorts| p.write_enable as u32, WRITE_ENABLE),
            (|p: &BusPorts| p.strobe as u32, STROBE),
            (|p: &BusPorts| p.acknowledge as u32, ACKNOWLEDGE),
        ];
        for (get, id) in scalars {
            if changed(get) {
                text.push_str(&format!("{}{id}\n", get(ports)));
            }
        }
        let vectors: [(fn(&BusPorts) -> u32, &str); 3] = [
            (|p: &BusPorts| p.address, ADDRESS),
            (|p: &BusPorts| p.data_in, DATA_IN),
            (|p: &BusPorts| p.data_out, DATA_OUT),
        ];
        for (get, id) in vectors {
            if changed(get) {
                text.push_str(&format!("b{:b} {id}\n", get(ports)));
            }
        }

        self.last = Some(*ports);
        self.emit(&text)
    }

    /// Flush buffered output.
    pub fn close(mut self) -> Result<()> {
        self.out.flush().map_err(|source| HarnessError::Trace {
            path: self.path.clone(),
            source,
        })
    }

    fn emit(&mut self, text: &str) -> Result<()> {
        self.out
            .write_all(text.as_bytes())
            .map_err(|source| HarnessError::Trace {
                path: self.path.clone(),
                source,
            })
    }
}
