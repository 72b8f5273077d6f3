//! End-to-end test loop: reset, then load/start/wait/fetch/verify per case.

use std::sync::Arc;

use log::info;

use crate::config::{HarnessConfig, TraceConfig};
use crate::device::WishboneDevice;
use crate::error::Result;
use crate::sequencer::DftDriver;
use crate::testbench::Testbench;
use crate::trace::VcdTracer;
use crate::vectors::VectorSet;
use crate::verify::Verifier;

const TRACE_SCOPE: &str = "dft_top";

#[derive(Debug)]
pub struct Harness<D> {
    tb: Testbench<D>,
    config: HarnessConfig,
}

impl<D: WishboneDevice> Harness<D> {
    pub fn new(device: D, config: HarnessConfig) -> Result<Self> {
        let mut tb = Testbench::new(device);
        if config.trace.enabled {
            tb = tb.with_tracer(VcdTracer::create(config.trace.path(), TRACE_SCOPE)?);
        }
        Ok(Self { tb, config })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn testbench(&mut self) -> &mut Testbench<D> {
        &mut self.tb
    }

    /// A sequencer bound to this harness's device.
    pub fn driver(&mut self) -> DftDriver<'_, D> {
        DftDriver::new(
            &mut self.tb,
            self.config.base_address,
            self.config.bus,
            self.config.valid_timeout,
        )
    }

    pub fn reset(&mut self) -> Result<()> {
        self.tb.reset(self.config.reset_cycles)
    }

    /// Reset once, then run every case in order. Mismatches end up in the
    /// returned verifier; only protocol failures are errors.
    pub fn run(&mut self, vectors: &VectorSet) -> Result<Verifier> {
        vectors.validate()?;
        self.reset()?;
        self.run_cases(vectors, 0)
    }

    fn run_cases(&mut self, vectors: &VectorSet, first: usize) -> Result<Verifier> {
        let mut verifier = Verifier::new();
        for (n, case) in vectors.cases.iter().enumerate() {
            println!("--- begin output {:02} ---", first + n + 1);
            info!("Case `{}`", case.name);
            self.driver().run_case(case, &mut verifier)?;
        }
        info!(
            "{} cases done at cycle {}",
            vectors.len(),
            self.tb.cycles()
        );
        Ok(verifier)
    }

    /// Close the trace and return the device.
    pub fn finish(self) -> Result<D> {
        self.tb.finish()
    }
}

/// Run each case against its own device on the blocking pool. Verifiers are
/// merged in case order, so the outcome matches a sequential run.
pub async fn run_parallel<F, D>(
    make_device: F,
    config: HarnessConfig,
    vectors: &VectorSet,
) -> Result<Verifier>
where
    F: Fn() -> D + Send + Sync + 'static,
    D: WishboneDevice + Send + 'static,
{
    vectors.validate()?;
    let make_device = Arc::new(make_device);

    let handles: Vec<_> = vectors
        .cases
        .iter()
        .enumerate()
        .map(|(n, case)| {
            let make_device = Arc::clone(&make_device);
            let single = VectorSet {
                cases: vec![case.clone()],
            };
            let config = HarnessConfig {
                trace: per_case_trace(&config.trace, n),
                ..config.clone()
            };
            tokio::task::spawn_blocking(move || -> Result<Verifier> {
                let mut harness = Harness::new(make_device(), config)?;
                harness.reset()?;
                let verifier = harness.run_cases(&single, n)?;
                harness.finish()?;
                Ok(verifier)
            })
        })
        .collect();

    // Join every case before reporting, so no task outlives the run.
    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.await);
    }

    let mut verifier = Verifier::new();
    for outcome in outcomes {
        verifier.merge(outcome??);
    }
    Ok(verifier)
}

fn per_case_trace(trace: &TraceConfig, n: usize) -> TraceConfig {
    if trace.enabled {
        trace.with_suffix(&format!("case{n}"))
    } else {
        trace.clone()
    }
}
