use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use eyre::{Result, WrapErr};

use dft_tb::config::DEFAULT_TRACE_PATH;
use dft_tb::{
    run_parallel, BusTiming, DftModel, Harness, HarnessConfig, ModelConfig, TraceConfig,
    VectorSet, Verdict, Verifier, WishboneDevice,
};

#[derive(Parser, Debug)]
#[command(
    name = "dft-tb",
    version,
    about = "Drive the DFT core over its Wishbone registers and check it against golden vectors"
)]
struct Cli {
    /// Record a VCD waveform of the bus signals.
    #[arg(long)]
    trace: bool,

    /// Waveform output file.
    #[arg(long, default_value = DEFAULT_TRACE_PATH)]
    trace_path: Utf8PathBuf,

    /// JSON test vector set to run instead of the built-in cases.
    #[arg(long)]
    vectors: Option<Utf8PathBuf>,

    /// Write the built-in vector set as JSON and exit.
    #[arg(long)]
    dump_vectors: Option<Utf8PathBuf>,

    /// Base address of the core's register window.
    #[arg(long, default_value = "0x0", value_parser = parse_u32)]
    base: u32,

    /// Cycles held before and after each bus request.
    #[arg(long, default_value_t = 10)]
    settle_cycles: u32,

    /// Cycles to wait for acknowledge.
    #[arg(long, default_value_t = 10_000)]
    ack_timeout: u64,

    /// Cycles to wait for valid output after start.
    #[arg(long, default_value_t = 100_000)]
    valid_timeout: u64,

    #[arg(long, default_value_t = 100)]
    reset_cycles: u32,

    /// Run each case against its own device concurrently.
    #[arg(long)]
    parallel: bool,

    /// Behavioral model: rising edges before acknowledge.
    #[arg(long, default_value_t = 2)]
    ack_latency: u32,

    /// Behavioral model: rising edges from start to valid output.
    #[arg(long, default_value_t = 200)]
    compute_latency: u32,

    /// RTL sources for the Verilator backend; the first file holds the top.
    #[cfg(feature = "verilator")]
    #[arg(long, num_args = 1..)]
    rtl: Vec<Utf8PathBuf>,

    #[cfg(feature = "verilator")]
    #[arg(long, default_value = "dft_top_top")]
    top: String,

    #[cfg(feature = "verilator")]
    #[arg(long, default_value = "artifacts")]
    artifacts: Utf8PathBuf,
}

fn parse_u32(text: &str) -> Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid address `{text}`: {e}"))
}

impl Cli {
    fn harness_config(&self) -> HarnessConfig {
        HarnessConfig {
            base_address: self.base,
            bus: BusTiming {
                settle_cycles: self.settle_cycles,
                ack_timeout: self.ack_timeout,
            },
            valid_timeout: self.valid_timeout,
            reset_cycles: self.reset_cycles,
            trace: TraceConfig {
                enabled: self.trace,
                path: self.trace_path.clone(),
            },
        }
    }

    fn model_config(&self) -> ModelConfig {
        ModelConfig {
            base_address: self.base,
            ack_latency: Some(self.ack_latency),
            compute_latency: Some(self.compute_latency),
        }
    }
}

fn banner(text: &str) {
    println!();
    println!("*********************************************************");
    println!("* {text:<53} *");
    println!("*********************************************************");
    println!();
}

fn run_sequential<D: WishboneDevice>(
    device: D,
    config: HarnessConfig,
    vectors: &VectorSet,
) -> Result<Verifier> {
    let mut harness = Harness::new(device, config)?;
    banner("DFT core simulation started ...");
    let verifier = harness.run(vectors)?;
    harness.finish()?;
    Ok(verifier)
}

#[cfg(feature = "verilator")]
fn run_verilated(cli: &Cli, config: HarnessConfig, vectors: &VectorSet) -> Result<Verifier> {
    use dft_tb::verilated::{create_runtime, RtlSource, VerilatedDevice};

    let rtl = RtlSource {
        top: cli.top.clone(),
        files: cli.rtl.clone(),
        include_dirs: cli
            .rtl
            .iter()
            .filter_map(|f| f.parent().map(|p| p.to_owned()))
            .collect(),
        artifacts: cli.artifacts.clone(),
    };
    let runtime = create_runtime(&rtl)?;
    let device = VerilatedDevice::new(&runtime, &rtl)?;
    run_sequential(device, config, vectors)
}

async fn run(cli: Cli) -> Result<Verdict> {
    if let Some(path) = &cli.dump_vectors {
        VectorSet::builtin().save(path)?;
        println!("Wrote built-in vectors to {path}");
        return Ok(Verdict::Pass);
    }

    let vectors = match &cli.vectors {
        Some(path) => VectorSet::load(path).wrap_err("loading test vectors")?,
        None => VectorSet::builtin(),
    };
    let config = cli.harness_config();
    println!("Initializing interface and resetting core");

    #[cfg(feature = "verilator")]
    if !cli.rtl.is_empty() {
        let verifier = run_verilated(&cli, config, &vectors)?;
        return Ok(finish(&verifier));
    }

    let verifier = if cli.parallel {
        let model = cli.model_config();
        banner("DFT core simulation started ...");
        run_parallel(move || DftModel::new(model), config, &vectors).await?
    } else {
        run_sequential(DftModel::new(cli.model_config()), config, &vectors)?
    };
    Ok(finish(&verifier))
}

fn finish(verifier: &Verifier) -> Verdict {
    println!();
    let verdict = verifier.report_verdict();
    banner("DFT Test done ...");
    println!("Completed");
    verdict
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(Verdict::Pass) => ExitCode::SUCCESS,
        Ok(Verdict::Fail) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(2)
        }
    }
}
