//! DSP worker for the voltstream ADC streaming system.
//!
//! Reads fixed-size raw sample blocks from the configured front-end, runs the
//! staged pipeline and writes typed binary frames to stdout. Logs go to
//! stderr, hot-reload commands arrive one per line on stdin, and an optional
//! serial port carries a textual trace of the final output.
//!
//! # Usage Examples
//!
//! ## Networked front-end
//! ```bash
//! dspworker 192.168.1.133:30431 16384 100000 10 2500 5 1
//! ```
//!
//! ## Synthetic source with trace port
//! ```bash
//! dspworker synthetic 16384 100000 10 2500 5 1 \
//!     --trace-port /dev/ttyUSB0 --trace-baud 115200 -v
//! ```
//!
//! ## Replaying a recorded stream
//! ```bash
//! dspworker capture.raw 16384 100000 10 2500 5 1
//! ```

use std::io::Write;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing::{error, info};

use voltstream::command::CommandReader;
use voltstream::params::Params;
use voltstream::pipeline::Pipeline;
use voltstream::trace::TraceSink;
use voltstream::{AdcSource, RawBlock};

#[derive(Parser, Debug)]
#[command(author, version, about = "DSP worker: ADC blocks in, typed frames out", long_about = None)]
struct Args {
    /// ADC endpoint: host:port, "synthetic", or a file path
    adc_endpoint: String,

    /// Samples per block
    block_samples: usize,

    /// ADC sampling frequency in Hz
    sampling_frequency_hz: f64,

    /// Presentation rate in Hz (decim = floor(fs / target))
    target_rate_hz: f64,

    /// Low-pass cutoff frequency in Hz
    lpf_cutoff_hz: f64,

    /// Ravg moving-average window at the decimated rate
    movavg_r: usize,

    /// Per-channel moving-average window at the ADC rate
    movavg_ch: usize,

    /// Serial port for the textual yt trace (omit to disable)
    #[arg(long)]
    trace_port: Option<String>,

    /// Baud rate for the trace port
    #[arg(long, default_value_t = 115_200)]
    trace_baud: u32,

    /// Verbosity level (-v=info, -vv=debug, -vvv=trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // 0 = WARN (quiet), 1 = INFO, 2 = DEBUG, 3+ = TRACE
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .try_init();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> voltstream::Result<ExitCode> {
    if args.block_samples == 0 {
        return Err(voltstream::Error::config("block_samples must be positive"));
    }

    let mut params = Params::default();
    params.sampling_frequency = args.sampling_frequency_hz;
    params.target_rate_hz = args.target_rate_hz;
    params.lpf_cutoff_hz = args.lpf_cutoff_hz;
    params.movavg_r = args.movavg_r;
    params.movavg_ch = args.movavg_ch;
    params.validate()?;

    let mut source = open_source(
        &args.adc_endpoint,
        args.block_samples,
        params.sampling_frequency,
    )?;
    let info = source.info().clone();
    info!(
        "source {} connected: {} channels, block = {} samples ~ {:.3} ms @ {} Hz, decim = {}",
        args.adc_endpoint,
        info.channels,
        args.block_samples,
        1000.0 * args.block_samples as f64 / params.sampling_frequency,
        params.sampling_frequency,
        params.decim(),
    );

    let mut pipeline = Pipeline::new(params, args.block_samples, &info.scales)?;

    let mut trace = match &args.trace_port {
        Some(path) => TraceSink::open(path, args.trace_baud),
        None => TraceSink::absent(),
    };
    if trace.is_present() {
        info!("trace enabled on {}", args.trace_port.as_deref().unwrap_or(""));
    }

    let commands = CommandReader::from_stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut block = RawBlock::new(args.block_samples, info.channels);

    loop {
        // Parameters mutate only between blocks; every stage sees a
        // consistent snapshot for the whole block.
        if let Some(cmd) = commands.poll() {
            info!("applying command: {:?}", cmd);
            pipeline.apply_command(cmd);
        }

        match source.refill(&mut block) {
            Ok(true) => {}
            Ok(false) => {
                info!("source ended cleanly, shutting down");
                out.flush()?;
                return Ok(ExitCode::SUCCESS);
            }
            Err(e) => {
                error!("ADC refill failed: {}", e);
                return Ok(ExitCode::FAILURE);
            }
        }

        pipeline.process_block(&block, &mut out, &mut trace)?;
    }
}

fn open_source(endpoint: &str, block_samples: usize, fs: f64) -> voltstream::Result<AdcSource> {
    if endpoint == "synthetic" {
        return Ok(AdcSource::synthetic(fs));
    }
    if endpoint.contains(':') {
        return AdcSource::from_tcp(endpoint, block_samples);
    }
    AdcSource::from_file(endpoint, block_samples)
}
