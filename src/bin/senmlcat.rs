//! Convert one SenML file and forward the result
//!
//! ```bash
//! senmlcat -I xml -O json --resolve --print reading.xml
//! cat reading.cbor | senmlcat -I cbor -O linp --post http://collector/write -
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use senmlcat::cli::{PipelineArgs, init_tracing};
use senmlcat::pipeline::benchmark_decode;
use senmlcat::sink::Forwarder;
use tokio::io::AsyncReadExt;
use tracing::error;

const TIMING_ITERATIONS: u32 = 1000;

/// Convert, normalize and forward a SenML pack
#[derive(Parser, Debug)]
#[command(name = "senmlcat")]
#[command(version)]
struct Args {
    /// Input file, or `-` for stdin
    file: PathBuf,

    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Report decode time per message
    #[arg(long)]
    time: bool,

    /// Report the size of the encoded output
    #[arg(long)]
    size: bool,
}

async fn read_input(path: &Path) -> std::io::Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin().read_to_end(&mut buf).await?;
        Ok(buf)
    } else {
        tokio::fs::read(path).await
    }
}

async fn run(args: Args) -> senmlcat::Result<()> {
    let config = args.pipeline.load_config()?;
    let pipeline = config.pipeline();
    let forwarder = Forwarder::from_config(&config).await?;

    let input = read_input(&args.file).await?;

    if args.time {
        let timing = benchmark_decode(&pipeline, &input, TIMING_ITERATIONS)?;
        println!(
            "Parse time {:.3} us or {:.0} msg/s",
            timing.micros_per_message(),
            timing.messages_per_second()
        );
    }

    let output = pipeline.process(&input)?;
    if args.size {
        println!("Output message size = {}", output.len());
    }

    forwarder.forward(&output.bytes).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.pipeline.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
