//! SenML HTTP listener
//!
//! Every request body is converted and forwarded; the response carries the converted
//! pack, or the error text with status 400.
//!
//! ```bash
//! senmlcat-server -I json -O linp --post http://influx:8086/write --port 8880
//! ```

use std::process::ExitCode;

use clap::Parser;
use senmlcat::cli::{PipelineArgs, init_tracing};
use senmlcat::serve::{AppState, serve};
use senmlcat::sink::Forwarder;
use tokio::net::TcpListener;
use tracing::{error, info};

/// SenML conversion server
#[derive(Parser, Debug)]
#[command(name = "senmlcat-server")]
#[command(version)]
struct Args {
    /// HTTP server port
    #[arg(short, long, default_value = "8880")]
    port: u16,

    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Log every request body
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

async fn run(args: Args) -> senmlcat::Result<()> {
    let config = args.pipeline.load_config()?;
    let forwarder = Forwarder::from_config(&config).await?;
    info!(sinks = ?forwarder.names(), "forwarding configured");

    let state = AppState::new(config.pipeline(), forwarder).with_verbose(args.verbose);

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("SenMLCat server v{}", env!("CARGO_PKG_VERSION"));

    serve(listener, state).await?;
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
