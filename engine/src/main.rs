//! mudra-engine daemon entry point.

use clap::Parser;
use tracing::info;

use mudra_engine::run::{self, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "mudra-engine", about = "Gesture practice engine daemon")]
struct Cli {
    /// IPC socket path (default: $XDG_RUNTIME_DIR/mudra.sock)
    #[arg(long)]
    ipc_socket: Option<String>,

    /// Log all IPC messages to stderr
    #[arg(long)]
    ipc_trace: bool,

    /// Exit after N seconds (CI testing)
    #[arg(long)]
    exit_after: Option<u64>,

    /// Run loop poll interval in milliseconds
    #[arg(long, default_value_t = 50)]
    poll_interval_ms: u64,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("mudra-engine {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mudra_engine=info".into()),
        )
        .init();

    info!("mudra-engine v{} starting", env!("CARGO_PKG_VERSION"));

    run::run(RunConfig {
        socket_path: cli.ipc_socket.map(std::path::PathBuf::from),
        ipc_trace: cli.ipc_trace,
        exit_after: cli.exit_after,
        poll_interval_ms: cli.poll_interval_ms,
    })
}
