//! Daemon run loop: IPC polling, graceful signal handling, and
//! periodic status logging.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use calloop::EventLoop;
use tracing::info;

use crate::ipc::IpcServer;
use crate::state::EngineState;

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Run-loop configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Override the IPC socket path (or use the default).
    pub socket_path: Option<PathBuf>,
    /// Log every IPC message sent and received.
    pub ipc_trace: bool,
    /// Exit after N seconds (for CI).
    pub exit_after: Option<u64>,
    /// Poll interval in milliseconds (higher = less CPU).
    pub poll_interval_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            ipc_trace: false,
            exit_after: None,
            poll_interval_ms: 50,
        }
    }
}

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Run the engine daemon until shutdown.
pub fn run(config: RunConfig) -> anyhow::Result<()> {
    let mut event_loop =
        EventLoop::<EngineState>::try_new().context("failed to create event loop")?;

    let mut state = EngineState::new();
    state.ipc_server.ipc_trace = config.ipc_trace;

    let socket_path = config
        .socket_path
        .unwrap_or_else(IpcServer::default_socket_path);
    state.ipc_server.socket_path = socket_path.clone();
    IpcServer::bind(&socket_path, &event_loop.handle())
        .with_context(|| format!("failed to bind IPC socket at {}", socket_path.display()))?;

    install_signal_handlers();

    let start_time = Instant::now();
    let exit_duration = config.exit_after.map(Duration::from_secs);
    let mut last_status_log = Instant::now();
    let status_interval = Duration::from_secs(60);

    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    info!(
        "engine initialized (poll interval: {}ms), entering event loop",
        config.poll_interval_ms
    );

    while state.running {
        // Check global shutdown flag (set by signal handler)
        if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            info!("shutdown signal received, exiting");
            state.running = false;
            break;
        }

        // Exit timer for CI
        if let Some(dur) = exit_duration {
            if start_time.elapsed() >= dur {
                info!("exit timer fired after {}s", dur.as_secs());
                state.running = false;
                break;
            }
        }

        // Periodic status logging
        if last_status_log.elapsed() >= status_interval {
            info!(
                "engine status: {} session(s), {} trained gesture(s), {} IPC client(s), {} frame(s)",
                state.sessions.len(),
                state.registry.len(),
                state.ipc_server.clients.len(),
                state.frames_total
            );
            last_status_log = Instant::now();
        }

        IpcServer::poll_clients(&mut state);

        event_loop.dispatch(Some(poll_interval), &mut state)?;
    }

    // Clean up IPC socket
    let _ = std::fs::remove_file(&state.ipc_server.socket_path);

    info!(
        "engine shutting down ({} session(s), {} frame(s) processed)",
        state.sessions.len(),
        state.frames_total
    );
    Ok(())
}
