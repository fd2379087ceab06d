//! Engine state — the central struct owning registry, sessions, and IPC.
//!
//! A single `EngineState` is passed as `&mut` through the run loop and
//! every IPC handler; there is no shared or global mutable state.

use std::collections::HashMap;
use std::time::Instant;

use crate::ipc::IpcServer;
use crate::recognition::registry::GestureRegistry;
use crate::session::PracticeSession;

/// Central daemon state.
pub struct EngineState {
    /// Trained reference gestures, shared by all sessions.
    pub registry: GestureRegistry,
    /// Live practice sessions by name.
    pub sessions: HashMap<String, PracticeSession>,
    /// IPC server and client connections.
    pub ipc_server: IpcServer,
    /// Cleared to stop the run loop.
    pub running: bool,
    pub started_at: Instant,
    /// Frames processed across all sessions since startup.
    pub frames_total: u64,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            registry: GestureRegistry::new(),
            sessions: HashMap::new(),
            ipc_server: IpcServer::new(IpcServer::default_socket_path()),
            running: true,
            started_at: Instant::now(),
            frames_total: 0,
        }
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Wall-clock milliseconds since the Unix epoch.
pub fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
