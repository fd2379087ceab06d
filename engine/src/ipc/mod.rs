//! IPC layer: Unix socket server, framing, and message dispatch.

pub mod dispatch;
pub mod server;

pub use server::IpcServer;
