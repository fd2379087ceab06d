//! mudra-engine — gesture practice engine daemon.
//!
//! Classifies hand poses against trained reference gestures and turns
//! fist-close triggers into committed symbols over a Unix-socket IPC
//! protocol.

pub mod input;
pub mod ipc;
pub mod recognition;
pub mod run;
pub mod session;
pub mod state;
pub mod tracking;
