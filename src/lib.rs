//! Whisper Batch - command-line front end for whisper.cpp
//!
//! Translates an invocation into `whisper-cli` flags, makes sure the model
//! file is on disk, and runs the engine over one file or a directory of audio.

/// Top-level run orchestration and exit codes
pub mod app;
/// Invocation parsing and the engine flag registry
pub mod args;
/// Configuration management
pub mod config;
/// Engine subprocess dispatch
pub mod dispatch;
/// Audio file resolution
pub mod files;
/// Model provisioning
pub mod model;
/// Logging setup
pub mod telemetry;

/// Binary name used in usage text
pub const PROGRAM: &str = "whisper-batch";
