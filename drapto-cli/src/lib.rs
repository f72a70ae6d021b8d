// ============================================================================
// drapto-cli/src/lib.rs
// ============================================================================
//
// LIBRARY COMPONENT: Drapto CLI Application
//
// Thin glue between the `clap`-parsed `Cli` struct and drapto-core's
// pipeline: argument definitions, logging setup, dependency preflight, and
// the encode driver. The binary crate (main.rs) depends on this library.
//
// AI-ASSISTANT-INFO: Library component for CLI application, contains core functionality

pub mod cli;
pub mod encode;
pub mod logging;
pub mod preflight;

pub use cli::Cli;
pub use encode::run;
