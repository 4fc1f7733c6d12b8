//! Shared pieces of the `shapeseek` binary: tracing bootstrap and console
//! rendering. Command parsing and dispatch live in `main.rs`.

pub mod logging;
pub mod output;

pub use logging::init_tracing_with_config;
