//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod count;
pub mod emit;
pub mod schemes;
