//! Iterate CLI Library
//!
//! Command-line interface for walking document collections with the
//! iterate engine.
//!
//! # Overview
//!
//! - **Counting**: Count the records a set of URIs yields (`iterate count`)
//! - **Emitting**: Copy record bodies to stdout, optionally wrapped as a JSON
//!   array or a GeoJSON FeatureCollection (`iterate emit`)
//! - **Discovery**: List the registered source schemes (`iterate schemes`)

pub mod commands;
pub mod error;
pub mod output;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};

/// Iterator URI used when neither the flag nor the environment sets one
pub const DEFAULT_ITERATOR_URI: &str = "repo://";

/// iterate - concurrent walker for document collections
#[derive(Parser, Debug)]
#[command(name = "iterate")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Iterator URI: source scheme plus options, e.g. "repo://?_max_procs=4&_dedupe=true"
    #[arg(
        short,
        long,
        env = "ITERATE_ITERATOR_URI",
        default_value = DEFAULT_ITERATOR_URI,
        global = true
    )]
    pub iterator_uri: String,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count the records yielded by one or more URIs
    Count {
        /// URIs to walk (directories, files, lists; depends on the scheme)
        #[arg(required = true)]
        uris: Vec<String>,
    },

    /// Write every record body to stdout
    Emit {
        /// Wrap the output in a JSON array
        #[arg(long, conflicts_with = "geojson")]
        json: bool,

        /// Wrap the output in a GeoJSON FeatureCollection
        #[arg(long)]
        geojson: bool,

        /// Discard the output, only report how much would have been written
        #[arg(long)]
        null: bool,

        /// URIs to walk
        #[arg(required = true)]
        uris: Vec<String>,
    },

    /// List the registered source schemes
    Schemes,
}
