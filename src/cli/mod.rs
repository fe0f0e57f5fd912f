//! CLI Module
//!
//! Command-line interface for building and inspecting voice pools.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Voicepool - voice-pool graph builder for a physical-model speech synthesizer
#[derive(Parser, Debug)]
#[command(name = "voicepool")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a voice pool and print its topology
    #[command(name = "build")]
    Build {
        /// Pool options (JSON); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Sample rate of the processing context in Hz
        #[arg(short, long, default_value_t = crate::engine::DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,

        /// Load processor modules from this directory instead of the bundled table
        #[arg(short, long)]
        module_dir: Option<PathBuf>,

        /// Print the topology as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render one voice's aspiration (left) and fricative (right) noise to WAV
    #[command(name = "render-excitation")]
    RenderExcitation {
        /// Output WAV file
        #[arg(short, long)]
        out: PathBuf,

        /// Length of the rendering in seconds
        #[arg(long, default_value_t = 1.0)]
        seconds: f64,

        /// Sample rate in Hz
        #[arg(short, long, default_value_t = crate::engine::DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,

        /// Noise seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the default pool options as JSON
    #[command(name = "show-config")]
    ShowConfig,
}
