//! Voicepool - Voice-Pool Graph Builder
//!
//! Builds a bounded pool of synthetic-voice processing chains for a
//! physical-model speech synthesizer and wires them into a host audio
//! graph.
//!
//! # Architecture
//!
//! Each voice is built from leaves to root:
//! - Noise source: a looping two-second table of uniform random samples
//! - Excitation pair: aspiration and fricative band-passes fed by the noise
//! - Voice unit: the host's vocal-tract processor (two inputs, stereo out)
//! - Equalizer chain: low shelf, peaking stages, high shelf, in series
//!
//! The last equalizer stage of every voice feeds the shared destination.

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod pool;

pub use config::{FilterBankConfig, PoolOptions};
pub use engine::{GraphContext, ProcessingContext};
pub use error::{ErrorKind, Result, VoicePoolError};
pub use pool::{init_voices, PoolState, Voice, VoicePool, VoicePoolManager};
