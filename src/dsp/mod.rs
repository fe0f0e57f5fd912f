//! Per-voice signal chain building blocks
//!
//! Noise excitation, the two excitation band-passes, and the equalizer
//! chain. Each block allocates its nodes in a `ProcessingContext` and can
//! also process audio offline.

mod biquad;
mod equalizer;
mod excitation;
mod noise;

pub use biquad::{BiquadFilter, BiquadParams, FilterType};
pub use equalizer::{stage_type, EqualizerChain};
pub use excitation::{
    ExcitationFilterPair, ASPIRATION_FREQUENCY_HZ, ASPIRATION_INPUT, EXCITATION_INPUTS,
    EXCITATION_Q, FRICATIVE_FREQUENCY_HZ, FRICATIVE_INPUT,
};
pub use noise::{noise_length, NoiseSource, NOISE_DURATION_SECS};
