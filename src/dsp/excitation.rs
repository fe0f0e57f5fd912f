//! Aspiration and fricative excitation filters
//!
//! The voice's noise source fans out into two band-pass filters in
//! parallel. The aspiration band feeds excitation input 0 of the voice unit,
//! the fricative band feeds input 1.

use super::biquad::{BiquadFilter, BiquadParams, FilterType};
use super::noise::NoiseSource;
use crate::engine::{NodeHandle, ProcessingContext};
use crate::error::{Result, VoicePoolError};

/// Center of the aspiration noise band
pub const ASPIRATION_FREQUENCY_HZ: f32 = 500.0;

/// Center of the fricative noise band
pub const FRICATIVE_FREQUENCY_HZ: f32 = 1000.0;

/// Resonance shared by both excitation filters
pub const EXCITATION_Q: f32 = 0.5;

/// Number of excitation inputs a voice unit must declare
pub const EXCITATION_INPUTS: usize = 2;

/// Voice unit input fed by the aspiration band
pub const ASPIRATION_INPUT: usize = 0;

/// Voice unit input fed by the fricative band
pub const FRICATIVE_INPUT: usize = 1;

/// The two band-pass filters tapping one noise source
#[derive(Debug, Clone)]
pub struct ExcitationFilterPair {
    aspiration: BiquadFilter,
    fricative: BiquadFilter,
}

impl ExcitationFilterPair {
    /// Create both filters and wire noise → {aspiration, fricative} → unit
    pub fn build<C: ProcessingContext>(
        ctx: &mut C,
        noise: &NoiseSource,
        unit: &NodeHandle,
    ) -> Result<Self> {
        if unit.inputs != EXCITATION_INPUTS {
            return Err(VoicePoolError::InputCountMismatch {
                expected: EXCITATION_INPUTS,
                actual: unit.inputs,
            });
        }

        let aspiration = BiquadFilter::create(
            ctx,
            BiquadParams::new(FilterType::BandPass, ASPIRATION_FREQUENCY_HZ, EXCITATION_Q),
        )?;
        let fricative = BiquadFilter::create(
            ctx,
            BiquadParams::new(FilterType::BandPass, FRICATIVE_FREQUENCY_HZ, EXCITATION_Q),
        )?;

        ctx.connect(noise.node(), 0, aspiration.node(), 0)?;
        ctx.connect(aspiration.node(), 0, unit, ASPIRATION_INPUT)?;
        ctx.connect(noise.node(), 0, fricative.node(), 0)?;
        ctx.connect(fricative.node(), 0, unit, FRICATIVE_INPUT)?;

        Ok(Self {
            aspiration,
            fricative,
        })
    }

    pub fn aspiration(&self) -> &BiquadFilter {
        &self.aspiration
    }

    pub fn fricative(&self) -> &BiquadFilter {
        &self.fricative
    }

    pub fn aspiration_mut(&mut self) -> &mut BiquadFilter {
        &mut self.aspiration
    }

    pub fn fricative_mut(&mut self) -> &mut BiquadFilter {
        &mut self.fricative
    }

    /// Split one noise block into its two excitation bands
    ///
    /// # Panics
    /// Panics if the output slices are shorter than `noise`
    pub fn process(&mut self, noise: &[f32], aspiration_out: &mut [f32], fricative_out: &mut [f32]) {
        let len = noise.len();
        aspiration_out[..len].copy_from_slice(noise);
        fricative_out[..len].copy_from_slice(noise);
        self.aspiration.process(&mut aspiration_out[..len]);
        self.fricative.process(&mut fricative_out[..len]);
    }
}
