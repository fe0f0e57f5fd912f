//! Per-voice equalizer chain
//!
//! Stages are built from the filter bank table and connected strictly in
//! series. Stage 0 is a low shelf, stage L-1 a high shelf, everything in
//! between peaking. A single-entry table is a valid degenerate chain whose
//! only stage is both input and output.

use super::biquad::{BiquadFilter, BiquadParams, FilterType};
use crate::config::FilterBankConfig;
use crate::engine::{NodeHandle, ProcessingContext};
use crate::error::{Result, VoicePoolError};

/// Filter type of the stage at `index` in a chain of `len` stages
pub fn stage_type(index: usize, len: usize) -> FilterType {
    if index == 0 {
        FilterType::LowShelf
    } else if index + 1 == len {
        FilterType::HighShelf
    } else {
        FilterType::Peaking
    }
}

/// Serial chain of shelf/peak stages
#[derive(Debug, Clone)]
pub struct EqualizerChain {
    stages: Vec<BiquadFilter>,
}

impl EqualizerChain {
    /// Create one flat (0 dB) stage per configured frequency and chain them
    pub fn build<C: ProcessingContext>(ctx: &mut C, config: &FilterBankConfig) -> Result<Self> {
        let len = config.frequencies().len();
        if len == 0 {
            return Err(VoicePoolError::EmptyFilterBank);
        }

        let mut stages = Vec::with_capacity(len);
        for (index, &frequency) in config.frequencies().iter().enumerate() {
            let params = BiquadParams::new(stage_type(index, len), frequency, config.q());
            stages.push(BiquadFilter::create(ctx, params)?);
        }

        for pair in stages.windows(2) {
            ctx.connect(pair[0].node(), 0, pair[1].node(), 0)?;
        }

        Ok(Self { stages })
    }

    /// Node receiving the voice unit's processed output
    pub fn input(&self) -> &NodeHandle {
        self.stages[0].node()
    }

    /// Last stage; the only one connected onward to the destination
    pub fn output(&self) -> &BiquadFilter {
        &self.stages[self.stages.len() - 1]
    }

    pub fn output_mut(&mut self) -> &mut BiquadFilter {
        let last = self.stages.len() - 1;
        &mut self.stages[last]
    }

    pub fn stages(&self) -> &[BiquadFilter] {
        &self.stages
    }

    pub fn stage(&self, index: usize) -> Option<&BiquadFilter> {
        self.stages.get(index)
    }

    pub fn stage_mut(&mut self, index: usize) -> Option<&mut BiquadFilter> {
        self.stages.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false; a built chain has at least one stage
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run a block through every stage in order
    pub fn process(&mut self, block: &mut [f32]) {
        for stage in &mut self.stages {
            stage.process(block);
        }
    }
}
