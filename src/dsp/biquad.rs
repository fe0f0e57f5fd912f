//! Biquad filter stage
//!
//! One second-order filter node. Used for the excitation band-passes and for
//! every equalizer stage.

use crate::engine::{NodeDescriptor, NodeHandle, ProcessingContext};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Filter response of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Boost/cut below frequency
    LowShelf,
    /// Boost/cut above frequency
    HighShelf,
    /// Bell curve boost/cut
    #[default]
    Peaking,
    /// Pass a band around frequency, 0 dB at the peak
    BandPass,
}

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (a0 + a1*z^-1 + a2*z^-2)
/// Normalized: all coefficients divided by a0
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// Pass-through
    fn identity() -> Self {
        BiquadCoeffs {
            b0: 1.0,
            ..Default::default()
        }
    }

    /// Calculate biquad coefficients using Audio EQ Cookbook formulas
    /// Reference: https://www.w3.org/2011/audio/audio-eq-cookbook.html
    fn calculate(
        filter_type: FilterType,
        sample_rate: f64,
        frequency: f64,
        gain_db: f64,
        q: f64,
    ) -> Self {
        // Keep the corner strictly inside (0, Nyquist)
        let nyquist = sample_rate * 0.5 * 0.999;
        if nyquist <= 1.0 {
            return BiquadCoeffs::identity();
        }
        let freq = frequency.clamp(1.0, nyquist);
        let q = q.max(1e-4);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q);
        let a = (10.0_f64).powf(gain_db / 40.0);

        let (b0, b1, b2, a0, a1, a2) = match filter_type {
            FilterType::Peaking => (
                1.0 + alpha * a,
                -2.0 * cos_w0,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cos_w0,
                1.0 - alpha / a,
            ),
            FilterType::LowShelf => {
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                    (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
            FilterType::HighShelf => {
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                    (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
            FilterType::BandPass => (
                alpha,
                0.0,
                -alpha,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };

        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Direct Form I delay line for one channel
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Parameters of one stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadParams {
    pub filter_type: FilterType,
    /// Center/corner frequency in Hz
    pub frequency: f32,
    pub q: f32,
    /// Gain in dB (ignored by band-pass)
    pub gain_db: f32,
}

impl BiquadParams {
    pub fn new(filter_type: FilterType, frequency: f32, q: f32) -> Self {
        Self {
            filter_type,
            frequency,
            q,
            gain_db: 0.0,
        }
    }
}

/// A biquad node owned by a voice
///
/// Parameters may be automated after the graph is built; coefficients are
/// recomputed lazily on the next block.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    node: NodeHandle,
    params: BiquadParams,
    sample_rate: u32,
    coeffs: BiquadCoeffs,
    state: BiquadState,
    coeffs_dirty: bool,
}

impl BiquadFilter {
    /// Allocate a biquad node in `ctx`
    pub fn create<C: ProcessingContext>(ctx: &mut C, params: BiquadParams) -> Result<Self> {
        let node = ctx.create_node(NodeDescriptor::biquad())?;
        Ok(Self {
            node,
            params,
            sample_rate: ctx.sample_rate(),
            coeffs: BiquadCoeffs::default(),
            state: BiquadState::default(),
            coeffs_dirty: true,
        })
    }

    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    pub fn params(&self) -> &BiquadParams {
        &self.params
    }

    pub fn filter_type(&self) -> FilterType {
        self.params.filter_type
    }

    pub fn frequency(&self) -> f32 {
        self.params.frequency
    }

    pub fn q(&self) -> f32 {
        self.params.q
    }

    pub fn gain_db(&self) -> f32 {
        self.params.gain_db
    }

    pub fn set_gain_db(&mut self, gain_db: f32) {
        self.params.gain_db = gain_db;
        self.coeffs_dirty = true;
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.params.frequency = frequency;
        self.coeffs_dirty = true;
    }

    pub fn set_q(&mut self, q: f32) {
        self.params.q = q;
        self.coeffs_dirty = true;
    }

    /// Clear the filter history
    pub fn reset(&mut self) {
        self.state = BiquadState::default();
    }

    fn update_coefficients(&mut self) {
        if !self.coeffs_dirty {
            return;
        }
        self.coeffs = BiquadCoeffs::calculate(
            self.params.filter_type,
            self.sample_rate as f64,
            self.params.frequency as f64,
            self.params.gain_db as f64,
            self.params.q as f64,
        );
        self.coeffs_dirty = false;
    }

    /// Filter a block in place
    pub fn process(&mut self, block: &mut [f32]) {
        self.update_coefficients();
        for sample in block.iter_mut() {
            *sample = self.state.process(*sample as f64, &self.coeffs) as f32;
        }
    }
}
