//! Audio Buffer Management
//!
//! Provides the sample storage used for noise tables and offline rendering.

use crate::error::{Result, VoicePoolError};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Calculate the RMS level of a block of samples in dB
///
/// Returns -f32::INFINITY for empty or silent input.
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return f32::NEG_INFINITY;
    }

    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sum_squares / samples.len() as f64).sqrt() as f32;
    linear_to_db(rms)
}

/// Calculate the peak level of a block of samples in dB
pub fn calculate_peak(samples: &[f32]) -> f32 {
    let peak = samples.iter().map(|&s| s.abs()).fold(0.0_f32, f32::max);
    linear_to_db(peak)
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    #[default]
    Mono,
    /// Two channels (stereo: left, right)
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Non-interleaved 32-bit float sample storage
///
/// Each channel is a separate `Vec<f32>`.
///
/// # Example
/// ```
/// use voicepool::engine::{AudioBuffer, ChannelLayout};
///
/// let buffer = AudioBuffer::new(96_000, ChannelLayout::Mono, 48_000);
/// assert_eq!(buffer.channels(), 1);
/// assert_eq!(buffer.duration_secs(), 2.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a zeroed buffer
    pub fn new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        let samples = vec![vec![0.0_f32; num_samples]; layout.num_channels()];
        Self {
            samples,
            sample_rate,
        }
    }

    /// Create a zeroed buffer, reporting allocation failure instead of aborting
    pub fn try_new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Result<Self> {
        let mut samples = Vec::with_capacity(layout.num_channels());
        for channel in 0..layout.num_channels() {
            let mut data: Vec<f32> = Vec::new();
            data.try_reserve_exact(num_samples)
                .map_err(|e| VoicePoolError::OutOfMemory {
                    details: format!(
                        "cannot allocate {} samples for channel {}: {}",
                        num_samples, channel, e
                    ),
                })?;
            data.resize(num_samples, 0.0);
            samples.push(data);
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Build a buffer from per-channel sample vectors
    ///
    /// All channels must have the same length.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if ChannelLayout::from_count(samples.len()).is_none() {
            return Err(VoicePoolError::InvalidOption {
                option: "channels".to_string(),
                value: samples.len().to_string(),
                expected: "1 or 2 channels".to_string(),
            });
        }

        let len = samples.first().map(|ch| ch.len()).unwrap_or(0);
        if samples.iter().any(|ch| ch.len() != len) {
            return Err(VoicePoolError::InvalidOption {
                option: "channels".to_string(),
                value: "unequal lengths".to_string(),
                expected: "channels of equal length".to_string(),
            });
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ... for stereo)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.channels();
        let num_samples = self.len();

        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get mutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }
}
