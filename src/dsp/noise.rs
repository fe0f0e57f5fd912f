//! Looping noise excitation source
//!
//! Each voice owns one buffer of uniform random samples in [0, 1) that is
//! played back in an endless loop. Two seconds is long enough to hide the
//! period and short enough to keep memory bounded.

use crate::engine::{AudioBuffer, ChannelLayout, NodeDescriptor, NodeHandle, ProcessingContext};
use crate::error::{Result, VoicePoolError};
use rand::Rng;

/// Length of the noise table in seconds
pub const NOISE_DURATION_SECS: f64 = 2.0;

/// Number of samples in a noise table at `sample_rate`
pub fn noise_length(sample_rate: u32) -> usize {
    (sample_rate as f64 * NOISE_DURATION_SECS) as usize
}

/// Looping buffer source filled with white noise
#[derive(Debug, Clone)]
pub struct NoiseSource {
    node: NodeHandle,
    buffer: AudioBuffer,
    looping: bool,
    started: bool,
    position: usize,
}

impl NoiseSource {
    /// Create the source node and the noise table it owns
    ///
    /// If the table cannot be allocated the node is released again.
    pub fn create<C: ProcessingContext, R: Rng>(ctx: &mut C, rng: &mut R) -> Result<Self> {
        let sample_rate = ctx.sample_rate();
        if sample_rate == 0 {
            return Err(VoicePoolError::InvalidContext {
                reason: "sample rate must be greater than zero".to_string(),
            });
        }

        let node = ctx.create_node(NodeDescriptor::buffer_source())?;
        let mut buffer =
            match ctx.allocate_buffer(&node, ChannelLayout::Mono, noise_length(sample_rate)) {
                Ok(buffer) => buffer,
                Err(e) => {
                    ctx.release(node.id);
                    return Err(e);
                }
            };
        for sample in buffer.channel_mut(0) {
            *sample = rng.gen::<f32>();
        }

        Ok(Self {
            node,
            buffer,
            looping: true,
            started: false,
            position: 0,
        })
    }

    /// Begin playback from the start of the table
    pub fn start(&mut self) {
        self.started = true;
        self.position = 0;
    }

    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }

    /// Number of samples in one loop cycle
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Fill `out` with the next samples of the loop
    ///
    /// Writes silence until the source is started.
    pub fn render(&mut self, out: &mut [f32]) {
        let table = self.buffer.channel(0);
        if !self.started || table.is_empty() {
            out.fill(0.0);
            return;
        }

        for sample in out.iter_mut() {
            *sample = table[self.position];
            self.position += 1;
            if self.position == table.len() {
                self.position = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GraphContext;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_case::test_case;

    #[test_case(8000 ; "telephone")]
    #[test_case(44100 ; "cd")]
    #[test_case(48000 ; "studio")]
    fn test_length_is_two_seconds(sample_rate: u32) {
        let mut ctx = GraphContext::new(sample_rate);
        let mut rng = StdRng::seed_from_u64(7);
        let noise = NoiseSource::create(&mut ctx, &mut rng).unwrap();
        assert_eq!(noise.len(), sample_rate as usize * 2);
        assert_eq!(noise.buffer().channels(), 1);
        assert!(noise.is_looping());
    }

    #[test]
    fn test_samples_in_unit_interval() {
        let mut ctx = GraphContext::new(8000);
        let mut rng = StdRng::seed_from_u64(1);
        let noise = NoiseSource::create(&mut ctx, &mut rng).unwrap();
        let samples = noise.buffer().channel(0);
        assert!(samples.iter().all(|&s| (0.0..1.0).contains(&s)));

        let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / samples.len() as f64;
        assert!((mean - 0.5).abs() < 0.02, "mean = {}", mean);
    }

    #[test]
    fn test_loop_has_no_seam() {
        let mut ctx = GraphContext::new(100);
        let mut rng = StdRng::seed_from_u64(3);
        let mut noise = NoiseSource::create(&mut ctx, &mut rng).unwrap();
        noise.start();

        let len = noise.len();
        let mut out = vec![0.0; len * 2 + 17];
        noise.render(&mut out);
        for i in 0..len + 17 {
            assert_eq!(out[i], out[i + len]);
        }
    }

    #[test]
    fn test_silent_until_started() {
        let mut ctx = GraphContext::new(100);
        let mut rng = StdRng::seed_from_u64(3);
        let mut noise = NoiseSource::create(&mut ctx, &mut rng).unwrap();
        let mut out = vec![1.0; 10];
        noise.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_budget_failure_allocates_no_node() {
        let mut ctx = GraphContext::new(1000).with_sample_budget(10);
        let mut rng = StdRng::seed_from_u64(3);
        let result = NoiseSource::create(&mut ctx, &mut rng);
        assert!(matches!(result, Err(VoicePoolError::OutOfMemory { .. })));
        assert_eq!(ctx.node_count(), 1);
        assert_eq!(ctx.remaining_samples(), Some(10));
    }
}
