//! Voice pool construction
//!
//! ```text
//! Uninitialized -> ModuleLoading -> BuildingVoice(0..N) -> Ready
//!                        \________________\_______________-> Failed
//! ```
//!
//! Module registration is the only await point. Everything after it is
//! synchronous, and all wiring finishes before the clock is resumed.
//! A failed build releases every node it created, so the caller never sees
//! part of a pool.

use super::unit::{VoiceUnit, VoiceUnitOptions};
use super::voice::{Voice, VoicePool};
use crate::config::PoolOptions;
use crate::dsp::{EqualizerChain, ExcitationFilterPair, NoiseSource};
use crate::engine::{ClockState, NodeHandle, NodeId, ProcessingContext};
use crate::error::{Result, VoicePoolError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Build progress of a [`VoicePoolManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolState {
    #[default]
    Uninitialized,
    /// Waiting for the voice processor module
    ModuleLoading,
    /// Constructing the voice with this id
    BuildingVoice(usize),
    /// Every voice is wired to the destination
    Ready,
    /// The build was abandoned; nothing it created remains in the context
    Failed,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolState::Uninitialized => write!(f, "Uninitialized"),
            PoolState::ModuleLoading => write!(f, "ModuleLoading"),
            PoolState::BuildingVoice(id) => write!(f, "BuildingVoice({})", id),
            PoolState::Ready => write!(f, "Ready"),
            PoolState::Failed => write!(f, "Failed"),
        }
    }
}

/// Builds one [`VoicePool`] against a borrowed context
///
/// # Example
/// ```
/// use voicepool::{GraphContext, PoolOptions, VoicePoolManager};
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let mut ctx = GraphContext::new(48000);
/// let mut manager = VoicePoolManager::new(&mut ctx, PoolOptions::default().with_max_voices(2));
/// let pool = runtime.block_on(manager.build()).unwrap();
/// assert_eq!(pool.len(), 2);
/// ```
pub struct VoicePoolManager<'a, C: ProcessingContext> {
    ctx: &'a mut C,
    destination: Option<NodeHandle>,
    options: PoolOptions,
    state: PoolState,
}

impl<'a, C: ProcessingContext> VoicePoolManager<'a, C> {
    /// Manager writing into the context's primary output
    pub fn new(ctx: &'a mut C, options: PoolOptions) -> Self {
        Self {
            ctx,
            destination: None,
            options,
            state: PoolState::Uninitialized,
        }
    }

    /// Mix voices into `destination` instead of the primary output
    pub fn with_destination(mut self, destination: NodeHandle) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Run the whole build
    ///
    /// Either every configured voice is live and connected, or the call
    /// fails and the context is left as it was found.
    pub async fn build(&mut self) -> Result<VoicePool> {
        if self.state != PoolState::Uninitialized {
            return Err(VoicePoolError::AlreadyBuilt {
                state: self.state.to_string(),
            });
        }

        let destination = match self.validate() {
            Ok(destination) => destination,
            Err(e) => {
                tracing::warn!(error = %e, "rejected voice pool configuration");
                self.state = PoolState::Failed;
                return Err(e);
            }
        };

        let existing: HashSet<NodeId> = self.ctx.node_ids().into_iter().collect();
        match self.run(destination).await {
            Ok(pool) => Ok(pool),
            Err(e) => {
                tracing::warn!(error = %e, state = %self.state, "voice pool build failed");
                for id in self.ctx.node_ids() {
                    if !existing.contains(&id) {
                        self.ctx.release(id);
                    }
                }
                self.state = PoolState::Failed;
                Err(e)
            }
        }
    }

    /// Reject a malformed context, destination or option set
    fn validate(&self) -> Result<NodeHandle> {
        if self.ctx.sample_rate() == 0 {
            return Err(VoicePoolError::InvalidContext {
                reason: "sample rate must be greater than zero".to_string(),
            });
        }
        if self.ctx.clock_state() == ClockState::Closed {
            return Err(VoicePoolError::InvalidContext {
                reason: "context is closed".to_string(),
            });
        }

        self.options.validate()?;

        let destination = self.destination.unwrap_or_else(|| self.ctx.destination());
        match self.ctx.node(destination.id) {
            Some(known) if known == destination => {}
            _ => {
                return Err(VoicePoolError::InvalidDestination {
                    reason: format!("node {} was not created by this context", destination.id),
                });
            }
        }
        if destination.inputs == 0 {
            return Err(VoicePoolError::InvalidDestination {
                reason: format!("node {} accepts no input", destination.id),
            });
        }
        if destination.channels < 2 {
            return Err(VoicePoolError::InvalidDestination {
                reason: format!(
                    "node {} accepts {} channel(s), a stereo input is required",
                    destination.id, destination.channels
                ),
            });
        }

        Ok(destination)
    }

    async fn run(&mut self, destination: NodeHandle) -> Result<VoicePool> {
        self.transition(PoolState::ModuleLoading);
        self.register_module().await?;

        if !self.ctx.has_processor(&self.options.processor) {
            return Err(VoicePoolError::ProcessorNotRegistered {
                processor: self.options.processor.clone(),
            });
        }

        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::thread_rng().gen()),
        };

        let mut voices = Vec::with_capacity(self.options.max_voices);
        for id in 0..self.options.max_voices {
            self.transition(PoolState::BuildingVoice(id));
            voices.push(build_voice(
                self.ctx,
                id,
                &self.options,
                &destination,
                &mut rng,
            )?);
        }

        if self.ctx.clock_state() == ClockState::Suspended {
            self.ctx.resume()?;
        }

        self.transition(PoolState::Ready);
        tracing::info!(
            voices = voices.len(),
            sample_rate = self.ctx.sample_rate(),
            "voice pool ready"
        );
        Ok(VoicePool::new(voices, destination))
    }

    async fn register_module(&mut self) -> Result<()> {
        let module = self.options.module.clone();
        let registration = self.ctx.register_module(&module);

        match self.options.registration_timeout_ms {
            Some(timeout_ms) => tokio::time::timeout(Duration::from_millis(timeout_ms), registration)
                .await
                .map_err(|_| VoicePoolError::ModuleTimeout {
                    module: module.clone(),
                    timeout_ms,
                })?,
            None => registration.await,
        }
    }

    fn transition(&mut self, next: PoolState) {
        tracing::debug!(from = %self.state, to = %next, "voice pool state");
        self.state = next;
    }
}

/// Build and wire one voice
///
/// noise → {aspiration, fricative} → unit → eq[0] → … → eq[L-1] → destination
fn build_voice<C: ProcessingContext, R: Rng>(
    ctx: &mut C,
    id: usize,
    options: &PoolOptions,
    destination: &NodeHandle,
    rng: &mut R,
) -> Result<Voice> {
    let unit = VoiceUnit::create(ctx, VoiceUnitOptions::new(&options.processor, id))?;
    let mut noise = NoiseSource::create(ctx, rng)?;
    let excitation = ExcitationFilterPair::build(ctx, &noise, unit.node())?;
    let equalizer = EqualizerChain::build(ctx, &options.filter)?;

    ctx.connect(unit.node(), 0, equalizer.input(), 0)?;
    ctx.connect(equalizer.output().node(), 0, destination, 0)?;
    noise.start();

    tracing::debug!(
        voice = id,
        stages = equalizer.len(),
        noise_samples = noise.len(),
        "voice built"
    );
    Ok(Voice::new(id, unit, noise, excitation, equalizer))
}

/// Build a pool in one call
///
/// `destination` defaults to the context's primary output.
pub async fn init_voices<C: ProcessingContext>(
    ctx: &mut C,
    destination: Option<NodeHandle>,
    options: PoolOptions,
) -> Result<VoicePool> {
    let mut manager = VoicePoolManager::new(ctx, options);
    if let Some(destination) = destination {
        manager = manager.with_destination(destination);
    }
    manager.build().await
}
