//! Processing context seam
//!
//! The real-time context (clock, device, sample rate) belongs to the host.
//! The pool builder only borrows it through [`ProcessingContext`].

use super::buffer::{AudioBuffer, ChannelLayout};
use crate::error::Result;
use serde::Serialize;
use std::fmt;

/// Identifier of a node inside one context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node is, as far as the graph is concerned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "name")]
pub enum NodeKind {
    /// Final output of the context
    Destination,
    /// Looping sample playback
    BufferSource,
    /// Second-order filter stage
    Biquad,
    /// Node backed by a registered processor
    Processor(String),
}

/// Request to create a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub kind: NodeKind,
    pub inputs: usize,
    pub outputs: usize,
    /// Channel count of each output (and accepted per input)
    pub channels: usize,
}

impl NodeDescriptor {
    /// Zero-input, one-output mono source
    pub fn buffer_source() -> Self {
        Self {
            kind: NodeKind::BufferSource,
            inputs: 0,
            outputs: 1,
            channels: 1,
        }
    }

    /// One-in, one-out filter stage
    pub fn biquad() -> Self {
        Self {
            kind: NodeKind::Biquad,
            inputs: 1,
            outputs: 1,
            channels: 2,
        }
    }

    /// Processor node with an explicit port layout
    pub fn processor(name: &str, inputs: usize, outputs: usize, channels: usize) -> Self {
        Self {
            kind: NodeKind::Processor(name.to_string()),
            inputs,
            outputs,
            channels,
        }
    }
}

/// Copyable reference to a node created by a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeHandle {
    pub id: NodeId,
    pub inputs: usize,
    pub outputs: usize,
    pub channels: usize,
}

/// State of the context's rendering clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    /// Created but not rendering (the usual initial state)
    #[default]
    Suspended,
    /// Rendering quanta
    Running,
    /// Shut down; cannot host new nodes
    Closed,
}

impl fmt::Display for ClockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockState::Suspended => write!(f, "Suspended"),
            ClockState::Running => write!(f, "Running"),
            ClockState::Closed => write!(f, "Closed"),
        }
    }
}

/// Host-side processing context the voice pool is built against
///
/// Only `register_module` suspends. Everything else is synchronous and must
/// not block the rendering clock.
#[allow(async_fn_in_trait)]
pub trait ProcessingContext {
    /// Sample rate of the rendering clock in Hz
    fn sample_rate(&self) -> u32;

    /// Primary output of the context
    fn destination(&self) -> NodeHandle;

    /// Current clock state
    fn clock_state(&self) -> ClockState;

    /// Start (or restart) the rendering clock
    fn resume(&mut self) -> Result<()>;

    /// Load a processor module and register every processor it declares
    async fn register_module(&mut self, module: &str) -> Result<()>;

    /// Whether a processor of this name can be instantiated
    fn has_processor(&self, name: &str) -> bool;

    /// Allocate a zeroed sample buffer at the context's sample rate
    ///
    /// The buffer is charged to `owner`; releasing `owner` gives the
    /// samples back.
    fn allocate_buffer(
        &mut self,
        owner: &NodeHandle,
        layout: ChannelLayout,
        num_samples: usize,
    ) -> Result<AudioBuffer>;

    /// Create a node and return its handle
    fn create_node(&mut self, descriptor: NodeDescriptor) -> Result<NodeHandle>;

    /// Add a directed edge from `from`'s output to `to`'s input
    fn connect(
        &mut self,
        from: &NodeHandle,
        output: usize,
        to: &NodeHandle,
        input: usize,
    ) -> Result<()>;

    /// Look up a node created by this context
    fn node(&self, id: NodeId) -> Option<NodeHandle>;

    /// Ids of every live node
    fn node_ids(&self) -> Vec<NodeId>;

    /// Drop a node, every edge touching it and the buffers it owns
    fn release(&mut self, id: NodeId);
}
