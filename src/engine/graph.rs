//! In-process processing context
//!
//! `GraphContext` keeps the node arena and edge list that a real-time host
//! would keep internally. The CLI and the tests build pools against it.

use super::buffer::{AudioBuffer, ChannelLayout};
use super::context::{ClockState, NodeDescriptor, NodeHandle, NodeId, NodeKind, ProcessingContext};
use super::module::{BundledModules, ModuleLoader};
use crate::error::{Result, VoicePoolError};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Default sample rate of a new context
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Directed edge between two node ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Connection {
    pub from: NodeId,
    pub output: usize,
    pub to: NodeId,
    pub input: usize,
}

/// Node record held by the arena
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub inputs: usize,
    pub outputs: usize,
    pub channels: usize,
}

impl GraphNode {
    fn handle(&self) -> NodeHandle {
        NodeHandle {
            id: self.id,
            inputs: self.inputs,
            outputs: self.outputs,
            channels: self.channels,
        }
    }
}

/// Audio graph plus clock, module registry and allocation budget
#[derive(Debug)]
pub struct GraphContext<L: ModuleLoader = BundledModules> {
    sample_rate: u32,
    clock: ClockState,
    nodes: BTreeMap<NodeId, GraphNode>,
    connections: Vec<Connection>,
    next_id: usize,
    destination: NodeId,
    loader: L,
    modules: HashSet<String>,
    processors: HashSet<String>,
    /// Remaining samples that may be allocated; `None` is unbounded
    sample_budget: Option<usize>,
    /// Samples charged to each buffer-owning node
    charged: HashMap<NodeId, usize>,
}

impl GraphContext<BundledModules> {
    /// Context with the bundled voice module available
    pub fn new(sample_rate: u32) -> Self {
        Self::with_loader(sample_rate, BundledModules::with_defaults())
    }
}

impl Default for GraphContext<BundledModules> {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl<L: ModuleLoader> GraphContext<L> {
    /// Context resolving modules through `loader`
    ///
    /// The destination node (one stereo input) exists from the start and the
    /// clock starts suspended.
    pub fn with_loader(sample_rate: u32, loader: L) -> Self {
        let destination = NodeId(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(
            destination,
            GraphNode {
                id: destination,
                kind: NodeKind::Destination,
                inputs: 1,
                outputs: 0,
                channels: 2,
            },
        );

        Self {
            sample_rate,
            clock: ClockState::Suspended,
            nodes,
            connections: Vec::new(),
            next_id: 1,
            destination,
            loader,
            modules: HashSet::new(),
            processors: HashSet::new(),
            sample_budget: None,
            charged: HashMap::new(),
        }
    }

    /// Limit the total number of samples this context will allocate
    pub fn with_sample_budget(mut self, samples: usize) -> Self {
        self.sample_budget = Some(samples);
        self
    }

    /// Samples still available, if the context is budgeted
    pub fn remaining_samples(&self) -> Option<usize> {
        self.sample_budget
    }

    /// Shut the clock down; the context can no longer host a pool
    pub fn close(&mut self) {
        self.clock = ClockState::Closed;
    }

    /// All live nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All edges in creation order
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Edges leaving `id`
    pub fn connections_from(&self, id: NodeId) -> Vec<Connection> {
        self.connections
            .iter()
            .filter(|c| c.from == id)
            .copied()
            .collect()
    }

    /// Edges entering `id`
    pub fn connections_to(&self, id: NodeId) -> Vec<Connection> {
        self.connections
            .iter()
            .filter(|c| c.to == id)
            .copied()
            .collect()
    }

    /// Modules registered so far
    pub fn is_module_registered(&self, module: &str) -> bool {
        self.modules.contains(module)
    }

    fn node_ref(&self, handle: &NodeHandle) -> Result<&GraphNode> {
        self.nodes
            .get(&handle.id)
            .ok_or_else(|| VoicePoolError::InvalidConnection {
                reason: format!("node {} does not belong to this context", handle.id),
            })
    }
}

impl<L: ModuleLoader> ProcessingContext for GraphContext<L> {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn destination(&self) -> NodeHandle {
        self.nodes[&self.destination].handle()
    }

    fn clock_state(&self) -> ClockState {
        self.clock
    }

    fn resume(&mut self) -> Result<()> {
        match self.clock {
            ClockState::Closed => Err(VoicePoolError::InvalidContext {
                reason: "cannot resume a closed context".to_string(),
            }),
            _ => {
                self.clock = ClockState::Running;
                Ok(())
            }
        }
    }

    async fn register_module(&mut self, module: &str) -> Result<()> {
        if self.modules.contains(module) {
            return Ok(());
        }

        let manifest = self.loader.load(module).await?;
        tracing::debug!(
            module = %manifest.module,
            processors = ?manifest.processors,
            "module registered"
        );
        self.processors.extend(manifest.processors);
        self.modules.insert(manifest.module);
        Ok(())
    }

    fn has_processor(&self, name: &str) -> bool {
        self.processors.contains(name)
    }

    fn allocate_buffer(
        &mut self,
        owner: &NodeHandle,
        layout: ChannelLayout,
        num_samples: usize,
    ) -> Result<AudioBuffer> {
        if !self.nodes.contains_key(&owner.id) {
            return Err(VoicePoolError::NodeAllocation {
                details: format!("buffer owner {} does not belong to this context", owner.id),
            });
        }

        let requested = num_samples.saturating_mul(layout.num_channels());
        if let Some(remaining) = self.sample_budget {
            if requested > remaining {
                return Err(VoicePoolError::OutOfMemory {
                    details: format!(
                        "buffer of {} samples exceeds remaining budget of {}",
                        requested, remaining
                    ),
                });
            }
        }

        let buffer = AudioBuffer::try_new(num_samples, layout, self.sample_rate)?;
        if let Some(remaining) = self.sample_budget.as_mut() {
            *remaining -= requested;
        }
        *self.charged.entry(owner.id).or_default() += requested;
        Ok(buffer)
    }

    fn create_node(&mut self, descriptor: NodeDescriptor) -> Result<NodeHandle> {
        if self.clock == ClockState::Closed {
            return Err(VoicePoolError::NodeAllocation {
                details: "context is closed".to_string(),
            });
        }

        match &descriptor.kind {
            NodeKind::Destination => {
                return Err(VoicePoolError::NodeAllocation {
                    details: "a context has exactly one destination".to_string(),
                });
            }
            NodeKind::Processor(name) if !self.processors.contains(name) => {
                return Err(VoicePoolError::ProcessorNotRegistered {
                    processor: name.clone(),
                });
            }
            _ => {}
        }

        let id = NodeId(self.next_id);
        self.next_id += 1;
        let node = GraphNode {
            id,
            kind: descriptor.kind,
            inputs: descriptor.inputs,
            outputs: descriptor.outputs,
            channels: descriptor.channels,
        };
        let handle = node.handle();
        self.nodes.insert(id, node);
        Ok(handle)
    }

    fn connect(
        &mut self,
        from: &NodeHandle,
        output: usize,
        to: &NodeHandle,
        input: usize,
    ) -> Result<()> {
        let source = self.node_ref(from)?;
        if output >= source.outputs {
            return Err(VoicePoolError::InvalidConnection {
                reason: format!(
                    "node {} has {} outputs, cannot use output {}",
                    from.id, source.outputs, output
                ),
            });
        }

        let target = self.node_ref(to)?;
        if input >= target.inputs {
            return Err(VoicePoolError::InvalidConnection {
                reason: format!(
                    "node {} has {} inputs, cannot use input {}",
                    to.id, target.inputs, input
                ),
            });
        }

        let connection = Connection {
            from: from.id,
            output,
            to: to.id,
            input,
        };
        if self.connections.contains(&connection) {
            return Err(VoicePoolError::InvalidConnection {
                reason: format!(
                    "{}:{} is already connected to {}:{}",
                    from.id, output, to.id, input
                ),
            });
        }

        self.connections.push(connection);
        Ok(())
    }

    fn node(&self, id: NodeId) -> Option<NodeHandle> {
        self.nodes.get(&id).map(GraphNode::handle)
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    fn release(&mut self, id: NodeId) {
        if id == self.destination {
            return;
        }
        self.nodes.remove(&id);
        self.connections.retain(|c| c.from != id && c.to != id);
        if let (Some(samples), Some(remaining)) =
            (self.charged.remove(&id), self.sample_budget.as_mut())
        {
            *remaining += samples;
        }
    }
}
