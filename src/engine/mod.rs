//! Audio Engine Module
//!
//! Host-side plumbing the voice pool is built against:
//! - Audio buffer management
//! - The processing context seam and its in-process graph implementation
//! - Processor module loading

pub mod buffer;
pub mod context;
pub mod graph;
pub mod module;

pub use buffer::{AudioBuffer, ChannelLayout};
pub use context::{ClockState, NodeDescriptor, NodeHandle, NodeId, NodeKind, ProcessingContext};
pub use graph::{Connection, GraphContext, GraphNode, DEFAULT_SAMPLE_RATE};
pub use module::{
    BundledModules, FileModuleLoader, ModuleLoader, ModuleManifest, VOICE_MODULE_PATH,
    VOICE_PROCESSOR_NAME,
};
