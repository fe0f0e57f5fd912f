//! Voice unit node
//!
//! The vocal-tract processor itself runs inside the host; here it is an
//! opaque node with two excitation inputs and one stereo output.

use crate::engine::{NodeDescriptor, NodeHandle, ProcessingContext};
use crate::error::Result;
use serde::Serialize;

/// Creation options for one voice unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceUnitOptions {
    pub processor: String,
    pub number_of_inputs: usize,
    pub number_of_outputs: usize,
    pub output_channel_count: usize,
    /// Index handed to the processor so it can tell voices apart
    pub voice_num: usize,
}

impl VoiceUnitOptions {
    /// Two excitation inputs, one stereo output (for panning)
    pub fn new(processor: &str, voice_num: usize) -> Self {
        Self {
            processor: processor.to_string(),
            number_of_inputs: 2,
            number_of_outputs: 1,
            output_channel_count: 2,
            voice_num,
        }
    }
}

/// Handle to a voice processor node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceUnit {
    node: NodeHandle,
    options: VoiceUnitOptions,
}

impl VoiceUnit {
    /// Instantiate the registered processor
    pub fn create<C: ProcessingContext>(ctx: &mut C, options: VoiceUnitOptions) -> Result<Self> {
        let node = ctx.create_node(NodeDescriptor::processor(
            &options.processor,
            options.number_of_inputs,
            options.number_of_outputs,
            options.output_channel_count,
        ))?;
        Ok(Self { node, options })
    }

    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    pub fn options(&self) -> &VoiceUnitOptions {
        &self.options
    }

    pub fn voice_num(&self) -> usize {
        self.options.voice_num
    }
}
