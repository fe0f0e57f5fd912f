//! Voice and VoicePool records

use super::unit::VoiceUnit;
use crate::dsp::{BiquadFilter, EqualizerChain, ExcitationFilterPair, NoiseSource};
use crate::engine::{NodeHandle, NodeId};
use serde::Serialize;
use std::ops::Index;

/// One excitation + resonance chain
///
/// The topology is frozen once built; stage parameters may still be
/// automated through the accessors.
#[derive(Debug, Clone)]
pub struct Voice {
    id: usize,
    unit: VoiceUnit,
    noise: NoiseSource,
    excitation: ExcitationFilterPair,
    equalizer: EqualizerChain,
}

impl Voice {
    pub(crate) fn new(
        id: usize,
        unit: VoiceUnit,
        noise: NoiseSource,
        excitation: ExcitationFilterPair,
        equalizer: EqualizerChain,
    ) -> Self {
        Self {
            id,
            unit,
            noise,
            excitation,
            equalizer,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn unit(&self) -> &VoiceUnit {
        &self.unit
    }

    pub fn noise(&self) -> &NoiseSource {
        &self.noise
    }

    pub fn noise_mut(&mut self) -> &mut NoiseSource {
        &mut self.noise
    }

    pub fn excitation(&self) -> &ExcitationFilterPair {
        &self.excitation
    }

    pub fn excitation_mut(&mut self) -> &mut ExcitationFilterPair {
        &mut self.excitation
    }

    pub fn equalizer(&self) -> &EqualizerChain {
        &self.equalizer
    }

    pub fn equalizer_mut(&mut self) -> &mut EqualizerChain {
        &mut self.equalizer
    }

    /// Final (filtered) output stage of the voice
    pub fn output(&self) -> &BiquadFilter {
        self.equalizer.output()
    }

    pub fn output_mut(&mut self) -> &mut BiquadFilter {
        self.equalizer.output_mut()
    }

    /// Every node this voice owns, in creation order
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids = vec![
            self.unit.node().id,
            self.noise.node().id,
            self.excitation.aspiration().node().id,
            self.excitation.fricative().node().id,
        ];
        ids.extend(self.equalizer.stages().iter().map(|s| s.node().id));
        ids
    }

    /// Serializable view of the voice's graph
    pub fn summary(&self) -> VoiceSummary {
        VoiceSummary {
            id: self.id,
            unit: self.unit.node().id,
            noise: self.noise.node().id,
            noise_samples: self.noise.len(),
            aspiration: self.excitation.aspiration().node().id,
            fricative: self.excitation.fricative().node().id,
            stages: self
                .equalizer
                .stages()
                .iter()
                .map(|s| StageSummary {
                    node: s.node().id,
                    filter_type: s.filter_type(),
                    frequency: s.frequency(),
                    q: s.q(),
                    gain_db: s.gain_db(),
                })
                .collect(),
            output: self.output().node().id,
        }
    }
}

/// Serializable view of one equalizer stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub node: NodeId,
    pub filter_type: crate::dsp::FilterType,
    pub frequency: f32,
    pub q: f32,
    pub gain_db: f32,
}

/// Serializable view of one voice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceSummary {
    pub id: usize,
    pub unit: NodeId,
    pub noise: NodeId,
    pub noise_samples: usize,
    pub aspiration: NodeId,
    pub fricative: NodeId,
    pub stages: Vec<StageSummary>,
    pub output: NodeId,
}

/// All voices of one build, indexed by voice id
#[derive(Debug, Clone)]
pub struct VoicePool {
    voices: Vec<Voice>,
    destination: NodeHandle,
}

impl VoicePool {
    pub(crate) fn new(voices: Vec<Voice>, destination: NodeHandle) -> Self {
        Self {
            voices,
            destination,
        }
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Sink every voice output is mixed into
    pub fn destination(&self) -> &NodeHandle {
        &self.destination
    }

    pub fn get(&self, id: usize) -> Option<&Voice> {
        self.voices.get(id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Voice> {
        self.voices.get_mut(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Voice> {
        self.voices.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Voice> {
        self.voices.iter_mut()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn summaries(&self) -> Vec<VoiceSummary> {
        self.voices.iter().map(Voice::summary).collect()
    }
}

impl Index<usize> for VoicePool {
    type Output = Voice;

    fn index(&self, id: usize) -> &Voice {
        &self.voices[id]
    }
}

impl<'a> IntoIterator for &'a VoicePool {
    type Item = &'a Voice;
    type IntoIter = std::slice::Iter<'a, Voice>;

    fn into_iter(self) -> Self::IntoIter {
        self.voices.iter()
    }
}

impl IntoIterator for VoicePool {
    type Item = Voice;
    type IntoIter = std::vec::IntoIter<Voice>;

    fn into_iter(self) -> Self::IntoIter {
        self.voices.into_iter()
    }
}
