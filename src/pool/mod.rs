//! Voice pool
//!
//! A pool is built once per context: every voice owns its voice unit, noise
//! source, excitation filters and equalizer chain, and all voices share the
//! destination sink.

mod manager;
mod unit;
mod voice;

pub use manager::{init_voices, PoolState, VoicePoolManager};
pub use unit::{VoiceUnit, VoiceUnitOptions};
pub use voice::{StageSummary, Voice, VoicePool, VoiceSummary};
