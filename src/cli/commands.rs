//! CLI Command Implementations

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::config::PoolOptions;
use crate::engine::buffer::{calculate_peak, calculate_rms};
use crate::engine::{
    AudioBuffer, ClockState, FileModuleLoader, GraphContext, ModuleLoader, ProcessingContext,
};
use crate::error::{Result, VoicePoolError};
use crate::pool::{init_voices, VoicePool, VoiceSummary};

/// Topology of a freshly built pool
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub sample_rate: u32,
    pub clock: ClockState,
    pub node_count: usize,
    pub connection_count: usize,
    pub voices: Vec<VoiceSummary>,
}

impl BuildReport {
    pub fn new<L: ModuleLoader>(ctx: &GraphContext<L>, pool: &VoicePool) -> Self {
        Self {
            sample_rate: ctx.sample_rate(),
            clock: ctx.clock_state(),
            node_count: ctx.node_count(),
            connection_count: ctx.connections().len(),
            voices: pool.summaries(),
        }
    }
}

/// Peak and RMS level of one rendered band, in dBFS
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandLevels {
    pub peak_db: f32,
    pub rms_db: f32,
}

impl BandLevels {
    pub fn measure(samples: &[f32]) -> Self {
        Self {
            peak_db: calculate_peak(samples),
            rms_db: calculate_rms(samples),
        }
    }
}

/// Levels of a rendered excitation file
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExcitationReport {
    pub aspiration: BandLevels,
    pub fricative: BandLevels,
}

/// Build a pool against an in-process context and print its topology.
pub async fn build(
    config: Option<&Path>,
    sample_rate: u32,
    module_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let options = match config {
        Some(path) => {
            info!("Loading pool options from: {}", path.display());
            PoolOptions::from_file(path)?
        }
        None => PoolOptions::default(),
    };

    let report = match module_dir {
        Some(dir) => {
            let mut ctx = GraphContext::with_loader(sample_rate, FileModuleLoader::new(dir));
            let pool = init_voices(&mut ctx, None, options).await?;
            BuildReport::new(&ctx, &pool)
        }
        None => {
            let mut ctx = GraphContext::new(sample_rate);
            let pool = init_voices(&mut ctx, None, options).await?;
            BuildReport::new(&ctx, &pool)
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Built {} voice(s) at {} Hz ({} nodes, {} connections, clock {:?})",
        report.voices.len(),
        report.sample_rate,
        report.node_count,
        report.connection_count,
        report.clock
    );
    for voice in &report.voices {
        let first = voice.stages.first();
        let last = voice.stages.last();
        println!(
            "  voice {}: unit {}, noise {} ({} samples), {} EQ stages ({:.0} Hz .. {:.0} Hz), output {}",
            voice.id,
            voice.unit,
            voice.noise,
            voice.noise_samples,
            voice.stages.len(),
            first.map(|s| s.frequency).unwrap_or_default(),
            last.map(|s| s.frequency).unwrap_or_default(),
            voice.output
        );
    }

    Ok(())
}

/// Render the two excitation bands of a single voice to a stereo WAV file.
pub async fn render_excitation(
    out: &Path,
    seconds: f64,
    sample_rate: u32,
    seed: Option<u64>,
) -> Result<ExcitationReport> {
    if !(seconds.is_finite() && seconds > 0.0) {
        return Err(VoicePoolError::InvalidOption {
            option: "seconds".to_string(),
            value: seconds.to_string(),
            expected: "a positive duration".to_string(),
        });
    }

    let mut options = PoolOptions::default().with_max_voices(1);
    options.seed = seed;

    let mut ctx = GraphContext::new(sample_rate);
    let mut pool = init_voices(&mut ctx, None, options).await?;
    let voice = pool
        .get_mut(0)
        .ok_or_else(|| VoicePoolError::NodeAllocation {
            details: "pool has no voice to render".to_string(),
        })?;

    let num_samples = (seconds * sample_rate as f64) as usize;
    let mut noise = vec![0.0_f32; num_samples];
    let mut aspiration = vec![0.0_f32; num_samples];
    let mut fricative = vec![0.0_f32; num_samples];
    voice.noise_mut().render(&mut noise);
    voice
        .excitation_mut()
        .process(&noise, &mut aspiration, &mut fricative);

    let report = ExcitationReport {
        aspiration: BandLevels::measure(&aspiration),
        fricative: BandLevels::measure(&fricative),
    };
    let rendered = AudioBuffer::from_channels(vec![aspiration, fricative], sample_rate)?;
    write_wav(out, &rendered)?;

    info!(
        "Rendered {:.2}s of excitation to {}",
        rendered.duration_secs(),
        out.display()
    );
    println!("Wrote {}", out.display());
    println!(
        "  aspiration: peak {:.1} dBFS, rms {:.1} dBFS",
        report.aspiration.peak_db, report.aspiration.rms_db
    );
    println!(
        "  fricative:  peak {:.1} dBFS, rms {:.1} dBFS",
        report.fricative.peak_db, report.fricative.rms_db
    );
    Ok(report)
}

/// Print the default options.
pub fn show_config() -> Result<()> {
    println!("{}", PoolOptions::default().to_json_pretty()?);
    Ok(())
}

fn write_wav(path: &Path, buffer: &AudioBuffer) -> Result<()> {
    let spec = hound::WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in buffer.to_interleaved() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
