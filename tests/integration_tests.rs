//! Integration Tests
//!
//! End-to-end pool builds against the in-process graph context.

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use voicepool::dsp::{noise_length, FilterType, ASPIRATION_INPUT, FRICATIVE_INPUT};
use voicepool::engine::{
    BundledModules, ClockState, Connection, GraphContext, ModuleLoader, ModuleManifest,
    NodeDescriptor, NodeHandle, NodeId, NodeKind, ProcessingContext, VOICE_MODULE_PATH,
};
use voicepool::{
    init_voices, ErrorKind, FilterBankConfig, PoolOptions, PoolState, VoicePool,
    VoicePoolError, VoicePoolManager,
};

/// Options with a fixed seed so noise tables are reproducible
fn seeded(max_voices: usize) -> PoolOptions {
    PoolOptions::default().with_max_voices(max_voices).with_seed(1234)
}

fn assert_voice_topology<L: ModuleLoader>(ctx: &GraphContext<L>, pool: &VoicePool) {
    let destination = pool.destination().id;
    for voice in pool {
        let unit = voice.unit().node().id;
        let noise = voice.noise().node().id;
        let asp = voice.excitation().aspiration().node().id;
        let fric = voice.excitation().fricative().node().id;
        let stages: Vec<NodeId> = voice.equalizer().stages().iter().map(|s| s.node().id).collect();

        // noise fans out to both band-passes and nowhere else
        let targets: HashSet<NodeId> = ctx.connections_from(noise).iter().map(|c| c.to).collect();
        assert_eq!(targets, HashSet::from([asp, fric]));

        assert_eq!(
            ctx.connections_from(asp),
            vec![Connection { from: asp, output: 0, to: unit, input: ASPIRATION_INPUT }]
        );
        assert_eq!(
            ctx.connections_from(fric),
            vec![Connection { from: fric, output: 0, to: unit, input: FRICATIVE_INPUT }]
        );

        // unit feeds only the first stage
        assert_eq!(
            ctx.connections_from(unit),
            vec![Connection { from: unit, output: 0, to: stages[0], input: 0 }]
        );

        // stages are strictly serial, the last one alone reaches the destination
        for (i, stage) in stages.iter().enumerate() {
            let edges = ctx.connections_from(*stage);
            assert_eq!(edges.len(), 1);
            let expected = stages.get(i + 1).copied().unwrap_or(destination);
            assert_eq!(edges[0].to, expected);
        }
        assert_eq!(voice.output().node().id, *stages.last().unwrap());
    }
}

#[tokio::test]
async fn test_default_scenario_five_voices_nineteen_stages() {
    let mut ctx = GraphContext::new(44100);
    let pool = init_voices(&mut ctx, None, seeded(5)).await.unwrap();

    assert_eq!(pool.len(), 5);
    for (index, voice) in pool.iter().enumerate() {
        assert_eq!(voice.id(), index);
        assert_eq!(voice.unit().voice_num(), index);

        let stages = voice.equalizer().stages();
        assert_eq!(stages.len(), 19);
        assert_eq!(stages[0].filter_type(), FilterType::LowShelf);
        assert_eq!(stages[0].frequency(), 31.0);
        assert_eq!(stages[18].filter_type(), FilterType::HighShelf);
        assert_eq!(stages[18].frequency(), 16000.0);
        for stage in &stages[1..18] {
            assert_eq!(stage.filter_type(), FilterType::Peaking);
        }
        for stage in stages {
            assert_eq!(stage.gain_db(), 0.0);
            assert_eq!(stage.q(), 2.871);
        }

        assert_eq!(voice.noise().len(), 44100 * 2);
        assert!(voice.noise().is_started());
        assert!(voice.noise().is_looping());
    }

    assert_voice_topology(&ctx, &pool);
    assert_eq!(ctx.connections_to(ctx.destination().id).len(), 5);
    assert_eq!(ctx.clock_state(), ClockState::Running);
}

#[tokio::test]
async fn test_voice_units_declare_two_inputs_one_stereo_output() {
    let mut ctx = GraphContext::new(8000);
    let pool = init_voices(&mut ctx, None, seeded(3)).await.unwrap();

    for voice in &pool {
        let node = voice.unit().node();
        assert_eq!((node.inputs, node.outputs, node.channels), (2, 1, 2));
        let kind = ctx.nodes().find(|n| n.id == node.id).map(|n| n.kind.clone());
        assert_eq!(kind, Some(NodeKind::Processor("voice".to_string())));
    }
}

#[tokio::test]
async fn test_zero_voices_leaves_destination_untouched() {
    let mut ctx = GraphContext::new(48000);
    let pool = init_voices(&mut ctx, None, seeded(0)).await.unwrap();

    assert!(pool.is_empty());
    assert_eq!(ctx.node_count(), 1);
    assert!(ctx.connections().is_empty());
}

#[tokio::test]
async fn test_two_frequency_bank() {
    let mut ctx = GraphContext::new(48000);
    let filter = FilterBankConfig::new(vec![200.0, 4000.0], 0.9).unwrap();
    let pool = init_voices(&mut ctx, None, seeded(2).with_filter(filter))
        .await
        .unwrap();

    for voice in &pool {
        let types: Vec<FilterType> =
            voice.equalizer().stages().iter().map(|s| s.filter_type()).collect();
        assert_eq!(types, vec![FilterType::LowShelf, FilterType::HighShelf]);
    }
    assert_voice_topology(&ctx, &pool);
}

#[tokio::test]
async fn test_single_frequency_bank_is_degenerate_but_valid() {
    let mut ctx = GraphContext::new(48000);
    let filter = FilterBankConfig::new(vec![1000.0], 1.0).unwrap();
    let pool = init_voices(&mut ctx, None, seeded(2).with_filter(filter))
        .await
        .unwrap();

    let destination = ctx.destination().id;
    for voice in &pool {
        assert_eq!(voice.equalizer().len(), 1);
        let only = voice.output();
        assert_eq!(only.filter_type(), FilterType::LowShelf);
        assert_eq!(voice.equalizer().input(), only.node());
        assert_eq!(ctx.connections_to(only.node().id).len(), 1);
        assert_eq!(
            ctx.connections_from(only.node().id),
            vec![Connection { from: only.node().id, output: 0, to: destination, input: 0 }]
        );
    }
}

#[tokio::test]
async fn test_noise_length_tracks_sample_rate() {
    for sample_rate in [8000, 22050, 96000] {
        let mut ctx = GraphContext::new(sample_rate);
        let pool = init_voices(&mut ctx, None, seeded(1)).await.unwrap();
        assert_eq!(pool[0].noise().len(), noise_length(sample_rate));
        assert_eq!(pool[0].noise().len(), sample_rate as usize * 2);
    }
}

#[tokio::test]
async fn test_voices_share_no_nodes() {
    let mut ctx = GraphContext::new(8000);
    let pool = init_voices(&mut ctx, None, seeded(4)).await.unwrap();

    let mut seen = HashSet::new();
    for voice in &pool {
        for id in voice.node_ids() {
            assert!(seen.insert(id), "node {} shared between voices", id);
        }
    }

    // Every edge stays inside one voice, apart from the final fan-in
    let destination = ctx.destination().id;
    for voice in &pool {
        let own: HashSet<NodeId> = voice.node_ids().into_iter().collect();
        for id in &own {
            for edge in ctx.connections_from(*id) {
                assert!(own.contains(&edge.to) || edge.to == destination);
            }
        }
    }
}

#[tokio::test]
async fn test_seeded_builds_are_reproducible() {
    let mut a = GraphContext::new(8000);
    let mut b = GraphContext::new(8000);
    let pool_a = init_voices(&mut a, None, seeded(2)).await.unwrap();
    let pool_b = init_voices(&mut b, None, seeded(2)).await.unwrap();

    assert_eq!(pool_a[0].noise().buffer(), pool_b[0].noise().buffer());
    assert_ne!(pool_a[0].noise().buffer(), pool_a[1].noise().buffer());
}

#[tokio::test]
async fn test_custom_destination() {
    let mut ctx = GraphContext::new(8000);
    let bus = ctx.create_node(NodeDescriptor::biquad()).unwrap();
    let pool = init_voices(&mut ctx, Some(bus), seeded(3)).await.unwrap();

    assert_eq!(pool.destination(), &bus);
    assert_eq!(ctx.connections_to(bus.id).len(), 3);
    assert!(ctx.connections_to(ctx.destination().id).is_empty());
}

#[tokio::test]
async fn test_foreign_destination_rejected_before_allocation() {
    let mut ctx = GraphContext::new(8000);
    let foreign = NodeHandle {
        id: NodeId(4242),
        inputs: 1,
        outputs: 0,
        channels: 2,
    };

    let err = init_voices(&mut ctx, Some(foreign), seeded(5))
        .await
        .unwrap_err();
    assert!(matches!(err, VoicePoolError::InvalidDestination { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(ctx.node_count(), 1);
    assert!(!ctx.is_module_registered(VOICE_MODULE_PATH));
}

#[tokio::test]
async fn test_destination_without_inputs_rejected() {
    let mut ctx = GraphContext::new(8000);
    let source = ctx.create_node(NodeDescriptor::buffer_source()).unwrap();
    let err = init_voices(&mut ctx, Some(source), seeded(1))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_DESTINATION");
    assert_eq!(ctx.node_count(), 2);
}

#[tokio::test]
async fn test_closed_context_rejected() {
    let mut ctx = GraphContext::new(8000);
    ctx.close();
    let err = init_voices(&mut ctx, None, seeded(1)).await.unwrap_err();
    assert_eq!(err.error_code(), "INVALID_CONTEXT");
}

#[tokio::test]
async fn test_registration_failure_returns_no_voices() {
    let mut ctx = GraphContext::with_loader(8000, BundledModules::new());
    let mut manager = VoicePoolManager::new(&mut ctx, seeded(5));

    let err = manager.build().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DependencyLoad);
    assert_eq!(manager.state(), PoolState::Failed);
    drop(manager);

    assert_eq!(ctx.node_count(), 1);
    assert_eq!(ctx.clock_state(), ClockState::Suspended);
}

struct SlowLoader;

impl ModuleLoader for SlowLoader {
    async fn load(&self, module: &str) -> voicepool::Result<ModuleManifest> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        BundledModules::with_defaults().load(module).await
    }
}

#[tokio::test]
async fn test_registration_timeout() {
    let mut ctx = GraphContext::with_loader(8000, SlowLoader);
    let options = PoolOptions {
        registration_timeout_ms: Some(20),
        ..seeded(2)
    };

    let err = init_voices(&mut ctx, None, options).await.unwrap_err();
    assert!(matches!(err, VoicePoolError::ModuleTimeout { timeout_ms: 20, .. }));
    assert_eq!(ctx.node_count(), 1);
}

#[tokio::test]
async fn test_out_of_memory_aborts_whole_build() {
    // Three 2-second tables at 1 kHz fit, the fourth does not
    let mut ctx = GraphContext::new(1000).with_sample_budget(7000);
    let err = init_voices(&mut ctx, None, seeded(5)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ResourceAllocation);
    assert_eq!(ctx.node_count(), 1);
    assert!(ctx.connections().is_empty());
    assert_eq!(ctx.clock_state(), ClockState::Suspended);

    // The whole budget is available again for the next attempt
    assert_eq!(ctx.remaining_samples(), Some(7000));
    let pool = init_voices(&mut ctx, None, seeded(3)).await.unwrap();
    assert_eq!(pool.len(), 3);
    assert_eq!(ctx.remaining_samples(), Some(1000));
}

#[tokio::test]
async fn test_gain_automation_after_build() {
    let mut ctx = GraphContext::new(48000);
    let mut pool = init_voices(&mut ctx, None, seeded(1)).await.unwrap();
    let connections_before = ctx.connections().to_vec();

    let voice = pool.get_mut(0).unwrap();
    voice.output_mut().set_gain_db(-6.0);
    voice.equalizer_mut().stage_mut(5).unwrap().set_gain_db(3.0);

    assert_eq!(pool[0].output().gain_db(), -6.0);
    assert_eq!(pool[0].equalizer().stage(5).unwrap().gain_db(), 3.0);
    // Topology is unchanged by parameter changes
    assert_eq!(ctx.connections(), connections_before.as_slice());
}

#[tokio::test]
async fn test_options_from_json() {
    let options = PoolOptions::from_json_str(
        r#"{"maxVoices": 2, "filter": {"f": [50, 500, 5000], "Q": 1.2}, "seed": 3}"#,
    )
    .unwrap();

    let mut ctx = GraphContext::new(16000);
    let pool = init_voices(&mut ctx, None, options).await.unwrap();
    assert_eq!(pool.len(), 2);
    assert_eq!(pool[1].equalizer().len(), 3);
    assert_eq!(pool[1].equalizer().stage(1).unwrap().filter_type(), FilterType::Peaking);
    assert_voice_topology(&ctx, &pool);
}
