mod fixtures;

use fixtures::{
    bass_rack, bass_set, live_set, nested_racks, sentinel, CountingAccessor, VanishingAccessor,
};
use pretty_assertions::assert_eq;
use rackwalk::{
    export, AccessorError, ChainEntry, ChainSnapshot, ContainerKind, DeviceEntry, DeviceSnapshot,
    Difficulty, ExtractError, ExtractionContext, Extractor, ExtractorSettings, LiveAccessor,
    LomPath, LomValue, NodeType, ObjectId, ParameterSnapshot, TrackSnapshot, TreeWalker,
};

fn extractor<A: LiveAccessor>(accessor: A) -> Extractor<A> {
    Extractor::new(accessor, ExtractorSettings::default())
}

fn chain(entry: &ChainEntry) -> &rackwalk::ChainRecord {
    entry.as_chain().expect("expected a chain record")
}

fn device(entry: &DeviceEntry) -> &rackwalk::DeviceRecord {
    entry.as_device().expect("expected a device record")
}

/// Deepest chain or device record anywhere under `chains`.
fn deepest_record(chains: &[ChainEntry]) -> usize {
    chains
        .iter()
        .filter_map(ChainEntry::as_chain)
        .map(|chain| {
            chain
                .devices
                .iter()
                .filter_map(DeviceEntry::as_device)
                .map(|d| d.depth.max(d.chains.as_deref().map_or(0, deepest_record)))
                .fold(chain.depth, usize::max)
        })
        .max()
        .unwrap_or(0)
}

#[test]
fn test_macros_skip_corrupted_parameters() {
    let mut extractor = extractor(bass_set());
    let document = extractor.extract(1, 0).unwrap();
    let root = document.root();

    assert_eq!(root.name, "Bass Rack");
    assert_eq!(root.node_type, NodeType::Rack);
    assert_eq!(root.path, "live_set tracks 1 devices 0");
    assert_eq!(root.class_name, LomValue::from("AudioEffectGroupDevice"));
    assert_eq!(root.visible_macro_count, LomValue::Int(8));

    let macros: Vec<_> = root
        .macros
        .iter()
        .map(|m| (m.parameter_id, m.name.as_str()))
        .collect();
    assert_eq!(macros, vec![(0, "Macro 1"), (2, "Macro 3")]);
    assert_eq!(root.macros[0].value, LomValue::Float(0.5));
}

#[test]
fn test_nested_rack_depths() {
    let mut extractor = extractor(bass_set());
    let root = extractor.extract(1, 0).unwrap().root().clone();
    let chains = root.chains.as_ref().unwrap();
    assert_eq!(chains.len(), 2);

    let low = chain(&chains[0]);
    assert_eq!(low.depth, 1);
    assert_eq!(low.path, "live_set tracks 1 devices 0 chains 0");
    assert_eq!(low.devices.len(), 2);

    let saturator = device(&low.devices[0]);
    assert_eq!(saturator.depth, 2);
    assert_eq!(saturator.node_type, NodeType::Device);
    assert!(saturator.chains.is_none());
    assert_eq!(saturator.parameters[0].name, "Drive");

    let inner = device(&low.devices[1]);
    assert_eq!(inner.depth, 2);
    assert_eq!(inner.node_type, NodeType::Rack);
    let core = chain(&inner.chains.as_ref().unwrap()[0]);
    assert_eq!(core.depth, 3);
    let eq = device(&core.devices[0]);
    assert_eq!(eq.depth, 4);
    assert_eq!(eq.path, "live_set tracks 1 devices 0 chains 0 devices 1 chains 0 devices 0");

    // only the corrupted optional field is nulled
    assert_eq!(eq.parameters.len(), 2);
    assert_eq!(eq.parameters[1].min, LomValue::Null);
    assert_eq!(eq.parameters[1].max, LomValue::Float(1.0));

    let high = chain(&chains[1]);
    assert_eq!(high.depth, 1);
    assert_eq!(device(&high.devices[0]).name, "Compressor");
}

#[test]
fn test_depth_increases_by_one_per_edge() {
    fn check_chains(chains: &[ChainEntry], parent_depth: usize) {
        for entry in chains {
            let chain = chain(entry);
            assert_eq!(chain.depth, parent_depth + 1);
            for entry in &chain.devices {
                let device = device(entry);
                assert_eq!(device.depth, chain.depth + 1);
                if let Some(chains) = &device.chains {
                    check_chains(chains, device.depth);
                }
            }
        }
    }

    let accessor = live_set(vec![TrackSnapshot::new("Deep", vec![nested_racks(4)])]);
    let mut extractor = extractor(accessor);
    let document = extractor.extract(0, 0).unwrap();
    check_chains(document.root().chains.as_ref().unwrap(), 0);
    assert_eq!(document.summary().max_depth, 8);
}

#[test]
fn test_summary_counts() {
    let mut extractor = extractor(bass_set());
    let summary = extractor.extract(1, 0).unwrap().summary();

    assert_eq!(summary.chains, 3);
    assert_eq!(summary.devices, 4);
    assert_eq!(summary.parameters, 3);
    assert_eq!(summary.macros, 2);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.circular, 0);
    assert_eq!(summary.max_depth, 4);
}

#[test]
fn test_unresolvable_root_is_fatal() {
    let mut extractor = extractor(bass_set());
    extractor.extract(1, 0).unwrap();

    let err = extractor.extract(5, 0).unwrap_err();
    match &err {
        ExtractError::RootUnresolvable { path, .. } => {
            assert_eq!(path, "live_set tracks 5 devices 0")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("live_set tracks 5 devices 0"));
    // the previous result is gone and nothing replaced it
    assert!(extractor.current().is_none());
}

#[test]
fn test_root_name_failure_is_fatal() {
    let accessor = live_set(vec![TrackSnapshot::new(
        "T",
        vec![DeviceSnapshot::new("Broken").failing("device deleted")],
    )]);
    let err = extractor(accessor).extract(0, 0).unwrap_err();
    assert!(matches!(err, ExtractError::RootUnresolvable { .. }));
}

#[test]
fn test_failed_device_keeps_siblings() {
    let devices = vec![
        DeviceSnapshot::new("One"),
        DeviceSnapshot::new("Two"),
        DeviceSnapshot::new("Three").failing("property read failed"),
        DeviceSnapshot::new("Four"),
        DeviceSnapshot::new("Five"),
    ];
    let rack = DeviceSnapshot::new("Rack").with_chains(vec![ChainSnapshot::new("Main", devices)]);
    let mut extractor = extractor(live_set(vec![TrackSnapshot::new("T", vec![rack])]));

    let document = extractor.extract(0, 0).unwrap();
    let main = chain(&document.root().chains.as_ref().unwrap()[0]);
    assert_eq!(main.devices.len(), 5);

    match &main.devices[2] {
        DeviceEntry::Failed(marker) => {
            assert_eq!(marker.name, "Device 2");
            assert!(marker.error.contains("property read failed"));
        }
        other => panic!("expected error marker, got {other:?}"),
    }
    for i in [0, 1, 3, 4] {
        assert!(main.devices[i].as_device().is_some());
    }
    assert_eq!(device(&main.devices[4]).name, "Five");
    assert_eq!(document.summary().errors, 1);
}

#[test]
fn test_failed_chain_becomes_marker() {
    let rack = DeviceSnapshot::new("Rack").with_chains(vec![
        ChainSnapshot::new("Dead", vec![DeviceSnapshot::new("X")]).failing("chain gone"),
        ChainSnapshot::new("Alive", vec![DeviceSnapshot::new("Y")]),
    ]);
    let mut extractor = extractor(live_set(vec![TrackSnapshot::new("T", vec![rack])]));
    let chains = extractor.extract(0, 0).unwrap().root().chains.clone().unwrap();

    match &chains[0] {
        ChainEntry::Failed(marker) => assert_eq!(marker.name, "Chain 0"),
        other => panic!("expected error marker, got {other:?}"),
    }
    assert_eq!(chain(&chains[1]).devices.len(), 1);
}

#[test]
fn test_cycle_becomes_circular_marker() {
    let rack = DeviceSnapshot::new("Feedback Rack").with_id(9).with_chains(vec![
        ChainSnapshot::new(
            "Loop",
            vec![DeviceSnapshot::new("Delay"), DeviceSnapshot::reference(9)],
        ),
    ]);
    let accessor = live_set(vec![TrackSnapshot::new("T", vec![rack])]);
    let root_id = accessor.resolve(&LomPath::track_device(0, 0)).unwrap().id;

    let mut extractor = extractor(accessor);
    let document = extractor.extract(0, 0).unwrap();
    let looped = chain(&document.root().chains.as_ref().unwrap()[0]);

    match &looped.devices[1] {
        DeviceEntry::Circular(marker) => {
            assert!(marker.circular);
            assert_eq!(marker.reference_id, root_id);
        }
        other => panic!("expected circular marker, got {other:?}"),
    }
    assert_eq!(document.summary().circular, 1);
}

#[test]
fn test_indirect_cycle_terminates() {
    let inner = DeviceSnapshot::new("Inner").with_id(2).with_chains(vec![ChainSnapshot::new(
        "Back",
        vec![DeviceSnapshot::reference(1), DeviceSnapshot::reference(2)],
    )]);
    let outer = DeviceSnapshot::new("Outer")
        .with_id(1)
        .with_chains(vec![ChainSnapshot::new("Down", vec![inner])]);
    let mut extractor = extractor(live_set(vec![TrackSnapshot::new("T", vec![outer])]));

    let summary = extractor.extract(0, 0).unwrap().summary();
    assert_eq!(summary.devices, 1);
    assert_eq!(summary.circular, 2);
}

#[test]
fn test_depth_bound_stops_accessor_calls() {
    let root = LomPath::track_device(0, 0);
    let accessor = CountingAccessor::new(live_set(vec![TrackSnapshot::new(
        "Deep",
        vec![nested_racks(8)],
    )]));
    let settings = ExtractorSettings {
        max_depth: 5,
        ..Default::default()
    };
    let mut extractor = Extractor::new(&accessor, settings);

    let summary = extractor.extract(0, 0).unwrap().summary();
    assert_eq!(summary.depth_exceeded, 1);
    assert_eq!(summary.max_depth, 5);
    assert!(accessor.deepest_node_depth(&root) <= 5);
    assert!(!accessor.calls().is_empty());
}

#[test]
fn test_depth_bound_covers_chains() {
    // Rack 5 sits exactly at depth 10, so its chain is the first node past the bound.
    let root = LomPath::track_device(0, 0);
    let accessor = CountingAccessor::new(live_set(vec![TrackSnapshot::new(
        "Deep",
        vec![nested_racks(8)],
    )]));
    let settings = ExtractorSettings {
        max_depth: 10,
        ..Default::default()
    };
    let mut extractor = Extractor::new(&accessor, settings);

    let document = extractor.extract(0, 0).unwrap();
    let summary = document.summary();
    assert_eq!(summary.depth_exceeded, 1);
    assert_eq!(summary.max_depth, 10);
    assert_eq!(accessor.deepest_node_depth(&root), 10);

    let chains = document.root().chains.as_deref().unwrap();
    assert_eq!(deepest_record(chains), 10);

    let mut rack = device(&chain(&chains[0]).devices[0]);
    while rack.depth < 10 {
        rack = device(&chain(&rack.chains.as_ref().unwrap()[0]).devices[0]);
    }
    assert_eq!(rack.name, "Rack 5");
    let below = rack.chains.as_ref().unwrap();
    assert_eq!(below.len(), 1);
    assert!(matches!(&below[0], ChainEntry::DepthExceeded(m) if m.depth_exceeded));
}

#[test]
fn test_depth_marker_position() {
    let settings = ExtractorSettings {
        max_depth: 1,
        ..Default::default()
    };
    let mut extractor = Extractor::new(bass_set(), settings);
    let root = extractor.extract(1, 0).unwrap().root().clone();

    let low = chain(&root.chains.as_ref().unwrap()[0]);
    assert_eq!(low.devices.len(), 2);
    for entry in &low.devices {
        assert!(matches!(entry, DeviceEntry::DepthExceeded(m) if m.depth_exceeded));
    }
}

#[test]
fn test_unavailable_accessor_aborts() {
    let chain_path = LomPath::track_device(1, 0).child(ContainerKind::Chains, 1);
    let accessor = VanishingAccessor::new(bass_set(), &chain_path);

    let mut extractor = extractor(accessor);
    let err = extractor.extract(1, 0).unwrap_err();
    assert!(matches!(err, ExtractError::Accessor(AccessorError::Unavailable)));
    assert!(extractor.current().is_none());
}

#[test]
fn test_handles_released_after_walk() {
    let accessor = bass_set();
    let mut ctx = ExtractionContext::default();
    let root = TreeWalker::new(&accessor, &mut ctx)
        .walk_root(&LomPath::track_device(1, 0))
        .unwrap();

    assert_eq!(root.name, "Bass Rack");
    assert_eq!(ctx.handles().outstanding(), 0);
    // one handle per recursion level, not per node
    assert!(ctx.handles().allocated() <= 6);
    assert_eq!(ctx.skipped_parameters(), 1);
    assert_eq!(ctx.node_errors(), 0);
}

#[test]
fn test_contexts_do_not_leak_between_runs() {
    let mut extractor = extractor(bass_set());
    let first = extractor.extract(1, 0).unwrap().summary();
    let second = extractor.extract(1, 0).unwrap().summary();
    // a leaked visited set would turn the second run into circular markers
    assert_eq!(first, second);
}

#[test]
fn test_unnamed_root_gets_generated_name() {
    let rack = DeviceSnapshot::new(sentinel())
        .with_chains(vec![ChainSnapshot::new("A", vec![DeviceSnapshot::new("")])]);
    let mut extractor = extractor(live_set(vec![
        TrackSnapshot::new("T0", vec![]),
        TrackSnapshot::new("T1", vec![DeviceSnapshot::new("X"), rack]),
    ]));

    let root = extractor.extract(1, 1).unwrap().root().clone();
    assert!(root.name.starts_with("Rack_T1D1_"), "got {}", root.name);

    let child = device(&chain(&root.chains.unwrap()[0]).devices[0]).clone();
    assert_eq!(child.name, "unnamed");
}

#[test]
fn test_plain_device_root() {
    let mut extractor = extractor(bass_set());
    let root = extractor.extract(0, 0).unwrap().root().clone();
    assert_eq!(root.node_type, NodeType::Device);
    assert!(root.chains.is_none());
    assert!(root.macros.is_empty());
    assert_eq!(root.class_name, LomValue::Null);
}

#[test]
fn test_export_shape() {
    let mut extractor = extractor(bass_set());
    let document = extractor.extract(1, 0).unwrap();
    let value = export::to_value(document).unwrap();

    let metadata = value["metadata"].as_object().unwrap();
    let mut keys: Vec<_> = metadata.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["device_id", "extracted_at", "extractor_version", "track_id"]);
    assert_eq!(value["metadata"]["extractor_version"], "2.0");
    assert_eq!(value["metadata"]["track_id"], 1);

    let root = &value["workflow"]["root_device"];
    assert_eq!(root["type"], "rack");
    assert_eq!(root["chains"][0]["devices"][0]["type"], "device");
    assert!(root["chains"][0]["devices"][0].get("chains").is_none());

    let eq = &root["chains"][0]["devices"][1]["chains"][0]["devices"][0];
    assert_eq!(eq["name"], "EQ Eight");
    assert!(eq["parameters"][1]["min"].is_null());
    assert!(!serde_json::to_string(&value).unwrap().contains("5e-324"));
}

#[test]
fn test_annotations_stamped_on_next_extraction() {
    let mut extractor = extractor(bass_set());
    {
        let annotations = extractor.annotations_mut();
        annotations.add_tags(["Bass", "multiband", "BASS"]);
        annotations.description = "Three-band bass processing".to_string();
        annotations.difficulty = Some(Difficulty::Intermediate);
    }

    let document = extractor.extract(1, 0).unwrap();
    let value = export::to_value(document).unwrap();
    assert_eq!(value["metadata"]["tags"], serde_json::json!(["bass", "multiband"]));
    assert_eq!(value["metadata"]["difficulty"], "intermediate");
    assert_eq!(value["metadata"]["description"], "Three-band bass processing");
    assert!(value["metadata"].get("genre").is_none());
}

#[test]
fn test_clear_and_take() {
    let mut extractor = extractor(bass_set());
    extractor.extract(1, 0).unwrap();
    assert!(extractor.current().is_some());

    extractor.clear();
    assert!(extractor.current().is_none());

    extractor.extract(0, 0).unwrap();
    let taken = extractor.take().unwrap();
    assert_eq!(taken.root().name, "Drum Bus");
    assert!(extractor.current().is_none());
}

#[test]
fn test_parameter_read_failure_skips_index() {
    let device = DeviceSnapshot::new("Synth").with_parameters(vec![
        ParameterSnapshot::new("Osc", 0.1),
        ParameterSnapshot::new("Filter", 0.2).failing("parameter vanished"),
        ParameterSnapshot::new("Amp", 0.3),
    ]);
    let mut extractor = extractor(live_set(vec![TrackSnapshot::new("T", vec![device])]));
    let root = extractor.extract(0, 0).unwrap().root().clone();

    let ids: Vec<_> = root.macros.iter().map(|p| p.parameter_id).collect();
    assert_eq!(ids, vec![0, 2]);
}

#[test]
fn test_same_rack_on_two_tracks_is_not_circular() {
    let mut extractor = extractor(live_set(vec![
        TrackSnapshot::new("A", vec![bass_rack()]),
        TrackSnapshot::new("B", vec![bass_rack().with_id(2)]),
    ]));
    assert_eq!(extractor.extract(0, 0).unwrap().summary().circular, 0);
    assert_eq!(extractor.extract(1, 0).unwrap().summary().circular, 0);
}

#[test]
fn test_reference_ids_are_stable() {
    let accessor = bass_set();
    let a = accessor.resolve(&LomPath::track_device(1, 0)).unwrap();
    let b = accessor.resolve(&LomPath::track_device(1, 0)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a.id, ObjectId(0));
}
