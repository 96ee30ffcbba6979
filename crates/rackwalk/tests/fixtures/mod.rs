use rackwalk::{
    AccessorError, Capabilities, ChainSnapshot, ContainerKind, DeviceSnapshot, LiveAccessor,
    LiveSetSnapshot, LomPath, LomValue, ParameterSnapshot, Resolved, SnapshotAccessor,
    TrackSnapshot,
};
use std::cell::RefCell;

pub fn sentinel() -> f64 {
    f64::from_bits(1)
}

/// Track 1, device 0 is "Bass Rack":
///
/// ```text
/// Bass Rack (macros: Macro 1, <corrupted>, Macro 3)
/// ├── Low
/// │   ├── Saturator
/// │   └── Inner Rack
/// │       └── Core
/// │           └── EQ Eight
/// └── High
///     └── Compressor
/// ```
pub fn bass_rack() -> DeviceSnapshot {
    DeviceSnapshot::new("Bass Rack")
        .with_id(1)
        .with_property("class_name", "AudioEffectGroupDevice")
        .with_property("visible_macro_count", 8i64)
        .with_property("variation_count", 0i64)
        .with_parameters(vec![
            ParameterSnapshot::new("Macro 1", 0.5),
            ParameterSnapshot::new(sentinel(), 0.1),
            ParameterSnapshot::new("Macro 3", 0.25),
        ])
        .with_chains(vec![
            ChainSnapshot::new(
                "Low",
                vec![
                    DeviceSnapshot::new("Saturator")
                        .with_parameters(vec![ParameterSnapshot::new("Drive", 0.3)]),
                    DeviceSnapshot::new("Inner Rack").with_chains(vec![ChainSnapshot::new(
                        "Core",
                        vec![DeviceSnapshot::new("EQ Eight").with_parameters(vec![
                            ParameterSnapshot::new("Gain", 0.0),
                            ParameterSnapshot::new("Freq", 0.7)
                                .with_property("min", sentinel()),
                        ])],
                    )]),
                ],
            ),
            ChainSnapshot::new("High", vec![DeviceSnapshot::new("Compressor")]),
        ])
}

pub fn live_set(tracks: Vec<TrackSnapshot>) -> SnapshotAccessor {
    SnapshotAccessor::from_snapshot(&LiveSetSnapshot {
        tracks,
        ..Default::default()
    })
    .expect("Failed to build snapshot accessor")
}

/// Two tracks; the rack sits on track 1.
pub fn bass_set() -> SnapshotAccessor {
    live_set(vec![
        TrackSnapshot::new("Drums", vec![DeviceSnapshot::new("Drum Bus")]),
        TrackSnapshot::new("Bass", vec![bass_rack()]),
    ])
}

/// A rack whose single chain holds another rack, `levels` times over.
pub fn nested_racks(levels: usize) -> DeviceSnapshot {
    let mut device = DeviceSnapshot::new("Leaf");
    for level in (0..levels).rev() {
        device = DeviceSnapshot::new(format!("Rack {}", level))
            .with_chains(vec![ChainSnapshot::new("Chain", vec![device])]);
    }
    device
}

/// Records every path the wrapped accessor is asked about.
pub struct CountingAccessor<A> {
    inner: A,
    calls: RefCell<Vec<LomPath>>,
}

impl<A: LiveAccessor> CountingAccessor<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<LomPath> {
        self.calls.borrow().clone()
    }

    /// Deepest chain or device touched, with the extracted root at 0.
    /// Parameter reads belong to their device and are not counted.
    pub fn deepest_node_depth(&self, root: &LomPath) -> usize {
        let base = root.segments().len();
        self.calls
            .borrow()
            .iter()
            .filter(|p| p.last().map(|s| s.kind) != Some(ContainerKind::Parameters))
            .map(|p| p.segments().len() - base)
            .max()
            .unwrap_or(0)
    }

    fn record(&self, path: &LomPath) {
        self.calls.borrow_mut().push(path.clone());
    }
}

impl<A: LiveAccessor> LiveAccessor for CountingAccessor<A> {
    fn resolve(&self, path: &LomPath) -> Result<Resolved, AccessorError> {
        self.record(path);
        self.inner.resolve(path)
    }

    fn get_property(&self, path: &LomPath, name: &str) -> Result<LomValue, AccessorError> {
        self.record(path);
        self.inner.get_property(path, name)
    }

    fn child_count(&self, path: &LomPath, kind: ContainerKind) -> Result<usize, AccessorError> {
        self.record(path);
        self.inner.child_count(path, kind)
    }

    fn capabilities(&self, path: &LomPath) -> Result<Capabilities, AccessorError> {
        self.record(path);
        self.inner.capabilities(path)
    }
}

/// Reports itself unavailable for any path under `prefix`.
pub struct VanishingAccessor<A> {
    inner: A,
    prefix: String,
}

impl<A: LiveAccessor> VanishingAccessor<A> {
    pub fn new(inner: A, prefix: &LomPath) -> Self {
        Self {
            inner,
            prefix: prefix.to_string(),
        }
    }

    fn check(&self, path: &LomPath) -> Result<(), AccessorError> {
        if path.to_string().starts_with(&self.prefix) {
            Err(AccessorError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl<A: LiveAccessor> LiveAccessor for VanishingAccessor<A> {
    fn resolve(&self, path: &LomPath) -> Result<Resolved, AccessorError> {
        self.check(path)?;
        self.inner.resolve(path)
    }

    fn get_property(&self, path: &LomPath, name: &str) -> Result<LomValue, AccessorError> {
        self.check(path)?;
        self.inner.get_property(path, name)
    }

    fn child_count(&self, path: &LomPath, kind: ContainerKind) -> Result<usize, AccessorError> {
        self.check(path)?;
        self.inner.child_count(path, kind)
    }

    fn capabilities(&self, path: &LomPath) -> Result<Capabilities, AccessorError> {
        self.check(path)?;
        self.inner.capabilities(path)
    }
}
