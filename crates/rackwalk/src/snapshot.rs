//! In-memory live object model built from a JSON snapshot.
//!
//! Snapshots describe a live set as nested tracks, devices, chains and
//! parameters. A device may be written as `{"ref": <id>}` to point back at
//! another device labelled with `"id": <id>`, which models self-referential
//! hierarchies. Any object may carry `"fail": "<message>"` to make property
//! reads and child counts on it fail.
//!
//! ```json
//! {
//!   "tracks": [{
//!     "name": "Bass",
//!     "devices": [{
//!       "id": 1,
//!       "name": "Bass Rack",
//!       "class_name": "AudioEffectGroupDevice",
//!       "parameters": [{ "name": "Macro 1", "value": 0.0 }],
//!       "chains": [{ "name": "Low", "devices": [{ "name": "Saturator" }] }]
//!     }]
//!   }]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    AccessorError, Capabilities, ContainerKind, LiveAccessor, LomPath, LomValue, ObjectId,
    Resolved,
};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Device reference {0} does not match any device id")]
    DanglingRef(u64),

    #[error("Device id {0} is used more than once")]
    DuplicateId(u64),
}

type Properties = BTreeMap<String, LomValue>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveSetSnapshot {
    #[serde(default)]
    pub tracks: Vec<TrackSnapshot>,
    #[serde(flatten)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackSnapshot {
    #[serde(default)]
    pub devices: Vec<DeviceSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<String>,
    #[serde(flatten)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    /// Label other devices can point at with `ref`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterSnapshot>,
    /// `Some` makes the device rack-like, even with no chains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<ChainSnapshot>>,
    #[serde(flatten)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainSnapshot {
    #[serde(default)]
    pub devices: Vec<DeviceSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<String>,
    #[serde(flatten)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<String>,
    #[serde(flatten)]
    pub properties: Properties,
}

impl TrackSnapshot {
    pub fn new(name: &str, devices: Vec<DeviceSnapshot>) -> Self {
        Self {
            devices,
            properties: Properties::from([("name".to_string(), LomValue::from(name))]),
            ..Default::default()
        }
    }
}

impl DeviceSnapshot {
    pub fn new(name: impl Into<LomValue>) -> Self {
        Self {
            properties: Properties::from([("name".to_string(), name.into())]),
            ..Default::default()
        }
    }

    /// A device standing in for the one labelled `id`.
    pub fn reference(id: u64) -> Self {
        Self {
            reference: Some(id),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_property(mut self, name: &str, value: impl Into<LomValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<ParameterSnapshot>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_chains(mut self, chains: Vec<ChainSnapshot>) -> Self {
        self.chains = Some(chains);
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail = Some(message.to_string());
        self
    }
}

impl ChainSnapshot {
    pub fn new(name: &str, devices: Vec<DeviceSnapshot>) -> Self {
        Self {
            devices,
            properties: Properties::from([("name".to_string(), LomValue::from(name))]),
            ..Default::default()
        }
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail = Some(message.to_string());
        self
    }
}

impl ParameterSnapshot {
    /// A well-formed parameter ranging 0..1.
    pub fn new(name: impl Into<LomValue>, value: impl Into<LomValue>) -> Self {
        let value = value.into();
        let display = LomValue::Text(value.to_string());
        Self {
            fail: None,
            properties: Properties::from([
                ("name".to_string(), name.into()),
                ("value".to_string(), value),
                ("display_value".to_string(), display),
                ("default_value".to_string(), LomValue::Float(0.0)),
                ("min".to_string(), LomValue::Float(0.0)),
                ("max".to_string(), LomValue::Float(1.0)),
                ("is_quantized".to_string(), LomValue::Bool(false)),
            ]),
        }
    }

    pub fn with_property(mut self, name: &str, value: impl Into<LomValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail = Some(message.to_string());
        self
    }
}

#[derive(Debug)]
struct Object {
    properties: Properties,
    children: BTreeMap<ContainerKind, Vec<usize>>,
    fail: Option<String>,
}

/// Placeholder slot patched once every device label is known.
struct PendingRef {
    parent: usize,
    kind: ContainerKind,
    position: usize,
    label: u64,
}

#[derive(Default)]
struct Builder {
    objects: Vec<Object>,
    labels: HashMap<u64, usize>,
    pending: Vec<PendingRef>,
}

impl Builder {
    fn alloc(&mut self, properties: &Properties, fail: &Option<String>) -> usize {
        self.objects.push(Object {
            properties: properties.clone(),
            children: BTreeMap::new(),
            fail: fail.clone(),
        });
        self.objects.len() - 1
    }

    fn add_devices(
        &mut self,
        parent: usize,
        devices: &[DeviceSnapshot],
    ) -> Result<(), SnapshotError> {
        let mut children = Vec::with_capacity(devices.len());
        for (position, device) in devices.iter().enumerate() {
            match device.reference {
                Some(label) => {
                    self.pending.push(PendingRef {
                        parent,
                        kind: ContainerKind::Devices,
                        position,
                        label,
                    });
                    children.push(usize::MAX);
                }
                None => children.push(self.add_device(device)?),
            }
        }
        self.objects[parent]
            .children
            .insert(ContainerKind::Devices, children);
        Ok(())
    }

    fn add_device(&mut self, device: &DeviceSnapshot) -> Result<usize, SnapshotError> {
        let index = self.alloc(&device.properties, &device.fail);
        if let Some(label) = device.id {
            if self.labels.insert(label, index).is_some() {
                return Err(SnapshotError::DuplicateId(label));
            }
        }

        let parameters = device
            .parameters
            .iter()
            .map(|p| self.alloc(&p.properties, &p.fail))
            .collect();
        self.objects[index]
            .children
            .insert(ContainerKind::Parameters, parameters);

        if let Some(chains) = &device.chains {
            let mut chain_indices = Vec::with_capacity(chains.len());
            for chain in chains {
                let chain_index = self.alloc(&chain.properties, &chain.fail);
                self.add_devices(chain_index, &chain.devices)?;
                chain_indices.push(chain_index);
            }
            self.objects[index]
                .children
                .insert(ContainerKind::Chains, chain_indices);
        }

        Ok(index)
    }

    fn finish(mut self) -> Result<Vec<Object>, SnapshotError> {
        for pending in std::mem::take(&mut self.pending) {
            let target = *self
                .labels
                .get(&pending.label)
                .ok_or(SnapshotError::DanglingRef(pending.label))?;
            if let Some(slot) = self.objects[pending.parent]
                .children
                .get_mut(&pending.kind)
                .and_then(|c| c.get_mut(pending.position))
            {
                *slot = target;
            }
        }
        Ok(self.objects)
    }
}

/// [`LiveAccessor`] over a [`LiveSetSnapshot`].
///
/// Scalar properties come back wrapped in one-element lists, the way the
/// host's object model reports them.
#[derive(Debug)]
pub struct SnapshotAccessor {
    objects: Vec<Object>,
}

impl SnapshotAccessor {
    pub fn from_snapshot(snapshot: &LiveSetSnapshot) -> Result<Self, SnapshotError> {
        let mut builder = Builder::default();
        let root = builder.alloc(&snapshot.properties, &None);

        let mut tracks = Vec::with_capacity(snapshot.tracks.len());
        for track in &snapshot.tracks {
            let index = builder.alloc(&track.properties, &track.fail);
            builder.add_devices(index, &track.devices)?;
            tracks.push(index);
        }
        builder.objects[root]
            .children
            .insert(ContainerKind::Tracks, tracks);

        Ok(Self {
            objects: builder.finish()?,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: LiveSetSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }

    pub fn from_path(path: &Path) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path).map_err(|e| SnapshotError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    fn locate(&self, path: &LomPath) -> Option<usize> {
        let mut current = 0;
        for segment in path.segments() {
            current = *self.objects[current]
                .children
                .get(&segment.kind)?
                .get(segment.index)?;
        }
        Some(current)
    }

    fn object(&self, path: &LomPath) -> Result<&Object, AccessorError> {
        self.locate(path)
            .map(|index| &self.objects[index])
            .ok_or_else(|| AccessorError::invalid_path(path))
    }
}

impl LiveAccessor for SnapshotAccessor {
    fn resolve(&self, path: &LomPath) -> Result<Resolved, AccessorError> {
        Ok(match self.locate(path) {
            Some(index) => Resolved {
                id: ObjectId(index as u64 + 1),
                exists: true,
            },
            None => Resolved {
                id: ObjectId(0),
                exists: false,
            },
        })
    }

    fn get_property(&self, path: &LomPath, name: &str) -> Result<LomValue, AccessorError> {
        let object = self.object(path)?;
        if let Some(message) = &object.fail {
            return Err(AccessorError::Property {
                path: path.to_string(),
                property: name.to_string(),
                message: message.clone(),
            });
        }

        Ok(match object.properties.get(name) {
            None | Some(LomValue::Null) => LomValue::Null,
            Some(list @ LomValue::List(_)) => list.clone(),
            Some(scalar) => LomValue::List(vec![scalar.clone()]),
        })
    }

    fn child_count(&self, path: &LomPath, kind: ContainerKind) -> Result<usize, AccessorError> {
        let object = self.object(path)?;
        if let Some(message) = &object.fail {
            return Err(AccessorError::Count {
                path: path.to_string(),
                kind,
                message: message.clone(),
            });
        }
        Ok(object.children.get(&kind).map_or(0, Vec::len))
    }

    fn capabilities(&self, path: &LomPath) -> Result<Capabilities, AccessorError> {
        let object = self.object(path)?;
        Ok(Capabilities::new(object.children.keys().copied()))
    }
}
