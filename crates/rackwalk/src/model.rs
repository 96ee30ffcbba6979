//! Output document shape.
//!
//! Optional property fields default to `null` when read back, since the
//! export pass drops corrupted keys entirely.

use serde::{Deserialize, Serialize};

use crate::{Annotations, LomValue, ObjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Rack,
    Device,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rack => "rack",
            Self::Device => "device",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub parameter_id: usize,
    pub name: String,
    #[serde(default)]
    pub value: LomValue,
    #[serde(default)]
    pub display_value: LomValue,
    #[serde(default)]
    pub default_value: LomValue,
    #[serde(default)]
    pub min: LomValue,
    #[serde(default)]
    pub max: LomValue,
    #[serde(default)]
    pub is_quantized: LomValue,
}

/// Stand-in for a child whose resolution failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMarker {
    pub name: String,
    pub error: String,
}

/// Stand-in for an object already visited earlier in the same extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircularMarker {
    pub circular: bool,
    pub reference_id: ObjectId,
}

/// Stand-in for a chain or device below the maximum nesting depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthMarker {
    pub depth_exceeded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device_id: usize,
    pub name: String,
    pub path: String,
    pub depth: usize,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub parameters: Vec<ParameterRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<ChainEntry>>,
}

/// A position in a chain's device list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceEntry {
    Device(DeviceRecord),
    Circular(CircularMarker),
    DepthExceeded(DepthMarker),
    Failed(ErrorMarker),
}

impl DeviceEntry {
    pub fn as_device(&self) -> Option<&DeviceRecord> {
        match self {
            Self::Device(record) => Some(record),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRecord {
    pub chain_id: usize,
    pub path: String,
    pub depth: usize,
    pub devices: Vec<DeviceEntry>,
}

/// A position in a rack's chain list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainEntry {
    Chain(ChainRecord),
    DepthExceeded(DepthMarker),
    Failed(ErrorMarker),
}

impl ChainEntry {
    pub fn as_chain(&self) -> Option<&ChainRecord> {
        match self {
            Self::Chain(record) => Some(record),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootDevice {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub class_name: LomValue,
    #[serde(default)]
    pub visible_macro_count: LomValue,
    #[serde(default)]
    pub variation_count: LomValue,
    /// The root device's parameters are its macro controls.
    pub macros: Vec<ParameterRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<ChainEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub extracted_at: String,
    pub track_id: usize,
    pub device_id: usize,
    pub extractor_version: String,
    #[serde(flatten)]
    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub root_device: RootDevice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub metadata: Metadata,
    pub workflow: Workflow,
}

/// Totals over a document, counted recursively through nested racks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub chains: usize,
    pub devices: usize,
    pub parameters: usize,
    pub macros: usize,
    pub errors: usize,
    pub circular: usize,
    pub depth_exceeded: usize,
    pub max_depth: usize,
}

impl WorkflowDocument {
    pub fn root(&self) -> &RootDevice {
        &self.workflow.root_device
    }

    pub fn summary(&self) -> ExtractionSummary {
        let root = self.root();
        let mut summary = ExtractionSummary {
            macros: root.macros.len(),
            ..Default::default()
        };
        if let Some(chains) = &root.chains {
            count_chains(chains, &mut summary);
        }
        summary
    }
}

fn count_chains(chains: &[ChainEntry], summary: &mut ExtractionSummary) {
    for entry in chains {
        match entry {
            ChainEntry::Chain(chain) => {
                summary.chains += 1;
                summary.max_depth = summary.max_depth.max(chain.depth);
                count_devices(&chain.devices, summary);
            }
            ChainEntry::DepthExceeded(_) => summary.depth_exceeded += 1,
            ChainEntry::Failed(_) => summary.errors += 1,
        }
    }
}

fn count_devices(devices: &[DeviceEntry], summary: &mut ExtractionSummary) {
    for entry in devices {
        match entry {
            DeviceEntry::Device(device) => {
                summary.devices += 1;
                summary.parameters += device.parameters.len();
                summary.max_depth = summary.max_depth.max(device.depth);
                if let Some(chains) = &device.chains {
                    count_chains(chains, summary);
                }
            }
            DeviceEntry::Circular(_) => summary.circular += 1,
            DeviceEntry::DepthExceeded(_) => summary.depth_exceeded += 1,
            DeviceEntry::Failed(_) => summary.errors += 1,
        }
    }
}
