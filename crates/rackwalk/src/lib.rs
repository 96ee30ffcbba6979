//! Rack hierarchy extraction for a DAW's live object model.
//!
//! Given a track and device index, rackwalk walks the device tree (racks
//! contain chains, chains contain devices, devices may be racks again),
//! reads every parameter along the way, filters out the host's corrupted
//! values and produces a [`WorkflowDocument`] ready for JSON export.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rackwalk::{Extractor, ExtractorSettings, SnapshotAccessor};
//!
//! let accessor = SnapshotAccessor::from_path("live_set.json".as_ref())?;
//! let mut extractor = Extractor::new(accessor, ExtractorSettings::default());
//!
//! let document = extractor.extract(0, 0)?;
//! println!("{:?}", document.summary());
//!
//! let json = rackwalk::export::to_json(document, true)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Failure handling
//!
//! Only a root device that cannot be resolved, or an accessor that has gone
//! away entirely, aborts an extraction. Everything below the root degrades
//! into inline markers:
//!
//! - `{"name": "Device 2", "error": "..."}` for a child that failed
//! - `{"circular": true, "reference_id": 7}` for an object seen earlier
//! - `{"depth_exceeded": true}` past the configured nesting bound

pub mod accessor;
pub mod annotations;
pub mod context;
pub mod diagnose;
pub mod error;
pub mod export;
pub mod extractor;
pub mod handles;
pub mod model;
pub mod normalize;
pub mod parameters;
pub mod path;
pub mod snapshot;
pub mod value;
pub mod walker;

pub use accessor::{AccessorError, Capabilities, LiveAccessor, ObjectId, Resolved};
pub use annotations::{Annotations, Difficulty};
pub use context::{ExtractionContext, DEFAULT_MAX_DEPTH};
pub use diagnose::{diagnose, DeviceOverview, LiveSetOverview, TrackOverview};
pub use error::ExtractError;
pub use extractor::{Extractor, ExtractorSettings, DEFAULT_EXTRACTOR_VERSION};
pub use handles::{HandleGuard, HandlePool, LiveHandle};
pub use model::{
    ChainEntry, ChainRecord, CircularMarker, DepthMarker, DeviceEntry, DeviceRecord,
    ErrorMarker, ExtractionSummary, Metadata, NodeType, ParameterRecord, RootDevice, Workflow,
    WorkflowDocument,
};
pub use path::{ContainerKind, LomPath, Segment, ROOT};
pub use snapshot::{
    ChainSnapshot, DeviceSnapshot, LiveSetSnapshot, ParameterSnapshot, SnapshotAccessor,
    SnapshotError, TrackSnapshot,
};
pub use value::LomValue;
pub use walker::TreeWalker;
