//! Extraction entry point.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

use crate::normalize::UNNAMED;
use crate::{
    Annotations, ExtractError, ExtractionContext, LiveAccessor, LomPath, Metadata, NodeType,
    TreeWalker, Workflow, WorkflowDocument, DEFAULT_MAX_DEPTH,
};

pub const DEFAULT_EXTRACTOR_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorSettings {
    pub max_depth: usize,
    pub extractor_version: String,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            extractor_version: DEFAULT_EXTRACTOR_VERSION.to_string(),
        }
    }
}

/// Owns an accessor and the most recent extraction result.
///
/// Annotations set here are stamped onto every following extraction until
/// changed. Starting a new extraction discards the previous result, even if
/// the new one fails.
pub struct Extractor<A: LiveAccessor> {
    accessor: A,
    settings: ExtractorSettings,
    annotations: Annotations,
    current: Option<WorkflowDocument>,
}

impl<A: LiveAccessor> Extractor<A> {
    pub fn new(accessor: A, settings: ExtractorSettings) -> Self {
        Self {
            accessor,
            settings,
            annotations: Annotations::default(),
            current: None,
        }
    }

    pub fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }

    pub fn set_annotations(&mut self, annotations: Annotations) {
        self.annotations = annotations;
    }

    /// Extract the device at `track`/`device` and keep it as the current
    /// result.
    pub fn extract(
        &mut self,
        track: usize,
        device: usize,
    ) -> Result<&WorkflowDocument, ExtractError> {
        self.current = None;

        let path = LomPath::track_device(track, device);
        info!(path = %path, max_depth = self.settings.max_depth, "starting extraction");

        let mut ctx = ExtractionContext::new(self.settings.max_depth);
        let mut root = TreeWalker::new(&self.accessor, &mut ctx).walk_root(&path)?;
        debug_assert_eq!(ctx.handles().outstanding(), 0);

        let now = Utc::now();
        if root.name == UNNAMED {
            root.name = generated_name(root.node_type, track, device, now);
            debug!(name = %root.name, "root device has no usable name, generated one");
        }

        let document = WorkflowDocument {
            metadata: Metadata {
                extracted_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
                track_id: track,
                device_id: device,
                extractor_version: self.settings.extractor_version.clone(),
                annotations: self.annotations.clone(),
            },
            workflow: Workflow { root_device: root },
        };

        let summary = document.summary();
        info!(
            name = %document.root().name,
            chains = summary.chains,
            devices = summary.devices,
            parameters = summary.parameters,
            macros = summary.macros,
            errors = summary.errors,
            circular = summary.circular,
            skipped_parameters = ctx.skipped_parameters(),
            handles = ctx.handles().allocated(),
            "extraction complete"
        );

        Ok(&*self.current.insert(document))
    }

    pub fn current(&self) -> Option<&WorkflowDocument> {
        self.current.as_ref()
    }

    pub fn take(&mut self) -> Option<WorkflowDocument> {
        self.current.take()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

/// Name for a root whose own name is unusable, e.g. `Rack_T1D0_1700000000000`.
fn generated_name(node_type: NodeType, track: usize, device: usize, now: DateTime<Utc>) -> String {
    let prefix = match node_type {
        NodeType::Rack => "Rack",
        NodeType::Device => "Device",
    };
    format!("{}_T{}D{}_{}", prefix, track, device, now.timestamp_millis())
}
