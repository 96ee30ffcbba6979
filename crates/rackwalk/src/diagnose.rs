//! Quick overview of what a live set contains, for picking extraction
//! targets.

use serde::Serialize;
use tracing::warn;

use crate::normalize::name_or_fallback;
use crate::{AccessorError, ContainerKind, LiveAccessor, LomPath};

pub const TRACK_LIMIT: usize = 10;
pub const DEVICE_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceOverview {
    pub index: usize,
    pub name: String,
    pub is_rack: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackOverview {
    pub index: usize,
    pub name: String,
    pub device_count: usize,
    pub devices: Vec<DeviceOverview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveSetOverview {
    pub track_count: usize,
    pub tracks: Vec<TrackOverview>,
}

/// List the first [`TRACK_LIMIT`] tracks and up to [`DEVICE_LIMIT`] devices
/// on each. Per-track and per-device failures are reported inline.
pub fn diagnose<A: LiveAccessor + ?Sized>(accessor: &A) -> Result<LiveSetOverview, AccessorError> {
    let root = LomPath::root();
    let track_count = accessor.child_count(&root, ContainerKind::Tracks)?;

    let mut tracks = Vec::new();
    for index in 0..track_count.min(TRACK_LIMIT) {
        let path = root.child(ContainerKind::Tracks, index);
        match track_overview(accessor, &path, index) {
            Ok(track) => tracks.push(track),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(path = %path, error = %e, "could not inspect track");
                tracks.push(TrackOverview {
                    index,
                    name: format!("Track {}", index),
                    device_count: 0,
                    devices: Vec::new(),
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(LiveSetOverview {
        track_count,
        tracks,
    })
}

fn track_overview<A: LiveAccessor + ?Sized>(
    accessor: &A,
    path: &LomPath,
    index: usize,
) -> Result<TrackOverview, AccessorError> {
    let name = name_or_fallback(accessor.get_property(path, "name")?);
    let device_count = accessor.child_count(path, ContainerKind::Devices)?;

    let mut devices = Vec::new();
    for device_index in 0..device_count.min(DEVICE_LIMIT) {
        let device_path = path.child(ContainerKind::Devices, device_index);
        let overview = accessor
            .get_property(&device_path, "name")
            .and_then(|name| {
                let capabilities = accessor.capabilities(&device_path)?;
                Ok((name_or_fallback(name), capabilities.is_rack()))
            });

        devices.push(match overview {
            Ok((name, is_rack)) => DeviceOverview {
                index: device_index,
                name,
                is_rack,
                error: None,
            },
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => DeviceOverview {
                index: device_index,
                name: format!("Device {}", device_index),
                is_rack: false,
                error: Some(e.to_string()),
            },
        });
    }

    Ok(TrackOverview {
        index,
        name,
        device_count,
        devices,
        error: None,
    })
}
