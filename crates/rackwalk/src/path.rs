//! Live object paths: a root token followed by (container, index) pairs.
//!
//! `live_set tracks 1 devices 0 chains 2 devices 3`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root token every path starts from.
pub const ROOT: &str = "live_set";

/// Named child containers exposed by live objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Tracks,
    Devices,
    Chains,
    Parameters,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tracks => "tracks",
            Self::Devices => "devices",
            Self::Chains => "chains",
            Self::Parameters => "parameters",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContainerKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tracks" => Ok(Self::Tracks),
            "devices" => Ok(Self::Devices),
            "chains" => Ok(Self::Chains),
            "parameters" => Ok(Self::Parameters),
            _ => Err(format!("Unknown container kind: {}", s)),
        }
    }
}

/// One `(container, index)` step below the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub kind: ContainerKind,
    pub index: usize,
}

/// Address of a live object relative to [`ROOT`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LomPath {
    segments: Vec<Segment>,
}

impl LomPath {
    /// The root path (`live_set`).
    pub fn root() -> Self {
        Self::default()
    }

    /// `live_set tracks <track> devices <device>`
    pub fn track_device(track: usize, device: usize) -> Self {
        Self::root()
            .child(ContainerKind::Tracks, track)
            .child(ContainerKind::Devices, device)
    }

    pub fn child(&self, kind: ContainerKind, index: usize) -> Self {
        let mut path = self.clone();
        path.push(kind, index);
        path
    }

    pub fn push(&mut self, kind: ContainerKind, index: usize) {
        self.segments.push(Segment { kind, index });
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }
}

impl fmt::Display for LomPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", ROOT)?;
        for segment in &self.segments {
            write!(f, " {} {}", segment.kind, segment.index)?;
        }
        Ok(())
    }
}

impl FromStr for LomPath {
    type Err = String;

    /// Parses a space-delimited path. Quotes are ignored, since the live
    /// object model sometimes hands paths back quoted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s.replace('"', "");
        let mut tokens = cleaned.split_whitespace();

        match tokens.next() {
            Some(ROOT) => {}
            Some(other) => return Err(format!("Path must start with '{}', got '{}'", ROOT, other)),
            None => return Err("Empty path".to_string()),
        }

        let mut path = LomPath::root();
        while let Some(kind) = tokens.next() {
            let kind: ContainerKind = kind.parse()?;
            let index = tokens
                .next()
                .ok_or_else(|| format!("Missing index after '{}'", kind))?
                .parse::<usize>()
                .map_err(|e| format!("Invalid index after '{}': {}", kind, e))?;
            path.push(kind, index);
        }

        Ok(path)
    }
}

impl Serialize for LomPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LomPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
