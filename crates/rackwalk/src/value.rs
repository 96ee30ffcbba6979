use serde::{Deserialize, Serialize};
use std::fmt;

/// A property value as reported by the live object model.
///
/// The accessor layer wraps most scalars in one-element lists, so values
/// coming straight off the wire usually need [`crate::normalize`] before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum LomValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<LomValue>),
}

impl LomValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Strip single-element list wrappers until a non-list (or a list of
    /// any other length) remains.
    pub fn unwrap_single(self) -> Self {
        let mut value = self;
        loop {
            match value {
                Self::List(mut items) if items.len() == 1 => {
                    value = items.remove(0);
                }
                other => return other,
            }
        }
    }

    /// Render as display text. `Null` and empty strings yield `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Text(s) if s.is_empty() => None,
            Self::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for LomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            // `{:e}` keeps tiny denormals readable ("5e-324") instead of
            // printing hundreds of zeros.
            Self::Float(x) if *x != 0.0 && x.abs() < 1e-7 => write!(f, "{:e}", x),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{}", s),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for LomValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for LomValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for LomValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<i64> for LomValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for LomValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}
