use std::collections::BTreeMap;

use crate::foundation::error::{ApertureError, ApertureResult};
use crate::foundation::value::Value;

pub use kurbo::{BezPath, Point, Rect, Shape, Vec2};

/// Attribute set applied to a graphics primitive, sorted by name.
pub type Attrs = BTreeMap<String, Value>;

/// Stable identity of a data item across render passes.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeKey(pub String);

impl NodeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Read a key from a JSON string or integer.
    pub fn from_json(v: &serde_json::Value) -> ApertureResult<Self> {
        match v {
            serde_json::Value::String(s) => Ok(Self(s.clone())),
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Self(n.to_string())),
            other => Err(ApertureError::evaluation(format!(
                "identity key must be a string or integer, got {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeKey {
    fn from(v: &str) -> Self {
        Self(v.to_owned())
    }
}

/// Opaque handle to a primitive owned by a graphics surface.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct PrimitiveHandle(pub u64);

/// Position/size context a layer draws a node into.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeFrame {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl NodeFrame {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn rect(self) -> Rect {
        Rect::new(self.x0, self.y0, self.x1, self.y1)
    }

    pub fn validate(self) -> ApertureResult<()> {
        let finite = [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(ApertureError::configuration("frame bounds must be finite"));
        }
        if self.x1 < self.x0 || self.y1 < self.y0 {
            return Err(ApertureError::configuration(
                "frame must satisfy x0 <= x1 and y0 <= y1",
            ));
        }
        Ok(())
    }
}

impl Default for NodeFrame {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

impl From<Rect> for NodeFrame {
    fn from(r: Rect) -> Self {
        Self::new(r.x0, r.y0, r.x1, r.y1)
    }
}
