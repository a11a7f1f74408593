use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context as _;

use crate::animation::transition::TransitionSpec;
use crate::foundation::core::{NodeFrame, Rect};
use crate::foundation::error::{ApertureError, ApertureResult};
use crate::layers::bar::Orientation;
use crate::mapping::path::FieldPath;
use crate::scale::map_key::Tween;
use crate::scale::range::{RangeKind, ScalarRange, ScalarView};

/// Declarative chart: named ranges, layers and their mappings.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartDef {
    pub width: f64,
    pub height: f64,
    /// Cull window shared by every layer. `None` disables culling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Rect>,
    #[serde(default)]
    pub ranges: BTreeMap<String, RangeDef>,
    /// Mappings every layer inherits unless it maps the property itself.
    #[serde(default)]
    pub defaults: BTreeMap<String, MappingDef>,
    pub layers: Vec<LayerDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionSpec>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeDef {
    pub kind: RangeKind,
    /// Field path every data item widens the range with on each render.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand_from: Option<String>,
    /// Values the domain always contains.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<ScalarView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerDef {
    pub id: String,
    pub mark: MarkDef,
    /// Field path of each item's identity key.
    pub key: String,
    /// Data set name when the data document is an object; defaults to `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Node frame; defaults to the whole chart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<NodeFrame>,
    #[serde(default)]
    pub mappings: BTreeMap<String, MappingDef>,
}

impl LayerDef {
    pub fn data_key(&self) -> &str {
        self.data.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MarkDef {
    Bar {
        #[serde(default)]
        orientation: Orientation,
    },
    Line,
}

/// One property binding: a field or a constant, optionally through a range.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tween: Option<String>,
}

impl ChartDef {
    /// Parse and validate.
    pub fn from_json_str(s: &str) -> ApertureResult<Self> {
        let def: Self = serde_json::from_str(s)
            .map_err(|e| ApertureError::serde(format!("parse chart JSON: {e}")))?;
        def.validate()?;
        Ok(def)
    }

    pub fn from_path(path: &Path) -> ApertureResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read chart '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> ApertureResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ApertureError::serde(e.to_string()))
    }

    pub fn frame(&self) -> NodeFrame {
        NodeFrame::new(0.0, 0.0, self.width, self.height)
    }

    pub fn validate(&self) -> ApertureResult<()> {
        let dims_ok = self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0;
        if !dims_ok {
            return Err(ApertureError::configuration(
                "chart width/height must be finite and > 0",
            ));
        }
        if let Some(vp) = self.viewport {
            NodeFrame::from(vp)
                .validate()
                .map_err(|e| ApertureError::configuration(format!("viewport: {e}")))?;
        }

        for (name, range) in &self.ranges {
            range
                .validate()
                .map_err(|e| ApertureError::configuration(format!("range '{name}': {e}")))?;
        }

        for (prop, mapping) in &self.defaults {
            self.validate_mapping(mapping)
                .map_err(|e| ApertureError::configuration(format!("default '{prop}': {e}")))?;
        }

        if self.layers.is_empty() {
            return Err(ApertureError::configuration("chart must have at least one layer"));
        }
        let mut ids = BTreeSet::new();
        for layer in &self.layers {
            if layer.id.trim().is_empty() {
                return Err(ApertureError::configuration("layer id must be non-empty"));
            }
            if !ids.insert(layer.id.as_str()) {
                return Err(ApertureError::configuration(format!(
                    "duplicate layer id '{}'",
                    layer.id
                )));
            }
            FieldPath::parse(&layer.key).map_err(|e| {
                ApertureError::configuration(format!("layer '{}' key: {e}", layer.id))
            })?;
            if let Some(frame) = layer.frame {
                frame.validate().map_err(|e| {
                    ApertureError::configuration(format!("layer '{}' frame: {e}", layer.id))
                })?;
            }
            for (prop, mapping) in &layer.mappings {
                self.validate_mapping(mapping).map_err(|e| {
                    ApertureError::configuration(format!(
                        "layer '{}' mapping '{prop}': {e}",
                        layer.id
                    ))
                })?;
            }
        }
        Ok(())
    }

    fn validate_mapping(&self, m: &MappingDef) -> ApertureResult<()> {
        match (&m.field, &m.value) {
            (Some(_), Some(_)) => {
                return Err(ApertureError::configuration(
                    "set exactly one of 'field' or 'value', not both",
                ));
            }
            (None, None) => {
                return Err(ApertureError::configuration(
                    "missing accessor: set 'field' or 'value'",
                ));
            }
            (Some(path), None) => {
                FieldPath::parse(path)?;
            }
            (None, Some(_)) => {}
        }

        match (&m.range, &m.to) {
            (Some(name), Some(to)) => {
                let range = self.ranges.get(name).ok_or_else(|| {
                    ApertureError::configuration(format!("unknown range '{name}'"))
                })?;
                let min_len = match range.kind {
                    RangeKind::Scalar => 2,
                    RangeKind::Ordinal => 1,
                };
                if to.len() < min_len {
                    return Err(ApertureError::configuration(format!(
                        "'to' needs at least {min_len} values for range '{name}'"
                    )));
                }
            }
            (None, None) => {}
            _ => {
                return Err(ApertureError::configuration(
                    "'range' and 'to' must be set together",
                ));
            }
        }

        if let Some(tween) = &m.tween {
            if m.range.is_none() {
                return Err(ApertureError::configuration("'tween' requires a 'range'"));
            }
            Tween::from_name(tween)?;
        }
        Ok(())
    }
}

impl RangeDef {
    pub fn validate(&self) -> ApertureResult<()> {
        if let Some(path) = &self.expand_from {
            FieldPath::parse(path)?;
        }
        if let Some(view) = self.view {
            if self.kind != RangeKind::Scalar {
                return Err(ApertureError::configuration(
                    "only scalar ranges take a view",
                ));
            }
            ScalarRange::new().with_view(view)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/chart/model.rs"]
mod tests;
