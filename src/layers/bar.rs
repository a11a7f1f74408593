use crate::foundation::core::{Rect, Shape};
use crate::foundation::error::{ApertureError, ApertureResult};
use crate::foundation::value::Value;
use crate::mapping::set::MappingSet;
use crate::render::engine::{Mark, SlotContext, SlotSpec};
use crate::render::surface::PrimitiveKind;

/// Attributes copied verbatim onto each bar.
pub const BAR_STYLE_ATTRS: [&str; 4] = ["fill", "stroke", "stroke-width", "opacity"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// Bars grow along y.
    #[default]
    Vertical,
    Horizontal,
}

impl Orientation {
    pub fn from_value(v: &Value) -> ApertureResult<Self> {
        match v.as_str() {
            Some("vertical") => Ok(Self::Vertical),
            Some("horizontal") => Ok(Self::Horizontal),
            _ => Err(ApertureError::evaluation(format!(
                "orientation must be 'vertical' or 'horizontal', got '{v}'"
            ))),
        }
    }
}

/// Rectangular bars, `bar-count` per node.
///
/// `x` and `y` are offsets normalized to the node frame. `length` is normalized to the frame
/// extent along the bar's orientation; `width` is in surface units.
#[derive(Clone, Debug, Default)]
pub struct BarMark {
    orientation: Orientation,
}

impl BarMark {
    pub fn new(orientation: Orientation) -> Self {
        Self { orientation }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }
}

impl Mark for BarMark {
    fn prefix(&self) -> &str {
        "bar"
    }

    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Shape
    }

    fn build(
        &self,
        slot: &SlotContext<'_>,
        mappings: &MappingSet,
    ) -> ApertureResult<Option<SlotSpec>> {
        let frame = slot.frame.rect();
        let x = frame.x0 + slot.number(mappings, "x", 0.0)? * frame.width();
        let y = frame.y0 + slot.number(mappings, "y", 0.0)? * frame.height();
        let width = slot.number(mappings, "width", 1.0)?;
        let length = slot.number(mappings, "length", 0.0)?;
        let orientation = match slot.value(mappings, "orientation")? {
            Some(v) if !v.is_nullish() => Orientation::from_value(&v)?,
            _ => self.orientation,
        };

        let rect = match orientation {
            Orientation::Vertical => Rect::new(x, y, x + width, y + length * frame.height()),
            Orientation::Horizontal => Rect::new(x, y, x + length * frame.width(), y + width),
        }
        .abs();

        let mut spec = SlotSpec::new(rect.to_path(0.1)).with_extent(width.abs());
        for name in BAR_STYLE_ATTRS {
            spec = spec.attr(name, slot.value(mappings, name)?);
        }
        Ok(Some(spec))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/bar.rs"]
mod tests;
