use crate::foundation::core::{BezPath, Point};
use crate::foundation::error::ApertureResult;
use crate::mapping::set::MappingSet;
use crate::render::engine::{Mark, SlotContext, SlotSpec, count_or, number_or};
use crate::render::surface::PrimitiveKind;

pub const LINE_STYLE_ATTRS: [&str; 4] = ["stroke", "stroke-width", "opacity", "line-style"];

/// Polylines, one slot per series (`series-count`), `point-count` points each.
///
/// `x` and `y` are evaluated with indices `[series, point]` and normalized to the node
/// frame. A series with fewer than two points draws nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineMark;

impl Mark for LineMark {
    fn prefix(&self) -> &str {
        "series"
    }

    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Line
    }

    fn build(
        &self,
        slot: &SlotContext<'_>,
        mappings: &MappingSet,
    ) -> ApertureResult<Option<SlotSpec>> {
        let points = count_or("point-count", slot.value(mappings, "point-count")?, 0)?;
        if points < 2 {
            return Ok(None);
        }

        let frame = slot.frame.rect();
        let mut path = BezPath::new();
        for p in 0..points {
            let x = number_or("x", slot.value_at(mappings, "x", &[p])?, 0.0)?;
            let y = number_or("y", slot.value_at(mappings, "y", &[p])?, 0.0)?;
            let at = Point::new(frame.x0 + x * frame.width(), frame.y0 + y * frame.height());
            if p == 0 {
                path.move_to(at);
            } else {
                path.line_to(at);
            }
        }

        let stroke_width = slot.number(mappings, "stroke-width", 1.0)?;
        let mut spec = SlotSpec::new(path).with_extent(stroke_width.abs());
        for name in LINE_STYLE_ATTRS {
            spec = spec.attr(name, slot.value(mappings, name)?);
        }
        Ok(Some(spec))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/line.rs"]
mod tests;
