use super::*;
use serde_json::json;

use crate::data::change_set::ChangeSet;
use crate::foundation::core::{NodeFrame, NodeKey};
use crate::foundation::value::Value;
use crate::render::engine::Layer;
use crate::render::recording::RecordingSurface;
use crate::render::surface::{GEOMETRY_ATTR, GraphicsSurface};

fn series_layer() -> Layer<LineMark> {
    let layer = Layer::new(LineMark);
    layer.map("series-count").from_field("series.length").unwrap();
    layer.map("point-count").from_field("series[].length").unwrap();
    layer.map("x").from_fn(|ctx| {
        let n = ctx.data["series"][ctx.index(0).unwrap_or(0)]
            .as_array()
            .map_or(1, |a| a.len());
        let p = ctx.index(1).unwrap_or(0);
        Ok(Value::Number(p as f64 / (n.max(2) - 1) as f64))
    });
    layer.map("y").from_field("series[][]").unwrap();
    layer.map("stroke").as_value("black");
    layer
}

#[test]
fn each_series_becomes_one_polyline() {
    let mut layer = series_layer();
    let mut surface = RecordingSurface::new();
    layer
        .render(
            ChangeSet::new().update(
                "chart",
                json!({"series": [[0.0, 1.0, 0.5], [1.0, 0.0]]}),
                NodeFrame::new(0.0, 0.0, 10.0, 10.0),
            ),
            &mut surface,
        )
        .unwrap();

    let handles: Vec<_> = layer
        .slot_handles(&NodeKey::from("chart"))
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(handles.len(), 2);
    assert_eq!(surface.kind(handles[0]), Some(PrimitiveKind::Line));

    let mut expected = BezPath::new();
    expected.move_to((0.0, 0.0));
    expected.line_to((5.0, 10.0));
    expected.line_to((10.0, 5.0));
    assert_eq!(
        surface.get_attribute(handles[0], GEOMETRY_ATTR),
        Some(Value::Text(expected.to_svg()))
    );
    assert_eq!(surface.get_attribute(handles[1], "stroke"), Some(Value::from("black")));
}

#[test]
fn short_series_draw_nothing() {
    let mut layer = series_layer();
    let mut surface = RecordingSurface::new();
    layer
        .render(
            ChangeSet::new().update(
                "chart",
                json!({"series": [[0.5], [0.0, 1.0]]}),
                NodeFrame::new(0.0, 0.0, 10.0, 10.0),
            ),
            &mut surface,
        )
        .unwrap();
    let handles = layer.slot_handles(&NodeKey::from("chart"));
    assert!(handles[0].is_none());
    assert!(handles[1].is_some());
    assert_eq!(surface.live_count(), 1);
}

#[test]
fn oversized_point_counts_are_rejected() {
    let mut layer = series_layer();
    layer.map("point-count").as_value(1e15);
    let mut surface = RecordingSurface::new();
    let stats = layer
        .render(
            ChangeSet::new().update(
                "chart",
                json!({"series": [[0.0, 1.0]]}),
                NodeFrame::new(0.0, 0.0, 10.0, 10.0),
            ),
            &mut surface,
        )
        .unwrap();
    assert_eq!(stats.skipped, 1);
    assert_eq!(surface.live_count(), 0);
}
