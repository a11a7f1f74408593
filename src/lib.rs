//! Aperture turns data into visual attributes and renders them incrementally.
//!
//! A chart is a stack of layers. Each layer owns a [`MappingSet`]: one [`Mapping`] per
//! visual property (`x`, `fill`, `bar-count`, ...), each binding an accessor, an optional
//! [`MapKey`] transformation over a [`Range`], and a chain of [`Filter`]s.
//!
//! # Pipeline overview
//!
//! 1. **Scan**: data widens [`Range`] domains (`expand`).
//! 2. **Diff data**: [`KeyedData`] turns successive snapshots into a [`ChangeSet`].
//! 3. **Evaluate**: per node and slot, mappings produce [`Value`]s; a [`Mark`] turns them into
//!    geometry plus cheap attributes ([`SlotSpec`]).
//! 4. **Diff primitives**: [`Layer`] compares each slot against its cache and issues the
//!    minimal create/update/remove calls on a [`GraphicsSurface`].
//!
//! Evaluation errors are contained per node or slot and logged; configuration and surface
//! errors fail the call. Everything is single threaded: shared handles use `Rc<RefCell<_>>`.
#![forbid(unsafe_code)]

mod animation;
mod chart;
mod data;
mod foundation;
mod layers;
mod mapping;
mod render;
mod scale;

pub use animation::ease::Ease;
pub use animation::transition::{CompletionFn, Transition, TransitionSpec};
pub use chart::model::{ChartDef, LayerDef, MappingDef, MarkDef, RangeDef};
pub use chart::runtime::{Chart, ChartLayer, LayerStats};
pub use data::change_set::{ChangeSet, NodeUpdate};
pub use data::keyed::{KeyedData, Snapshot};
pub use foundation::color::{Blend, Color};
pub use foundation::core::{
    Attrs, BezPath, NodeFrame, NodeKey, Point, PrimitiveHandle, Rect, Shape, Vec2,
};
pub use foundation::error::{ApertureError, ApertureResult};
pub use foundation::value::Value;
pub use layers::bar::{BAR_STYLE_ATTRS, BarMark, Orientation};
pub use layers::line::{LINE_STYLE_ATTRS, LineMark};
pub use mapping::accessor::{Accessor, AccessorFn, EvalContext, Source};
pub use mapping::filter::Filter;
pub use mapping::path::{FieldPath, PathStep};
pub use mapping::property::Mapping;
pub use mapping::set::MappingSet;
pub use render::cull::CullPolicy;
pub use render::engine::{
    IndexPath, Layer, MAX_COUNT, Mark, RenderStats, SlotContext, SlotSpec, count_or, number_or,
};
pub use render::recording::RecordingSurface;
pub use render::retained::RetainedSurface;
pub use render::surface::{GEOMETRY_ATTR, GraphicsSurface, PrimitiveKind, SurfaceOp};
pub use scale::map_key::{MapKey, OrdinalMapKey, ScalarMapKey, Tween, TweenFn};
pub use scale::range::{
    Band, DEFAULT_SCALAR_BOUNDS, OrdinalRange, Range, RangeKind, RangePosition, ScalarRange,
    ScalarView,
};
