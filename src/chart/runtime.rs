use std::collections::BTreeMap;

use crate::animation::transition::Transition;
use crate::chart::model::{ChartDef, MappingDef, MarkDef};
use crate::data::change_set::ChangeSet;
use crate::data::keyed::KeyedData;
use crate::foundation::core::{NodeFrame, Rect};
use crate::foundation::error::{ApertureError, ApertureResult};
use crate::foundation::value::Value;
use crate::layers::bar::BarMark;
use crate::layers::line::LineMark;
use crate::mapping::path::FieldPath;
use crate::mapping::property::Mapping;
use crate::mapping::set::MappingSet;
use crate::render::cull::CullPolicy;
use crate::render::engine::{Layer, RenderStats};
use crate::render::surface::GraphicsSurface;
use crate::scale::range::{Range, RangeKind, ScalarRange};

/// A layer of any supported mark type.
#[derive(Debug)]
pub enum ChartLayer {
    Bar(Layer<BarMark>),
    Line(Layer<LineMark>),
}

impl ChartLayer {
    pub fn new(mark: MarkDef, parent: &MappingSet) -> Self {
        match mark {
            MarkDef::Bar { orientation } => {
                Self::Bar(Layer::with_parent(BarMark::new(orientation), parent))
            }
            MarkDef::Line => Self::Line(Layer::with_parent(LineMark, parent)),
        }
    }

    pub fn mappings(&self) -> &MappingSet {
        match self {
            Self::Bar(l) => l.mappings(),
            Self::Line(l) => l.mappings(),
        }
    }

    pub fn set_cull_policy(&mut self, policy: CullPolicy) {
        match self {
            Self::Bar(l) => l.set_cull_policy(policy),
            Self::Line(l) => l.set_cull_policy(policy),
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            Self::Bar(l) => l.node_count(),
            Self::Line(l) => l.node_count(),
        }
    }

    pub fn render(
        &mut self,
        changes: ChangeSet,
        surface: &mut dyn GraphicsSurface,
    ) -> ApertureResult<RenderStats> {
        match self {
            Self::Bar(l) => l.render(changes, surface),
            Self::Line(l) => l.render(changes, surface),
        }
    }
}

/// Per-layer outcome of [`Chart::render`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerStats {
    pub id: String,
    pub stats: RenderStats,
}

#[derive(Debug)]
struct ChartRange {
    range: Range,
    expand_from: Option<FieldPath>,
    domain: Vec<Value>,
}

impl ChartRange {
    fn snapshot(&self) -> Vec<Value> {
        match &self.range {
            Range::Scalar(r) if r.is_empty() => Vec::new(),
            Range::Scalar(r) => {
                let (lo, hi) = r.bounds();
                vec![Value::Number(lo), Value::Number(hi)]
            }
            Range::Ordinal(r) => r.values(),
        }
    }

    fn reseed(&self) -> ApertureResult<()> {
        self.range.reset();
        for v in &self.domain {
            self.range.expand(v)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct ChartLayerState {
    id: String,
    data_key: String,
    frame: NodeFrame,
    layer: ChartLayer,
    keyed: KeyedData,
    /// Set when a domain moved; cleared once a pass re-renders every node.
    redraw: bool,
}

/// A chart built from a [`ChartDef`], rendering successive data snapshots.
#[derive(Debug)]
pub struct Chart {
    def: ChartDef,
    ranges: BTreeMap<String, ChartRange>,
    defaults: MappingSet,
    layers: Vec<ChartLayerState>,
    transition: Option<Transition>,
}

impl Chart {
    pub fn new(def: ChartDef) -> ApertureResult<Self> {
        def.validate()?;

        let mut ranges = BTreeMap::new();
        for (name, rd) in &def.ranges {
            let range = match (rd.kind, rd.view) {
                (RangeKind::Scalar, Some(view)) => {
                    Range::Scalar(ScalarRange::new().with_view(view)?)
                }
                (kind, _) => Range::new(kind),
            };
            if let Some(label) = &rd.label {
                range.set_label(label.clone());
            }
            let entry = ChartRange {
                range,
                expand_from: rd.expand_from.as_deref().map(FieldPath::parse).transpose()?,
                domain: rd.domain.iter().map(Value::from_json).collect(),
            };
            entry.reseed()?;
            ranges.insert(name.clone(), entry);
        }

        let defaults = MappingSet::new();
        for (prop, md) in &def.defaults {
            bind(&defaults.map(prop), md, &ranges)?;
        }

        let cull = def.viewport.map(CullPolicy::new).unwrap_or_default();
        let mut layers = Vec::with_capacity(def.layers.len());
        for ld in &def.layers {
            let mut layer = ChartLayer::new(ld.mark, &defaults);
            layer.set_cull_policy(cull);
            for (prop, md) in &ld.mappings {
                bind(&layer.mappings().map(prop), md, &ranges).map_err(|e| {
                    ApertureError::configuration(format!("layer '{}' mapping '{prop}': {e}", ld.id))
                })?;
            }
            layers.push(ChartLayerState {
                id: ld.id.clone(),
                data_key: ld.data_key().to_owned(),
                frame: ld.frame.unwrap_or_else(|| def.frame()),
                layer,
                keyed: KeyedData::new(&ld.key)?,
                redraw: false,
            });
        }

        let transition = def.transition.map(Transition::from);
        Ok(Self {
            def,
            ranges,
            defaults,
            layers,
            transition,
        })
    }

    pub fn def(&self) -> &ChartDef {
        &self.def
    }

    pub fn range(&self, name: &str) -> Option<&Range> {
        self.ranges.get(name).map(|r| &r.range)
    }

    /// Mappings shared by every layer.
    pub fn defaults(&self) -> &MappingSet {
        &self.defaults
    }

    pub fn layer(&self, id: &str) -> Option<&ChartLayer> {
        self.layers.iter().find(|l| l.id == id).map(|l| &l.layer)
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    /// Replace the transition attached to following passes.
    pub fn set_transition(&mut self, transition: Option<Transition>) {
        self.transition = transition;
    }

    pub fn set_viewport(&mut self, viewport: Option<Rect>) {
        let cull = viewport.map(CullPolicy::new).unwrap_or_default();
        for l in &mut self.layers {
            l.layer.set_cull_policy(cull);
        }
    }

    /// Render one data snapshot.
    ///
    /// `data` is either an array shared by every layer or an object keyed by layer data set
    /// name. Ranges with `expand_from` are recomputed from the snapshot; when any domain
    /// moves, every node is re-rendered since its mapped geometry may have changed. A layer's
    /// data snapshot is only committed once its pass succeeds, so a failed render is redone
    /// in full by the next call.
    #[tracing::instrument(skip(self, data, surface), fields(layers = self.layers.len()))]
    pub fn render(
        &mut self,
        data: &serde_json::Value,
        surface: &mut dyn GraphicsSurface,
    ) -> ApertureResult<Vec<LayerStats>> {
        let mut items = Vec::with_capacity(self.layers.len());
        for l in &self.layers {
            items.push(layer_items(data, &l.data_key)?);
        }

        if self.expand_ranges(&items)? {
            for l in &mut self.layers {
                l.redraw = true;
            }
        }

        let mut out = Vec::with_capacity(self.layers.len());
        for (l, items) in self.layers.iter_mut().zip(&items) {
            let (mut changes, snapshot) = l.keyed.diff(items, l.frame)?;
            if l.redraw {
                changes.updates.clear();
                for key in snapshot.keys() {
                    if let Some(item) = snapshot.get(key) {
                        changes.push_update(key.clone(), item.clone(), l.frame);
                    }
                }
            }
            changes.transition = self.transition.clone();
            let stats = l.layer.render(changes, surface)?;
            l.keyed.commit(snapshot);
            l.redraw = false;
            out.push(LayerStats {
                id: l.id.clone(),
                stats,
            });
        }
        Ok(out)
    }

    /// Recompute data-driven domains; returns whether any domain changed.
    fn expand_ranges(&self, items: &[Vec<serde_json::Value>]) -> ApertureResult<bool> {
        let mut moved = false;
        for (name, r) in &self.ranges {
            let Some(path) = &r.expand_from else {
                continue;
            };
            let before = r.snapshot();
            r.reseed()?;
            for item in items.iter().flatten() {
                let value = match path.resolve(item, &[]) {
                    Ok(v) => v,
                    Err(e) if e.is_evaluation() => {
                        tracing::warn!(range = name.as_str(), error = %e, "skipping item while expanding range");
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                let values = match &value {
                    Value::Json(serde_json::Value::Array(vs)) => {
                        vs.iter().map(Value::from_json).collect()
                    }
                    _ => vec![value],
                };
                for v in &values {
                    if let Err(e) = r.range.expand(v) {
                        if !e.is_evaluation() {
                            return Err(e);
                        }
                        tracing::warn!(range = name.as_str(), error = %e, "skipping value while expanding range");
                    }
                }
            }
            if r.snapshot() != before {
                tracing::debug!(range = name.as_str(), "domain changed");
                moved = true;
            }
        }
        Ok(moved)
    }
}

fn layer_items(data: &serde_json::Value, key: &str) -> ApertureResult<Vec<serde_json::Value>> {
    let set = match data {
        serde_json::Value::Array(_) => data,
        serde_json::Value::Object(map) => match map.get(key) {
            Some(v) => v,
            None => return Ok(Vec::new()),
        },
        _ => {
            return Err(ApertureError::configuration(
                "chart data must be an array or an object of arrays",
            ));
        }
    };
    match set {
        serde_json::Value::Array(items) => Ok(items.clone()),
        _ => Err(ApertureError::configuration(format!(
            "data set '{key}' must be an array"
        ))),
    }
}

fn bind(mapping: &Mapping, md: &MappingDef, ranges: &BTreeMap<String, ChartRange>) -> ApertureResult<()> {
    if let Some(field) = &md.field {
        mapping.from_field(field)?;
    } else if let Some(value) = &md.value {
        mapping.as_value(Value::from_json(value));
    }

    if let (Some(name), Some(to)) = (&md.range, &md.to) {
        let range = ranges
            .get(name)
            .ok_or_else(|| ApertureError::configuration(format!("unknown range '{name}'")))?;
        let mut key = range
            .range
            .mapped_to(to.iter().map(Value::from_json).collect())?;
        if let Some(tween) = &md.tween {
            key.set_type(tween)?;
        }
        mapping.using(Some(key));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/chart/runtime.rs"]
mod tests;
