use std::collections::BTreeMap;

use smallvec::{SmallVec, smallvec};

use crate::animation::transition::Transition;
use crate::data::change_set::{ChangeSet, NodeUpdate};
use crate::foundation::core::{Attrs, BezPath, NodeFrame, NodeKey, PrimitiveHandle, Rect, Shape};
use crate::foundation::error::{ApertureError, ApertureResult};
use crate::foundation::value::Value;
use crate::mapping::accessor::EvalContext;
use crate::mapping::property::Mapping;
use crate::mapping::set::MappingSet;
use crate::render::cull::CullPolicy;
use crate::render::surface::{GEOMETRY_ATTR, GraphicsSurface, PrimitiveKind};

/// Index arguments for one slot evaluation: `[slot]`, `[series, point]`, ...
pub type IndexPath = SmallVec<[usize; 4]>;

/// What a mark draws for one slot.
#[derive(Clone, Debug, Default)]
pub struct SlotSpec {
    /// Expensive attribute; compared by its SVG path snapshot.
    pub geometry: BezPath,
    /// Cheap attributes (fill, stroke, opacity, ...).
    pub attrs: Attrs,
    /// Characteristic element size: bar width, stroke width.
    pub extent: f64,
}

impl SlotSpec {
    pub fn new(geometry: BezPath) -> Self {
        Self {
            geometry,
            attrs: Attrs::new(),
            extent: 0.0,
        }
    }

    pub fn with_extent(mut self, extent: f64) -> Self {
        self.extent = extent;
        self
    }

    /// Add an attribute unless it is `Undefined`.
    pub fn attr(mut self, name: &str, value: Option<Value>) -> Self {
        if let Some(v) = value.filter(|v| !v.is_undefined()) {
            self.attrs.insert(name.to_owned(), v);
        }
        self
    }

    pub fn bounds(&self) -> Rect {
        self.geometry.bounding_box()
    }
}

/// Everything a mark needs to build one slot.
#[derive(Clone, Debug)]
pub struct SlotContext<'a> {
    pub key: &'a NodeKey,
    pub data: &'a serde_json::Value,
    pub frame: NodeFrame,
    pub indices: IndexPath,
}

impl<'a> SlotContext<'a> {
    pub fn slot(&self) -> usize {
        self.indices.first().copied().unwrap_or(0)
    }

    pub fn eval(&self) -> EvalContext<'_> {
        EvalContext::new(self.data, &self.indices)
    }

    pub fn value(&self, mappings: &MappingSet, name: &str) -> ApertureResult<Option<Value>> {
        mappings.evaluate(name, &self.eval())
    }

    /// Evaluate with extra trailing indices, e.g. a point within a series.
    pub fn value_at(
        &self,
        mappings: &MappingSet,
        name: &str,
        extra: &[usize],
    ) -> ApertureResult<Option<Value>> {
        let mut indices = self.indices.clone();
        indices.extend_from_slice(extra);
        mappings.evaluate(name, &EvalContext::new(self.data, &indices))
    }

    pub fn number(&self, mappings: &MappingSet, name: &str, default: f64) -> ApertureResult<f64> {
        number_or(name, self.value(mappings, name)?, default)
    }
}

/// Numeric reading of a mapped value; unmapped or undefined falls back to `default`.
pub fn number_or(name: &str, value: Option<Value>, default: f64) -> ApertureResult<f64> {
    match value {
        None | Some(Value::Undefined) | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) if n.is_finite() => Ok(n),
        Some(other) => Err(ApertureError::evaluation(format!(
            "mapping '{name}' produced non-numeric value '{other}'"
        ))),
    }
}

/// Largest slot or point count a mapping may request for one node.
pub const MAX_COUNT: usize = 1 << 20;

/// Count reading of a mapped value: floored, negatives as zero, at most [`MAX_COUNT`].
pub fn count_or(name: &str, value: Option<Value>, default: usize) -> ApertureResult<usize> {
    let n = number_or(name, value, default as f64)?.max(0.0).floor();
    if n > MAX_COUNT as f64 {
        return Err(ApertureError::evaluation(format!(
            "mapping '{name}' asks for {n} elements, more than the limit of {MAX_COUNT}"
        )));
    }
    Ok(n as usize)
}

/// One layer type: how a slot's mapped values become a primitive.
///
/// The engine evaluates `<prefix>-count` (default 1) per node and `<prefix>-visible`
/// (default true) per slot before calling [`Mark::build`].
pub trait Mark {
    fn prefix(&self) -> &str;

    fn kind(&self) -> PrimitiveKind;

    /// `Ok(None)` means nothing to draw for this slot.
    fn build(&self, slot: &SlotContext<'_>, mappings: &MappingSet)
    -> ApertureResult<Option<SlotSpec>>;

    /// Element size the cull buffer is measured in.
    fn cull_buffer(&self, spec: &SlotSpec) -> f64 {
        spec.extent
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub created: u64,
    /// Slots that received a `set_attributes` call.
    pub updated: u64,
    /// Slots whose geometry and attributes matched the cache.
    pub unchanged: u64,
    /// Primitives removed for any reason, culling included.
    pub removed: u64,
    pub culled: u64,
    /// Nodes or slots skipped after an evaluation error.
    pub skipped: u64,
}

impl RenderStats {
    pub fn merge(&mut self, other: RenderStats) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.removed += other.removed;
        self.culled += other.culled;
        self.skipped += other.skipped;
    }
}

#[derive(Clone, Debug)]
struct SlotCache {
    handle: PrimitiveHandle,
    geometry: String,
    attrs: Attrs,
    data_attached: bool,
}

#[derive(Clone, Debug)]
struct RenderNode {
    data: serde_json::Value,
    frame: NodeFrame,
    slots: Vec<Option<SlotCache>>,
}

impl RenderNode {
    fn handles(&self) -> Vec<PrimitiveHandle> {
        self.slots.iter().flatten().map(|c| c.handle).collect()
    }
}

/// A layer: one mark type, its mappings and the per-node primitive cache.
#[derive(Debug)]
pub struct Layer<M: Mark> {
    mark: M,
    mappings: MappingSet,
    cull: CullPolicy,
    nodes: BTreeMap<NodeKey, RenderNode>,
}

impl<M: Mark> Layer<M> {
    pub fn new(mark: M) -> Self {
        Self {
            mark,
            mappings: MappingSet::new(),
            cull: CullPolicy::default(),
            nodes: BTreeMap::new(),
        }
    }

    /// Layer whose mappings inherit from `parent` until overridden.
    pub fn with_parent(mark: M, parent: &MappingSet) -> Self {
        Self {
            mappings: parent.child(),
            ..Self::new(mark)
        }
    }

    pub fn mark(&self) -> &M {
        &self.mark
    }

    pub fn mappings(&self) -> &MappingSet {
        &self.mappings
    }

    pub fn map(&self, name: &str) -> Mapping {
        self.mappings.map(name)
    }

    pub fn set_viewport(&mut self, viewport: Option<Rect>) {
        self.cull.viewport = viewport;
    }

    pub fn set_cull_policy(&mut self, policy: CullPolicy) {
        self.cull = policy;
    }

    pub fn cull_policy(&self) -> CullPolicy {
        self.cull
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Cached primitive per slot of `key`; `None` marks an absent slot.
    pub fn slot_handles(&self, key: &NodeKey) -> Vec<Option<PrimitiveHandle>> {
        self.nodes
            .get(key)
            .map(|n| n.slots.iter().map(|s| s.as_ref().map(|c| c.handle)).collect())
            .unwrap_or_default()
    }

    /// Run one render pass.
    ///
    /// Removed nodes go first. Evaluation errors skip the offending node or slot and leave
    /// its cache untouched; any other error aborts the pass.
    #[tracing::instrument(
        skip(self, changes, surface),
        fields(
            mark = self.mark.prefix(),
            updates = changes.updates.len(),
            removed = changes.removed.len()
        )
    )]
    pub fn render(
        &mut self,
        changes: ChangeSet,
        surface: &mut dyn GraphicsSurface,
    ) -> ApertureResult<RenderStats> {
        changes.validate()?;
        let mut pass = Pass {
            mark: &self.mark,
            mappings: &self.mappings,
            cull: &self.cull,
            transition: changes.transition.as_ref(),
            surface,
            stats: RenderStats::default(),
        };

        for key in &changes.removed {
            if let Some(node) = self.nodes.get(key) {
                pass.remove_node(node)?;
                self.nodes.remove(key);
            }
        }

        for update in changes.updates {
            let NodeUpdate { key, data, frame } = update;
            frame.validate()?;
            let node = self.nodes.entry(key.clone()).or_insert_with(|| RenderNode {
                data: serde_json::Value::Null,
                frame,
                slots: Vec::new(),
            });
            let fresh_data = node.slots.is_empty() || node.data != data;
            node.data = data;
            node.frame = frame;
            pass.update_node(&key, node, fresh_data)?;
        }

        let stats = pass.stats;
        tracing::debug!(
            created = stats.created,
            updated = stats.updated,
            unchanged = stats.unchanged,
            removed = stats.removed,
            culled = stats.culled,
            skipped = stats.skipped,
            "layer pass complete"
        );
        Ok(stats)
    }

    /// Re-render every cached node, e.g. after ranges or mappings changed.
    pub fn redraw_all(
        &mut self,
        surface: &mut dyn GraphicsSurface,
        transition: Option<Transition>,
    ) -> ApertureResult<RenderStats> {
        let mut changes = ChangeSet::new();
        for (key, node) in &self.nodes {
            changes.push_update(key.clone(), node.data.clone(), node.frame);
        }
        changes.transition = transition;
        self.render(changes, surface)
    }

    /// Remove every primitive and forget every node; returns the number removed.
    pub fn clear(&mut self, surface: &mut dyn GraphicsSurface) -> ApertureResult<usize> {
        let handles: Vec<PrimitiveHandle> = self.nodes.values().flat_map(|n| n.handles()).collect();
        if !handles.is_empty() {
            surface.remove_all(&handles)?;
        }
        self.nodes.clear();
        Ok(handles.len())
    }
}

struct Pass<'a, M: Mark> {
    mark: &'a M,
    mappings: &'a MappingSet,
    cull: &'a CullPolicy,
    transition: Option<&'a Transition>,
    surface: &'a mut dyn GraphicsSurface,
    stats: RenderStats,
}

impl<M: Mark> Pass<'_, M> {
    fn remove_node(&mut self, node: &RenderNode) -> ApertureResult<()> {
        let handles = node.handles();
        if !handles.is_empty() {
            self.surface.remove_all(&handles)?;
            self.stats.removed += handles.len() as u64;
        }
        Ok(())
    }

    fn contain<T>(&mut self, key: &NodeKey, r: ApertureResult<T>) -> ApertureResult<Option<T>> {
        match r {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.is_evaluation() => {
                tracing::warn!(node = key.as_str(), error = %e, "skipping after evaluation error");
                self.stats.skipped += 1;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn slot_count(&self, node: &RenderNode) -> ApertureResult<usize> {
        let name = format!("{}-count", self.mark.prefix());
        let value = self
            .mappings
            .evaluate(&name, &EvalContext::new(&node.data, &[]))?;
        count_or(&name, value, 1)
    }

    fn slot_visible(&self, ctx: &SlotContext<'_>) -> ApertureResult<bool> {
        let name = format!("{}-visible", self.mark.prefix());
        Ok(match ctx.value(self.mappings, &name)? {
            None | Some(Value::Undefined) | Some(Value::Null) => true,
            Some(v) => v.truthy(),
        })
    }

    fn update_node(
        &mut self,
        key: &NodeKey,
        node: &mut RenderNode,
        fresh_data: bool,
    ) -> ApertureResult<()> {
        let count = self.slot_count(node);
        let Some(count) = self.contain(key, count)? else {
            return Ok(());
        };

        while node.slots.len() > count {
            if let Some(Some(stale)) = node.slots.last() {
                self.surface.remove_primitive(stale.handle)?;
                self.stats.removed += 1;
            }
            node.slots.pop();
        }
        node.slots.resize_with(count, || None);

        for i in 0..count {
            let ctx = SlotContext {
                key,
                data: &node.data,
                frame: node.frame,
                indices: smallvec![i],
            };
            self.update_slot(&ctx, &mut node.slots[i], fresh_data)?;
        }
        Ok(())
    }

    fn release(&mut self, slot: &mut Option<SlotCache>) -> ApertureResult<()> {
        if let Some(cache) = slot {
            self.surface.remove_primitive(cache.handle)?;
            self.stats.removed += 1;
            *slot = None;
        }
        Ok(())
    }

    fn update_slot(
        &mut self,
        ctx: &SlotContext<'_>,
        slot: &mut Option<SlotCache>,
        fresh_data: bool,
    ) -> ApertureResult<()> {
        let visible = self.slot_visible(ctx);
        let Some(visible) = self.contain(ctx.key, visible)? else {
            return Ok(());
        };
        if !visible {
            return self.release(slot);
        }

        let built = self.mark.build(ctx, self.mappings);
        let Some(built) = self.contain(ctx.key, built)? else {
            return Ok(());
        };
        let Some(spec) = built else {
            return self.release(slot);
        };

        if self.cull.is_culled(spec.bounds(), self.mark.cull_buffer(&spec)) {
            self.stats.culled += 1;
            return self.release(slot);
        }

        let geometry = spec.geometry.to_svg();
        match slot {
            None => {
                let mut attrs = spec.attrs.clone();
                attrs.insert(GEOMETRY_ATTR.to_owned(), Value::Text(geometry.clone()));
                let handle = self.surface.create_primitive(self.mark.kind(), &attrs)?;
                self.stats.created += 1;
                let cache = slot.insert(SlotCache {
                    handle,
                    geometry,
                    attrs: spec.attrs,
                    data_attached: false,
                });
                self.surface.attach_data(handle, ctx.data, &ctx.indices)?;
                cache.data_attached = true;
                if let Some(t) = self.transition {
                    self.surface.apparate(handle, t)?;
                }
            }
            Some(cache) => {
                let mut delta = diff_attrs(&cache.attrs, &spec.attrs);
                if cache.geometry != geometry {
                    for (name, value) in &spec.attrs {
                        delta.entry(name.clone()).or_insert_with(|| value.clone());
                    }
                    delta.insert(GEOMETRY_ATTR.to_owned(), Value::Text(geometry.clone()));
                }
                if delta.is_empty() {
                    self.stats.unchanged += 1;
                } else {
                    self.surface
                        .set_attributes(cache.handle, &delta, self.transition)?;
                    self.stats.updated += 1;
                }
                cache.geometry = geometry;
                cache.attrs = spec.attrs;
                if fresh_data || !cache.data_attached {
                    cache.data_attached = false;
                    self.surface
                        .attach_data(cache.handle, ctx.data, &ctx.indices)?;
                    cache.data_attached = true;
                }
            }
        }
        Ok(())
    }
}

/// Attributes of `next` that differ from `prev`, plus `prev`-only ones as `Undefined`.
fn diff_attrs(prev: &Attrs, next: &Attrs) -> Attrs {
    let mut delta: Attrs = next
        .iter()
        .filter(|(name, value)| prev.get(*name) != Some(*value))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    for name in prev.keys() {
        if !next.contains_key(name) {
            delta.insert(name.clone(), Value::Undefined);
        }
    }
    delta
}

#[cfg(test)]
#[path = "../../tests/unit/render/engine.rs"]
mod tests;
