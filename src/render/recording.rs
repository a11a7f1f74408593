use std::collections::BTreeMap;

use crate::animation::transition::Transition;
use crate::foundation::core::{Attrs, PrimitiveHandle};
use crate::foundation::error::{ApertureError, ApertureResult};
use crate::foundation::value::Value;
use crate::render::surface::{
    GraphicsSurface, PendingCompletions, PrimitiveKind, SurfaceOp, merge_attrs,
};

#[derive(Clone, Debug)]
struct LivePrimitive {
    kind: PrimitiveKind,
    attrs: Attrs,
    data: Option<serde_json::Value>,
    index_path: Vec<usize>,
}

/// Surface that records every call and keeps the resulting primitive state.
///
/// Used by tests and by `aperture render --ops` to inspect exactly what the engine asked
/// for. Animations never run; queued completion callbacks fire on
/// [`RecordingSurface::complete_transitions`].
#[derive(Debug, Default)]
pub struct RecordingSurface {
    ops: Vec<SurfaceOp>,
    live: BTreeMap<PrimitiveHandle, LivePrimitive>,
    next_handle: u64,
    completions: PendingCompletions,
    creates_before_failure: Option<usize>,
    attaches_before_failure: Option<usize>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `n` more creations succeed, then reject every following one.
    pub fn fail_creates_after(&mut self, n: usize) {
        self.creates_before_failure = Some(n);
    }

    /// Same as [`RecordingSurface::fail_creates_after`] for `attach_data`.
    pub fn fail_attaches_after(&mut self, n: usize) {
        self.attaches_before_failure = Some(n);
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: PrimitiveHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn handles(&self) -> Vec<PrimitiveHandle> {
        self.live.keys().copied().collect()
    }

    pub fn attributes(&self, handle: PrimitiveHandle) -> Option<&Attrs> {
        self.live.get(&handle).map(|p| &p.attrs)
    }

    pub fn kind(&self, handle: PrimitiveHandle) -> Option<PrimitiveKind> {
        self.live.get(&handle).map(|p| p.kind)
    }

    pub fn data(&self, handle: PrimitiveHandle) -> Option<(&serde_json::Value, &[usize])> {
        let p = self.live.get(&handle)?;
        p.data.as_ref().map(|d| (d, p.index_path.as_slice()))
    }

    pub fn pending_completions(&self) -> usize {
        self.completions.len()
    }

    /// Finish every running animation; returns the number of callbacks fired.
    pub fn complete_transitions(&mut self) -> usize {
        self.completions.fire()
    }

    pub fn ops_json(&self) -> ApertureResult<String> {
        serde_json::to_string_pretty(&self.ops).map_err(|e| ApertureError::serde(e.to_string()))
    }

    fn live_mut(&mut self, handle: PrimitiveHandle) -> ApertureResult<&mut LivePrimitive> {
        self.live
            .get_mut(&handle)
            .ok_or_else(|| ApertureError::surface(format!("unknown primitive {}", handle.0)))
    }
}

impl GraphicsSurface for RecordingSurface {
    fn create_primitive(
        &mut self,
        kind: PrimitiveKind,
        attrs: &Attrs,
    ) -> ApertureResult<PrimitiveHandle> {
        if let Some(left) = self.creates_before_failure.as_mut() {
            if *left == 0 {
                return Err(ApertureError::surface("primitive creation rejected"));
            }
            *left -= 1;
        }

        let handle = PrimitiveHandle(self.next_handle);
        self.next_handle += 1;

        let mut live = Attrs::new();
        merge_attrs(&mut live, attrs);
        self.live.insert(
            handle,
            LivePrimitive {
                kind,
                attrs: live,
                data: None,
                index_path: Vec::new(),
            },
        );
        self.ops.push(SurfaceOp::Create {
            handle,
            kind,
            attrs: attrs.clone(),
        });
        Ok(handle)
    }

    fn set_attributes(
        &mut self,
        handle: PrimitiveHandle,
        attrs: &Attrs,
        transition: Option<&Transition>,
    ) -> ApertureResult<()> {
        merge_attrs(&mut self.live_mut(handle)?.attrs, attrs);
        if let Some(t) = transition {
            self.completions.push(t);
        }
        self.ops.push(SurfaceOp::SetAttributes {
            handle,
            attrs: attrs.clone(),
            duration_ms: transition.map(|t| t.duration_ms),
        });
        Ok(())
    }

    fn remove_primitive(&mut self, handle: PrimitiveHandle) -> ApertureResult<()> {
        if self.live.remove(&handle).is_none() {
            return Err(ApertureError::surface(format!(
                "cannot remove unknown primitive {}",
                handle.0
            )));
        }
        self.ops.push(SurfaceOp::Remove { handle });
        Ok(())
    }

    fn remove_all(&mut self, handles: &[PrimitiveHandle]) -> ApertureResult<()> {
        for handle in handles {
            if self.live.remove(handle).is_none() {
                return Err(ApertureError::surface(format!(
                    "cannot remove unknown primitive {}",
                    handle.0
                )));
            }
        }
        self.ops.push(SurfaceOp::RemoveAll {
            handles: handles.to_vec(),
        });
        Ok(())
    }

    fn attach_data(
        &mut self,
        handle: PrimitiveHandle,
        data: &serde_json::Value,
        index_path: &[usize],
    ) -> ApertureResult<()> {
        if let Some(left) = self.attaches_before_failure.as_mut() {
            if *left == 0 {
                return Err(ApertureError::surface("data attachment rejected"));
            }
            *left -= 1;
        }

        let live = self.live_mut(handle)?;
        live.data = Some(data.clone());
        live.index_path = index_path.to_vec();
        self.ops.push(SurfaceOp::AttachData {
            handle,
            index_path: index_path.to_vec(),
        });
        Ok(())
    }

    fn get_attribute(&self, handle: PrimitiveHandle, name: &str) -> Option<Value> {
        self.live.get(&handle)?.attrs.get(name).cloned()
    }

    fn apparate(&mut self, handle: PrimitiveHandle, transition: &Transition) -> ApertureResult<()> {
        self.live_mut(handle)?;
        self.completions.push(transition);
        self.ops.push(SurfaceOp::Apparate {
            handle,
            duration_ms: transition.duration_ms,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/recording.rs"]
mod tests;
