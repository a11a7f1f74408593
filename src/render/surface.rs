use crate::animation::transition::Transition;
use crate::foundation::core::{Attrs, PrimitiveHandle};
use crate::foundation::error::ApertureResult;
use crate::foundation::value::Value;

/// Attribute carrying a primitive's geometry as an SVG path string.
pub const GEOMETRY_ATTR: &str = "d";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveKind {
    /// Closed, filled outline.
    Shape,
    /// Open stroked path.
    Line,
}

/// Capability set the render engine drives.
///
/// The engine never touches a concrete backend; every create/update/remove goes through
/// this trait. Implementations own animation scheduling and fire transition completion
/// callbacks on their own schedule.
pub trait GraphicsSurface {
    fn create_primitive(&mut self, kind: PrimitiveKind, attrs: &Attrs)
    -> ApertureResult<PrimitiveHandle>;

    /// Merge `attrs` into the primitive. `Value::Undefined` clears an attribute.
    fn set_attributes(
        &mut self,
        handle: PrimitiveHandle,
        attrs: &Attrs,
        transition: Option<&Transition>,
    ) -> ApertureResult<()>;

    fn remove_primitive(&mut self, handle: PrimitiveHandle) -> ApertureResult<()>;

    fn remove_all(&mut self, handles: &[PrimitiveHandle]) -> ApertureResult<()> {
        for &handle in handles {
            self.remove_primitive(handle)?;
        }
        Ok(())
    }

    fn attach_data(
        &mut self,
        handle: PrimitiveHandle,
        data: &serde_json::Value,
        index_path: &[usize],
    ) -> ApertureResult<()>;

    fn get_attribute(&self, handle: PrimitiveHandle, name: &str) -> Option<Value>;

    /// Animate the entrance of a freshly created primitive.
    fn apparate(&mut self, handle: PrimitiveHandle, transition: &Transition) -> ApertureResult<()>;
}

/// One surface call, as recorded by [`crate::RecordingSurface`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SurfaceOp {
    Create {
        handle: PrimitiveHandle,
        kind: PrimitiveKind,
        attrs: Attrs,
    },
    SetAttributes {
        handle: PrimitiveHandle,
        attrs: Attrs,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
    },
    Remove {
        handle: PrimitiveHandle,
    },
    RemoveAll {
        handles: Vec<PrimitiveHandle>,
    },
    AttachData {
        handle: PrimitiveHandle,
        index_path: Vec<usize>,
    },
    Apparate {
        handle: PrimitiveHandle,
        duration_ms: u64,
    },
}

impl SurfaceOp {
    pub fn handle(&self) -> Option<PrimitiveHandle> {
        match self {
            Self::Create { handle, .. }
            | Self::SetAttributes { handle, .. }
            | Self::Remove { handle }
            | Self::AttachData { handle, .. }
            | Self::Apparate { handle, .. } => Some(*handle),
            Self::RemoveAll { .. } => None,
        }
    }

    /// Whether this call (re)assigns geometry.
    pub fn sets_geometry(&self) -> bool {
        match self {
            Self::Create { attrs, .. } | Self::SetAttributes { attrs, .. } => {
                attrs.contains_key(GEOMETRY_ATTR)
            }
            _ => false,
        }
    }
}

/// Apply a partial attribute update to a live attribute table.
pub(crate) fn merge_attrs(live: &mut Attrs, update: &Attrs) {
    for (name, value) in update {
        if value.is_undefined() {
            live.remove(name);
        } else {
            live.insert(name.clone(), value.clone());
        }
    }
}

/// Completion callbacks waiting for their animations to finish.
///
/// A pass shares one transition across every mutation, so each distinct callback is
/// queued once no matter how many primitives it animates.
#[derive(Debug, Default)]
pub(crate) struct PendingCompletions {
    pending: Vec<Transition>,
}

impl PendingCompletions {
    pub(crate) fn push(&mut self, transition: &Transition) {
        if transition.on_complete.is_none() {
            return;
        }
        if self.pending.iter().any(|t| t.same_completion(transition)) {
            return;
        }
        self.pending.push(transition.clone());
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Fire and drain every queued callback; returns how many ran.
    pub(crate) fn fire(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        for t in &pending {
            if let Some(f) = &t.on_complete {
                f();
            }
        }
        pending.len()
    }
}
