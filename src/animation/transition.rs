use std::fmt;
use std::rc::Rc;

use crate::animation::ease::Ease;

/// Callback fired by a surface once the animations of a pass complete.
pub type CompletionFn = Rc<dyn Fn()>;

/// Animated transition attached to every attribute mutation of one render pass.
///
/// The engine never interprets it; surfaces schedule the animation and fire
/// `on_complete` asynchronously.
#[derive(Clone)]
pub struct Transition {
    pub duration_ms: u64,
    pub easing: Ease,
    pub on_complete: Option<CompletionFn>,
}

impl Transition {
    pub fn new(duration_ms: u64, easing: Ease) -> Self {
        Self {
            duration_ms,
            easing,
            on_complete: None,
        }
    }

    pub fn on_complete(mut self, f: impl Fn() + 'static) -> Self {
        self.on_complete = Some(Rc::new(f));
        self
    }

    /// Whether two descriptors carry the same completion callback instance.
    pub fn same_completion(&self, other: &Self) -> bool {
        match (&self.on_complete, &other.on_complete) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("duration_ms", &self.duration_ms)
            .field("easing", &self.easing)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Serializable transition settings used by chart configuration.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransitionSpec {
    pub duration_ms: u64,
    #[serde(default)]
    pub easing: Ease,
}

impl From<TransitionSpec> for Transition {
    fn from(spec: TransitionSpec) -> Self {
        Self::new(spec.duration_ms, spec.easing)
    }
}
