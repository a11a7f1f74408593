use crate::foundation::core::Rect;

/// Viewport culling for spatial layers.
///
/// A slot whose bounds fall entirely outside the viewport grown by `buffer_units` times the
/// element's own size is treated as absent. The margin keeps elements alive just off screen
/// so panning does not pop them in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CullPolicy {
    pub viewport: Option<Rect>,
    pub buffer_units: f64,
}

impl Default for CullPolicy {
    fn default() -> Self {
        Self {
            viewport: None,
            buffer_units: 1.0,
        }
    }
}

impl CullPolicy {
    pub fn new(viewport: Rect) -> Self {
        Self {
            viewport: Some(viewport),
            ..Self::default()
        }
    }

    pub fn with_buffer_units(mut self, units: f64) -> Self {
        self.buffer_units = units;
        self
    }

    pub fn is_culled(&self, bounds: Rect, element_size: f64) -> bool {
        let Some(viewport) = self.viewport else {
            return false;
        };
        let margin = (self.buffer_units * element_size.abs()).max(0.0);
        let area = viewport.abs().inflate(margin, margin);
        let bounds = bounds.abs();
        bounds.x1 < area.x0 || bounds.x0 > area.x1 || bounds.y1 < area.y0 || bounds.y0 > area.y1
    }
}
