use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::error::{ApertureError, ApertureResult};
use crate::foundation::value::Value;

/// Bounds reported by a scalar range that has never been expanded.
pub const DEFAULT_SCALAR_BOUNDS: (f64, f64) = (0.0, 1.0);

/// Smallest lower bound a logarithmic view will take a log of.
const LOG_FLOOR: f64 = 1e-12;

/// Domain kind of a [`Range`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangeKind {
    Ordinal,
    Scalar,
}

/// Map formula applied by one view of a scalar range.
///
/// Views never touch the accumulated bounds; they only reinterpret them.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarView {
    Linear,
    /// Bounds rounded outward to a "nice" band span for roughly `bands` bands.
    Banded(u32),
    Logarithmic(f64),
    Symmetric,
    Absolute,
}

/// One band of a scalar range, `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Default)]
struct ScalarState {
    bounds: Option<(f64, f64)>,
    label: Option<String>,
}

/// Continuous numeric domain normalized into `[0, 1]`.
///
/// Cloning, or deriving a view, shares the accumulated bounds: a later
/// [`ScalarRange::expand`] on any handle is visible through all of them.
#[derive(Clone, Debug)]
pub struct ScalarRange {
    state: Rc<RefCell<ScalarState>>,
    view: ScalarView,
}

impl Default for ScalarRange {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalarRange {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ScalarState::default())),
            view: ScalarView::Linear,
        }
    }

    /// Widen the domain to include `v`. Non-finite values are ignored.
    pub fn expand(&self, v: f64) {
        if !v.is_finite() {
            return;
        }
        let mut st = self.state.borrow_mut();
        st.bounds = Some(match st.bounds {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        });
    }

    pub fn expand_all(&self, values: impl IntoIterator<Item = f64>) {
        for v in values {
            self.expand(v);
        }
    }

    /// Forget every accumulated value.
    pub fn reset(&self) {
        self.state.borrow_mut().bounds = None;
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().bounds.is_none()
    }

    /// Accumulated `(min, max)`, or [`DEFAULT_SCALAR_BOUNDS`] when empty.
    pub fn bounds(&self) -> (f64, f64) {
        self.state.borrow().bounds.unwrap_or(DEFAULT_SCALAR_BOUNDS)
    }

    pub fn view(&self) -> ScalarView {
        self.view
    }

    /// Whether both handles read the same accumulated bounds.
    pub fn shares_bounds_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn label(&self) -> Option<String> {
        self.state.borrow().label.clone()
    }

    pub fn set_label(&self, label: impl Into<String>) {
        self.state.borrow_mut().label = Some(label.into());
    }

    /// A view with the same bounds and a different map formula.
    pub fn with_view(&self, view: ScalarView) -> ApertureResult<Self> {
        match view {
            ScalarView::Banded(0) => {
                return Err(ApertureError::configuration(
                    "banded range needs at least one band",
                ));
            }
            ScalarView::Logarithmic(base) if !(base.is_finite() && base > 1.0) => {
                return Err(ApertureError::configuration(
                    "logarithmic range base must be finite and > 1",
                ));
            }
            _ => {}
        }
        Ok(Self {
            state: Rc::clone(&self.state),
            view,
        })
    }

    pub fn banded(&self, bands: u32) -> ApertureResult<Self> {
        self.with_view(ScalarView::Banded(bands))
    }

    pub fn logarithmic(&self, base: f64) -> ApertureResult<Self> {
        self.with_view(ScalarView::Logarithmic(base))
    }

    pub fn symmetric(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            view: ScalarView::Symmetric,
        }
    }

    pub fn absolute(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            view: ScalarView::Absolute,
        }
    }

    /// Lower bound as seen through this view.
    pub fn start(&self) -> f64 {
        self.effective_bounds().0
    }

    /// Upper bound as seen through this view.
    pub fn end(&self) -> f64 {
        self.effective_bounds().1
    }

    fn effective_bounds(&self) -> (f64, f64) {
        let (min, max) = self.bounds();
        match self.view {
            ScalarView::Linear => (min, max),
            ScalarView::Banded(bands) => {
                let span = band_span(min, max, bands);
                if span <= 0.0 {
                    return (min, max);
                }
                let start = (min / span).floor() * span;
                let mut end = (max / span).ceil() * span;
                if end <= start {
                    end = start + span;
                }
                (start, end)
            }
            ScalarView::Logarithmic(_) => (min.max(LOG_FLOOR), max.max(LOG_FLOOR)),
            ScalarView::Symmetric => {
                let m = min.abs().max(max.abs());
                (-m, m)
            }
            ScalarView::Absolute => {
                let m = min.abs().max(max.abs());
                let lo = if min <= 0.0 && max >= 0.0 {
                    0.0
                } else {
                    min.abs().min(max.abs())
                };
                (lo, m)
            }
        }
    }

    /// Normalize `v` into `[0, 1]`. A degenerate domain (`min == max`) maps to `0`.
    pub fn map(&self, v: f64) -> f64 {
        let (lo, hi) = self.effective_bounds();
        let t = match self.view {
            ScalarView::Logarithmic(_) => {
                if v <= 0.0 {
                    return 0.0;
                }
                let (llo, lhi) = (lo.ln(), hi.ln());
                if lhi == llo {
                    return 0.0;
                }
                (v.max(lo).ln() - llo) / (lhi - llo)
            }
            ScalarView::Absolute => linear(v.abs(), lo, hi),
            _ => linear(v, lo, hi),
        };
        if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
    }

    /// Band boundaries covering the view's bounds.
    pub fn bands(&self) -> Vec<Band> {
        let (start, end) = self.effective_bounds();
        match self.view {
            ScalarView::Banded(bands) => {
                let (min, max) = self.bounds();
                let span = band_span(min, max, bands);
                if span <= 0.0 {
                    return vec![Band {
                        min: start,
                        max: end,
                    }];
                }
                let count = ((end - start) / span).round().max(1.0) as usize;
                (0..count)
                    .map(|i| Band {
                        min: start + span * i as f64,
                        max: start + span * (i + 1) as f64,
                    })
                    .collect()
            }
            ScalarView::Logarithmic(base) => {
                let first = start.log(base).floor() as i32;
                let last = end.log(base).ceil() as i32;
                (first..last.max(first + 1))
                    .map(|k| Band {
                        min: base.powi(k),
                        max: base.powi(k + 1),
                    })
                    .collect()
            }
            _ => vec![Band {
                min: start,
                max: end,
            }],
        }
    }
}

fn linear(v: f64, lo: f64, hi: f64) -> f64 {
    if hi == lo {
        return 0.0;
    }
    (v - lo) / (hi - lo)
}

/// "Nice" band width (1, 2, 2.5 or 5 times a power of ten).
fn band_span(min: f64, max: f64, bands: u32) -> f64 {
    let raw = (max - min) / f64::from(bands.max(1));
    if !(raw.is_finite() && raw > 0.0) {
        return 0.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let f = raw / magnitude;
    let nice = if f <= 1.0 {
        1.0
    } else if f <= 2.0 {
        2.0
    } else if f <= 2.5 {
        2.5
    } else if f <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

#[derive(Debug, Default)]
struct OrdinalState {
    values: Vec<Value>,
    label: Option<String>,
}

/// Enumerated domain that indexes values in order of first appearance.
#[derive(Clone, Debug, Default)]
pub struct OrdinalRange {
    state: Rc<RefCell<OrdinalState>>,
}

impl OrdinalRange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `v` if unseen. `Undefined` and `Null` are ignored.
    pub fn expand(&self, v: Value) {
        if v.is_nullish() {
            return;
        }
        let mut st = self.state.borrow_mut();
        if !st.values.contains(&v) {
            st.values.push(v);
        }
    }

    pub fn expand_all<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) {
        for v in values {
            self.expand(v.into());
        }
    }

    pub fn reset(&self) {
        self.state.borrow_mut().values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().values.len()
    }

    pub fn values(&self) -> Vec<Value> {
        self.state.borrow().values.clone()
    }

    pub fn label(&self) -> Option<String> {
        self.state.borrow().label.clone()
    }

    pub fn set_label(&self, label: impl Into<String>) {
        self.state.borrow_mut().label = Some(label.into());
    }

    /// Index of `v` in first-seen order; `None` means "not in the domain" and must not be clamped.
    pub fn map(&self, v: &Value) -> Option<usize> {
        self.state.borrow().values.iter().position(|x| x == v)
    }
}

/// Normalized position produced by [`Range::map`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RangePosition {
    /// Position in `[0, 1]`; `None` for non-numeric input.
    Scalar(Option<f64>),
    /// Index into the domain; `None` when absent.
    Ordinal(Option<usize>),
}

/// A data domain of either kind.
#[derive(Clone, Debug)]
pub enum Range {
    Scalar(ScalarRange),
    Ordinal(OrdinalRange),
}

impl Range {
    pub fn scalar() -> Self {
        Self::Scalar(ScalarRange::new())
    }

    pub fn ordinal() -> Self {
        Self::Ordinal(OrdinalRange::new())
    }

    pub fn new(kind: RangeKind) -> Self {
        match kind {
            RangeKind::Scalar => Self::scalar(),
            RangeKind::Ordinal => Self::ordinal(),
        }
    }

    pub fn kind(&self) -> RangeKind {
        match self {
            Self::Scalar(_) => RangeKind::Scalar,
            Self::Ordinal(_) => RangeKind::Ordinal,
        }
    }

    /// Widen the domain with a dynamic value.
    ///
    /// Scalar ranges ignore nullish values and reject anything non-numeric.
    pub fn expand(&self, v: &Value) -> ApertureResult<()> {
        match self {
            Self::Scalar(r) => match v {
                Value::Number(n) => {
                    r.expand(*n);
                    Ok(())
                }
                Value::Undefined | Value::Null => Ok(()),
                other => Err(ApertureError::evaluation(format!(
                    "scalar range cannot expand with non-numeric value '{other}'"
                ))),
            },
            Self::Ordinal(r) => {
                r.expand(v.clone());
                Ok(())
            }
        }
    }

    pub fn map(&self, v: &Value) -> RangePosition {
        match self {
            Self::Scalar(r) => RangePosition::Scalar(v.as_f64().map(|n| r.map(n))),
            Self::Ordinal(r) => RangePosition::Ordinal(r.map(v)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(r) => r.is_empty(),
            Self::Ordinal(r) => r.is_empty(),
        }
    }

    pub fn reset(&self) {
        match self {
            Self::Scalar(r) => r.reset(),
            Self::Ordinal(r) => r.reset(),
        }
    }

    pub fn label(&self) -> Option<String> {
        match self {
            Self::Scalar(r) => r.label(),
            Self::Ordinal(r) => r.label(),
        }
    }

    pub fn set_label(&self, label: impl Into<String>) {
        match self {
            Self::Scalar(r) => r.set_label(label),
            Self::Ordinal(r) => r.set_label(label),
        }
    }
}

impl From<ScalarRange> for Range {
    fn from(r: ScalarRange) -> Self {
        Self::Scalar(r)
    }
}

impl From<OrdinalRange> for Range {
    fn from(r: OrdinalRange) -> Self {
        Self::Ordinal(r)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scale/range.rs"]
mod tests;
