use std::fmt;
use std::rc::Rc;

use crate::animation::ease::Ease;
use crate::foundation::color::{Blend, Color};
use crate::foundation::error::{ApertureError, ApertureResult};
use crate::foundation::value::Value;
use crate::scale::range::{OrdinalRange, Range, ScalarRange};

/// Custom response curve; must satisfy `f(0) == 0` and `f(1) == 1`.
pub type TweenFn = Rc<dyn Fn(f64) -> f64>;

const TWEEN_EPSILON: f64 = 1e-9;

/// Response curve applied to a normalized scalar position before interpolation.
#[derive(Clone, Default)]
pub enum Tween {
    #[default]
    Linear,
    /// Square root, so that mapped sizes grow with area rather than radius.
    Area,
    Ease(Ease),
    Custom(TweenFn),
}

impl Tween {
    pub fn from_name(name: &str) -> ApertureResult<Self> {
        match name {
            "linear" => Ok(Self::Linear),
            "area" => Ok(Self::Area),
            other => Ease::from_name(other)
                .map(Self::Ease)
                .map_err(|_| ApertureError::configuration(format!("unknown tween type '{name}'"))),
        }
    }

    /// Wrap `f` after checking its boundary conditions.
    pub fn custom(f: impl Fn(f64) -> f64 + 'static) -> ApertureResult<Self> {
        let at0 = f(0.0);
        let at1 = f(1.0);
        if (at0 - 0.0).abs() > TWEEN_EPSILON || (at1 - 1.0).abs() > TWEEN_EPSILON {
            return Err(ApertureError::configuration(format!(
                "tween function must satisfy f(0)=0 and f(1)=1, got f(0)={at0} f(1)={at1}"
            )));
        }
        Ok(Self::Custom(Rc::new(f)))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Linear => "linear",
            Self::Area => "area",
            Self::Ease(e) => e.name(),
            Self::Custom(_) => "custom",
        }
    }

    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::Area => t.max(0.0).sqrt(),
            Self::Ease(e) => e.apply(t),
            Self::Custom(f) => f(t),
        }
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tween({})", self.name())
    }
}

/// Output array of a scalar key, resolved once at construction.
#[derive(Clone, Debug)]
enum ScalarOutputs {
    Numeric(Vec<f64>),
    Blendable(Vec<Color>),
}

impl ScalarOutputs {
    fn resolve(to: &[Value]) -> ApertureResult<Self> {
        if let Some(nums) = to.iter().map(Value::as_f64).collect::<Option<Vec<_>>>() {
            return Ok(Self::Numeric(nums));
        }
        if let Some(colors) = to.iter().map(Value::as_color).collect::<Option<Vec<_>>>() {
            return Ok(Self::Blendable(colors));
        }
        Err(ApertureError::configuration(
            "scalar map key outputs must all be numbers or all be colors",
        ))
    }

    fn at(&self, p: f64) -> Value {
        match self {
            Self::Numeric(v) => Value::Number(interpolate(v, p)),
            Self::Blendable(v) => Value::Color(interpolate(v, p)),
        }
    }
}

fn interpolate<T: Blend + Clone>(to: &[T], p: f64) -> T {
    let last = to.len() - 1;
    if p <= 0.0 {
        return to[0].clone();
    }
    if p >= 1.0 {
        return to[last].clone();
    }
    let scaled = p * last as f64;
    let i = (scaled.floor() as usize).min(last - 1);
    let t = scaled - i as f64;
    to[i].blend(&to[i + 1], t)
}

/// Maps a scalar domain onto an interpolated output array.
#[derive(Clone, Debug)]
pub struct ScalarMapKey {
    range: ScalarRange,
    to: Vec<Value>,
    outputs: ScalarOutputs,
    tween: Tween,
}

impl ScalarMapKey {
    pub fn new(range: ScalarRange, to: Vec<Value>) -> ApertureResult<Self> {
        if to.len() < 2 {
            return Err(ApertureError::configuration(format!(
                "scalar map key needs at least 2 outputs, got {}",
                to.len()
            )));
        }
        let outputs = ScalarOutputs::resolve(&to)?;
        if range.is_empty() {
            let (lo, hi) = range.bounds();
            tracing::warn!(lo, hi, "scalar map key built from an empty range; using default bounds");
        }
        Ok(Self {
            range,
            to,
            outputs,
            tween: Tween::Linear,
        })
    }

    pub fn from(&self) -> &ScalarRange {
        &self.range
    }

    pub fn to(&self) -> &[Value] {
        &self.to
    }

    pub fn tween(&self) -> &Tween {
        &self.tween
    }

    pub fn tween_type(&self) -> &str {
        self.tween.name()
    }

    pub fn set_tween(&mut self, tween: Tween) {
        self.tween = tween;
    }

    pub fn set_type(&mut self, name: &str) -> ApertureResult<()> {
        self.tween = Tween::from_name(name)?;
        Ok(())
    }

    pub fn set_tween_fn(&mut self, f: impl Fn(f64) -> f64 + 'static) -> ApertureResult<()> {
        self.tween = Tween::custom(f)?;
        Ok(())
    }

    /// Output for an already normalized position.
    pub fn map_position(&self, p: f64) -> Value {
        let p = self.tween.apply(p.clamp(0.0, 1.0));
        self.outputs.at(p)
    }

    /// Non-numeric input maps to `Undefined`.
    pub fn map(&self, v: &Value) -> Value {
        match v.as_f64() {
            Some(n) => self.map_position(self.range.map(n)),
            None => Value::Undefined,
        }
    }
}

/// Maps an ordinal domain onto output values by index, cycling through `to`.
#[derive(Clone, Debug)]
pub struct OrdinalMapKey {
    range: OrdinalRange,
    to: Vec<Value>,
}

impl OrdinalMapKey {
    pub fn new(range: OrdinalRange, to: Vec<Value>) -> ApertureResult<Self> {
        if to.is_empty() {
            return Err(ApertureError::configuration(
                "ordinal map key needs at least 1 output",
            ));
        }
        if range.is_empty() {
            tracing::warn!("ordinal map key built from an empty range; every lookup is undefined");
        }
        Ok(Self { range, to })
    }

    pub fn from(&self) -> &OrdinalRange {
        &self.range
    }

    pub fn to(&self) -> &[Value] {
        &self.to
    }

    /// Values outside the domain map to `Undefined` rather than an error.
    pub fn map(&self, v: &Value) -> Value {
        match self.range.map(v) {
            Some(i) => self.to[i % self.to.len()].clone(),
            None => Value::Undefined,
        }
    }
}

/// Transformation from a range position to a visual value.
#[derive(Clone, Debug)]
pub enum MapKey {
    Scalar(ScalarMapKey),
    Ordinal(OrdinalMapKey),
}

impl MapKey {
    pub fn map(&self, v: &Value) -> Value {
        match self {
            Self::Scalar(k) => k.map(v),
            Self::Ordinal(k) => k.map(v),
        }
    }

    pub fn to(&self) -> &[Value] {
        match self {
            Self::Scalar(k) => k.to(),
            Self::Ordinal(k) => k.to(),
        }
    }

    pub fn range(&self) -> Range {
        match self {
            Self::Scalar(k) => Range::Scalar(k.from().clone()),
            Self::Ordinal(k) => Range::Ordinal(k.from().clone()),
        }
    }

    /// Tween name; ordinal keys have none.
    pub fn tween_type(&self) -> Option<&str> {
        match self {
            Self::Scalar(k) => Some(k.tween_type()),
            Self::Ordinal(_) => None,
        }
    }

    pub fn set_type(&mut self, name: &str) -> ApertureResult<()> {
        match self {
            Self::Scalar(k) => k.set_type(name),
            Self::Ordinal(_) => Err(ApertureError::configuration(
                "ordinal map keys do not support tween types",
            )),
        }
    }

    pub fn set_tween_fn(&mut self, f: impl Fn(f64) -> f64 + 'static) -> ApertureResult<()> {
        match self {
            Self::Scalar(k) => k.set_tween_fn(f),
            Self::Ordinal(_) => Err(ApertureError::configuration(
                "ordinal map keys do not support tween functions",
            )),
        }
    }
}

impl ScalarRange {
    pub fn mapped_to(&self, to: Vec<Value>) -> ApertureResult<ScalarMapKey> {
        ScalarMapKey::new(self.clone(), to)
    }
}

impl OrdinalRange {
    pub fn mapped_to(&self, to: Vec<Value>) -> ApertureResult<OrdinalMapKey> {
        OrdinalMapKey::new(self.clone(), to)
    }
}

impl Range {
    pub fn mapped_to(&self, to: Vec<Value>) -> ApertureResult<MapKey> {
        match self {
            Self::Scalar(r) => r.mapped_to(to).map(MapKey::Scalar),
            Self::Ordinal(r) => r.mapped_to(to).map(MapKey::Ordinal),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scale/map_key.rs"]
mod tests;
