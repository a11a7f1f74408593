use std::fmt;
use std::rc::Rc;

use crate::foundation::error::{ApertureError, ApertureResult};
use crate::foundation::value::Value;
use crate::mapping::path::FieldPath;

/// Arguments a mapping is evaluated with.
#[derive(Clone, Copy, Debug)]
pub struct EvalContext<'a> {
    /// Data item the accessor reads from.
    pub data: &'a serde_json::Value,
    /// Trailing index arguments (slot, point, ...).
    pub indices: &'a [usize],
    /// Context filters run against; the data item unless overridden.
    pub this: &'a serde_json::Value,
}

impl<'a> EvalContext<'a> {
    pub fn new(data: &'a serde_json::Value, indices: &'a [usize]) -> Self {
        Self {
            data,
            indices,
            this: data,
        }
    }

    pub fn with_this(mut self, this: &'a serde_json::Value) -> Self {
        self.this = this;
        self
    }

    /// Index argument `i`, if supplied.
    pub fn index(&self, i: usize) -> Option<usize> {
        self.indices.get(i).copied()
    }
}

/// User accessor function.
pub type AccessorFn = Rc<dyn Fn(&EvalContext<'_>) -> ApertureResult<Value>>;

/// How a mapping reads its raw value. Exactly one kind is active.
#[derive(Clone)]
pub enum Accessor {
    Constant(Value),
    Field(Rc<FieldPath>),
    Function(AccessorFn),
}

impl Accessor {
    pub fn field(path: &str) -> ApertureResult<Self> {
        Ok(Self::Field(Rc::new(FieldPath::parse(path)?)))
    }

    pub fn function(f: impl Fn(&EvalContext<'_>) -> ApertureResult<Value> + 'static) -> Self {
        Self::Function(Rc::new(f))
    }

    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> ApertureResult<Value> {
        match self {
            Self::Constant(v) => Ok(v.clone()),
            Self::Field(path) => path.resolve(ctx.data, ctx.indices),
            Self::Function(f) => f(ctx),
        }
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Self::Field(p) => f.debug_tuple("Field").field(&p.as_str()).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Argument accepted by [`crate::Mapping::from`].
#[derive(Clone)]
pub enum Source {
    Field(String),
    Function(AccessorFn),
}

impl Source {
    /// Read a source from configuration; only strings are accepted.
    pub fn from_json(v: &serde_json::Value) -> ApertureResult<Self> {
        match v {
            serde_json::Value::String(s) => Ok(Self::Field(s.clone())),
            other => Err(ApertureError::configuration(format!(
                "mapping source must be a function or a field path string, got {other}"
            ))),
        }
    }

    pub fn function(f: impl Fn(&EvalContext<'_>) -> ApertureResult<Value> + 'static) -> Self {
        Self::Function(Rc::new(f))
    }

    pub(crate) fn into_accessor(self) -> ApertureResult<Accessor> {
        match self {
            Self::Field(path) => Accessor::field(&path),
            Self::Function(f) => Ok(Accessor::Function(f)),
        }
    }
}

impl From<&str> for Source {
    fn from(v: &str) -> Self {
        Self::Field(v.to_owned())
    }
}

impl From<String> for Source {
    fn from(v: String) -> Self {
        Self::Field(v)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(p) => f.debug_tuple("Field").field(p).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}
