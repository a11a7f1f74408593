use std::fmt;
use std::rc::Rc;

use crate::foundation::error::ApertureResult;
use crate::foundation::value::Value;
use crate::mapping::accessor::EvalContext;

type FilterFn = dyn Fn(Value, &EvalContext<'_>) -> ApertureResult<Value>;

/// One step of a mapping's filter chain.
///
/// Filters are compared by identity: clones of the same filter are equal,
/// two filters built from identical closures are not.
#[derive(Clone)]
pub struct Filter(Rc<FilterFn>);

impl Filter {
    pub fn new(f: impl Fn(Value, &EvalContext<'_>) -> Value + 'static) -> Self {
        Self(Rc::new(move |v, ctx| Ok(f(v, ctx))))
    }

    pub fn try_new(f: impl Fn(Value, &EvalContext<'_>) -> ApertureResult<Value> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn apply(&self, v: Value, ctx: &EvalContext<'_>) -> ApertureResult<Value> {
        (self.0)(v, ctx)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}
