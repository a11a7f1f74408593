use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::error::{ApertureError, ApertureResult};
use crate::foundation::value::Value;
use crate::mapping::accessor::{Accessor, EvalContext, Source};
use crate::mapping::filter::Filter;
use crate::mapping::set::MappingSet;
use crate::scale::map_key::MapKey;

/// Per-field override state: read from the parent until written locally.
#[derive(Clone, Debug)]
enum Local<T> {
    Inherit,
    Set(T),
}

/// Where inherited fields come from.
#[derive(Clone, Debug)]
enum Upstream {
    Mapping(Mapping),
    /// Looked up by property name on every read, so the parent set is never written to.
    Set(MappingSet),
}

impl Upstream {
    fn resolve(&self, property: &str) -> Option<Mapping> {
        match self {
            Self::Mapping(m) => Some(m.clone()),
            Self::Set(s) => s.get(property),
        }
    }
}

#[derive(Debug)]
struct MappingState {
    property: String,
    parent: Option<Upstream>,
    accessor: Local<Option<Accessor>>,
    transformation: Local<Option<Rc<MapKey>>>,
    filters: Local<Rc<Vec<Filter>>>,
    only: bool,
}

/// Binding of one visual property to data.
///
/// A `Mapping` is a shared handle; clones edit the same binding. A mapping created with
/// [`Mapping::inheriting`] reads accessor, transformation and filters from its parent
/// until each is written locally, or until [`Mapping::only`] detaches all three.
#[derive(Clone, Debug)]
pub struct Mapping {
    state: Rc<RefCell<MappingState>>,
}

impl Mapping {
    pub fn new(property: impl Into<String>) -> Self {
        Self::build(property.into(), None)
    }

    /// A mapping that follows `parent` for every field not overridden locally.
    pub fn inheriting(property: impl Into<String>, parent: &Mapping) -> Self {
        Self::build(property.into(), Some(Upstream::Mapping(parent.clone())))
    }

    /// A mapping that follows whatever `set` maps under the same name at read time.
    pub(crate) fn inheriting_from_set(property: impl Into<String>, set: &MappingSet) -> Self {
        Self::build(property.into(), Some(Upstream::Set(set.clone())))
    }

    fn build(property: String, parent: Option<Upstream>) -> Self {
        let (accessor, transformation, filters) = if parent.is_some() {
            (Local::Inherit, Local::Inherit, Local::Inherit)
        } else {
            (
                Local::Set(None),
                Local::Set(None),
                Local::Set(Rc::new(Vec::new())),
            )
        };
        Self {
            state: Rc::new(RefCell::new(MappingState {
                property,
                parent,
                accessor,
                transformation,
                filters,
                only: false,
            })),
        }
    }

    pub fn property(&self) -> String {
        self.state.borrow().property.clone()
    }

    /// Bind a field path or function accessor.
    pub fn from(&self, source: impl Into<Source>) -> ApertureResult<&Self> {
        let accessor = source.into().into_accessor()?;
        self.state.borrow_mut().accessor = Local::Set(Some(accessor));
        Ok(self)
    }

    pub fn from_field(&self, path: &str) -> ApertureResult<&Self> {
        self.from(Source::Field(path.to_owned()))
    }

    pub fn from_fn(
        &self,
        f: impl Fn(&EvalContext<'_>) -> ApertureResult<Value> + 'static,
    ) -> &Self {
        self.state.borrow_mut().accessor = Local::Set(Some(Accessor::function(f)));
        self
    }

    /// Bind a constant that ignores every argument.
    pub fn as_value(&self, v: impl Into<Value>) -> &Self {
        self.state.borrow_mut().accessor = Local::Set(Some(Accessor::Constant(v.into())));
        self
    }

    /// Set or clear the transformation.
    pub fn using(&self, key: Option<MapKey>) -> &Self {
        self.state.borrow_mut().transformation = Local::Set(key.map(Rc::new));
        self
    }

    pub fn transformation(&self) -> Option<MapKey> {
        self.resolved_transformation().map(|k| (*k).clone())
    }

    pub fn accessor(&self) -> Option<Accessor> {
        self.resolved_accessor()
    }

    pub fn has_accessor(&self) -> bool {
        self.resolved_accessor().is_some()
    }

    /// Append `f` to this mapping's own copy of the filter chain.
    pub fn filter(&self, f: Filter) -> &Self {
        let mut chain = (*self.resolved_filters()).clone();
        chain.push(f);
        self.state.borrow_mut().filters = Local::Set(Rc::new(chain));
        self
    }

    /// Drop every filter for this mapping.
    pub fn clear_filters(&self) -> &Self {
        self.state.borrow_mut().filters = Local::Set(Rc::new(Vec::new()));
        self
    }

    /// Remove one filter by identity, keeping the order of the others.
    pub fn filter_without(&self, f: &Filter) -> &Self {
        let mut chain = (*self.resolved_filters()).clone();
        if let Some(pos) = chain.iter().position(|x| x.ptr_eq(f)) {
            chain.remove(pos);
        }
        self.state.borrow_mut().filters = Local::Set(Rc::new(chain));
        self
    }

    pub fn filters(&self) -> Vec<Filter> {
        (*self.resolved_filters()).clone()
    }

    /// Stop following the parent for accessor, transformation and filters.
    ///
    /// Fields not yet overridden become empty. Irreversible.
    pub fn only(&self) -> &Self {
        let mut st = self.state.borrow_mut();
        if let Local::Inherit = st.accessor {
            st.accessor = Local::Set(None);
        }
        if let Local::Inherit = st.transformation {
            st.transformation = Local::Set(None);
        }
        if let Local::Inherit = st.filters {
            st.filters = Local::Set(Rc::new(Vec::new()));
        }
        st.only = true;
        drop(st);
        self
    }

    pub fn is_only(&self) -> bool {
        self.state.borrow().only
    }

    pub fn value_for(&self, data: &serde_json::Value, indices: &[usize]) -> ApertureResult<Value> {
        self.evaluate(&EvalContext::new(data, indices))
    }

    /// Like [`Mapping::value_for`], with filters run against `this` instead of the data item.
    pub fn value_for_in(
        &self,
        data: &serde_json::Value,
        indices: &[usize],
        this: &serde_json::Value,
    ) -> ApertureResult<Value> {
        self.evaluate(&EvalContext::new(data, indices).with_this(this))
    }

    /// Accessor, then transformation, then each filter in registration order.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> ApertureResult<Value> {
        let mut value = match self.resolved_accessor() {
            Some(accessor) => accessor
                .evaluate(ctx)
                .map_err(|e| self.annotate(e))?,
            None => Value::Undefined,
        };
        if let Some(key) = self.resolved_transformation() {
            value = key.map(&value);
        }
        for f in self.resolved_filters().iter() {
            value = f.apply(value, ctx).map_err(|e| self.annotate(e))?;
        }
        Ok(value)
    }

    fn annotate(&self, e: ApertureError) -> ApertureError {
        match e {
            ApertureError::Evaluation(msg) => {
                ApertureError::evaluation(format!("mapping '{}': {msg}", self.property()))
            }
            other => other,
        }
    }

    fn upstream(&self) -> Option<Mapping> {
        let st = self.state.borrow();
        st.parent.as_ref().and_then(|u| u.resolve(&st.property))
    }

    fn resolved_accessor(&self) -> Option<Accessor> {
        if let Local::Set(a) = &self.state.borrow().accessor {
            return a.clone();
        }
        self.upstream().and_then(|p| p.resolved_accessor())
    }

    fn resolved_transformation(&self) -> Option<Rc<MapKey>> {
        if let Local::Set(k) = &self.state.borrow().transformation {
            return k.clone();
        }
        self.upstream().and_then(|p| p.resolved_transformation())
    }

    fn resolved_filters(&self) -> Rc<Vec<Filter>> {
        if let Local::Set(f) = &self.state.borrow().filters {
            return Rc::clone(f);
        }
        self.upstream()
            .map_or_else(|| Rc::new(Vec::new()), |p| p.resolved_filters())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mapping/property.rs"]
mod tests;
