use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::foundation::error::ApertureResult;
use crate::foundation::value::Value;
use crate::mapping::accessor::EvalContext;
use crate::mapping::property::Mapping;

#[derive(Debug, Default)]
struct SetState {
    mappings: BTreeMap<String, Mapping>,
    parent: Option<MappingSet>,
}

/// Named mappings of one layer, optionally inheriting from a parent layer's set.
#[derive(Clone, Debug, Default)]
pub struct MappingSet {
    state: Rc<RefCell<SetState>>,
}

impl MappingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set whose mappings inherit from this one.
    pub fn child(&self) -> Self {
        Self {
            state: Rc::new(RefCell::new(SetState {
                mappings: BTreeMap::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    pub fn parent(&self) -> Option<MappingSet> {
        self.state.borrow().parent.clone()
    }

    /// The local mapping for `name`, created on first use.
    ///
    /// A new mapping inherits from whatever the parent set maps under the same name when
    /// it is evaluated, so mappings added to the parent later are still picked up. The
    /// parent set itself is left untouched.
    pub fn map(&self, name: &str) -> Mapping {
        if let Some(m) = self.state.borrow().mappings.get(name) {
            return m.clone();
        }
        let mapping = match self.parent() {
            Some(p) => Mapping::inheriting_from_set(name, &p),
            None => Mapping::new(name),
        };
        self.state
            .borrow_mut()
            .mappings
            .insert(name.to_owned(), mapping.clone());
        mapping
    }

    /// The mapping that applies to `name`: local first, then inherited.
    pub fn get(&self, name: &str) -> Option<Mapping> {
        let st = self.state.borrow();
        if let Some(m) = st.mappings.get(name) {
            return Some(m.clone());
        }
        st.parent.as_ref().and_then(|p| p.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Every mapped property name, local and inherited.
    pub fn names(&self) -> Vec<String> {
        let st = self.state.borrow();
        let mut names = st
            .parent
            .as_ref()
            .map(MappingSet::names)
            .unwrap_or_default();
        for name in st.mappings.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names.sort();
        names
    }

    /// `Ok(None)` when nothing maps `name`.
    pub fn value_for(
        &self,
        name: &str,
        data: &serde_json::Value,
        indices: &[usize],
    ) -> ApertureResult<Option<Value>> {
        self.evaluate(name, &EvalContext::new(data, indices))
    }

    pub fn evaluate(&self, name: &str, ctx: &EvalContext<'_>) -> ApertureResult<Option<Value>> {
        match self.get(name) {
            Some(m) => m.evaluate(ctx).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mapping/set.rs"]
mod tests;
