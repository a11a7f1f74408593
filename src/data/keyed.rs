use std::collections::{BTreeMap, BTreeSet};

use crate::foundation::core::{NodeFrame, NodeKey};
use crate::foundation::error::{ApertureError, ApertureResult};
use crate::foundation::value::Value;
use crate::data::change_set::ChangeSet;
use crate::mapping::path::FieldPath;

/// A diffed data snapshot, not yet committed.
#[derive(Clone, Debug)]
pub struct Snapshot {
    order: Vec<NodeKey>,
    items: BTreeMap<NodeKey, serde_json::Value>,
    frame: NodeFrame,
}

impl Snapshot {
    pub fn keys(&self) -> &[NodeKey] {
        &self.order
    }

    pub fn get(&self, key: &NodeKey) -> Option<&serde_json::Value> {
        self.items.get(key)
    }
}

/// Turns successive data snapshots into change sets by a stable identity key.
#[derive(Debug)]
pub struct KeyedData {
    key_path: FieldPath,
    order: Vec<NodeKey>,
    items: BTreeMap<NodeKey, serde_json::Value>,
    frame: Option<NodeFrame>,
}

impl KeyedData {
    pub fn new(key_path: &str) -> ApertureResult<Self> {
        Ok(Self {
            key_path: FieldPath::parse(key_path)?,
            order: Vec::new(),
            items: BTreeMap::new(),
            frame: None,
        })
    }

    pub fn key_of(&self, item: &serde_json::Value) -> ApertureResult<NodeKey> {
        match self.key_path.resolve(item, &[])? {
            Value::Text(s) => Ok(NodeKey(s)),
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                Ok(NodeKey(format!("{}", n as i64)))
            }
            other => Err(ApertureError::evaluation(format!(
                "identity key '{}' must be a string or integer, got '{other}'",
                self.key_path
            ))),
        }
    }

    /// Diff `items` against the previous snapshot and commit them as the new one.
    ///
    /// New and changed items become updates in input order; keys no longer present become
    /// removals in their previous order. A different `frame` than last time marks every
    /// item as changed.
    pub fn update(&mut self, items: &[serde_json::Value], frame: NodeFrame) -> ApertureResult<ChangeSet> {
        let (changes, snapshot) = self.diff(items, frame)?;
        self.commit(snapshot);
        Ok(changes)
    }

    /// Like [`KeyedData::update`], but leaves the previous snapshot in place until the
    /// returned one is passed to [`KeyedData::commit`].
    pub fn diff(
        &self,
        items: &[serde_json::Value],
        frame: NodeFrame,
    ) -> ApertureResult<(ChangeSet, Snapshot)> {
        let mut next = Snapshot {
            order: Vec::with_capacity(items.len()),
            items: BTreeMap::new(),
            frame,
        };
        for item in items {
            let key = self.key_of(item)?;
            if next.items.insert(key.clone(), item.clone()).is_some() {
                return Err(ApertureError::configuration(format!(
                    "duplicate identity key '{}' in data snapshot",
                    key.as_str()
                )));
            }
            next.order.push(key);
        }

        let frame_changed = self.frame != Some(frame);
        let mut changes = ChangeSet::new();
        for key in &next.order {
            let data = &next.items[key];
            let unchanged = !frame_changed && self.items.get(key) == Some(data);
            if !unchanged {
                changes.push_update(key.clone(), data.clone(), frame);
            }
        }

        let still_present: BTreeSet<&NodeKey> = next.order.iter().collect();
        for key in &self.order {
            if !still_present.contains(key) {
                changes.push_removed(key.clone());
            }
        }
        Ok((changes, next))
    }

    pub fn commit(&mut self, snapshot: Snapshot) {
        self.order = snapshot.order;
        self.items = snapshot.items;
        self.frame = Some(snapshot.frame);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn keys(&self) -> &[NodeKey] {
        &self.order
    }

    pub fn get(&self, key: &NodeKey) -> Option<&serde_json::Value> {
        self.items.get(key)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/keyed.rs"]
mod tests;
