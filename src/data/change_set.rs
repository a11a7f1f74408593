use std::collections::BTreeSet;

use crate::animation::transition::Transition;
use crate::foundation::core::{NodeFrame, NodeKey};
use crate::foundation::error::{ApertureError, ApertureResult};

/// An added or changed data item.
#[derive(Clone, Debug)]
pub struct NodeUpdate {
    pub key: NodeKey,
    pub data: serde_json::Value,
    /// Position/size context the item is drawn into.
    pub frame: NodeFrame,
}

/// One render pass worth of data changes.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    pub updates: Vec<NodeUpdate>,
    pub removed: Vec<NodeKey>,
    /// Applied uniformly to every attribute mutation of the pass.
    pub transition: Option<Transition>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(mut self, key: impl Into<NodeKey>, data: serde_json::Value, frame: NodeFrame) -> Self {
        self.push_update(key, data, frame);
        self
    }

    pub fn remove(mut self, key: impl Into<NodeKey>) -> Self {
        self.push_removed(key);
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }

    pub fn push_update(&mut self, key: impl Into<NodeKey>, data: serde_json::Value, frame: NodeFrame) {
        self.updates.push(NodeUpdate {
            key: key.into(),
            data,
            frame,
        });
    }

    pub fn push_removed(&mut self, key: impl Into<NodeKey>) {
        self.removed.push(key.into());
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.removed.is_empty()
    }

    /// Every key must appear at most once across updates and removals.
    pub fn validate(&self) -> ApertureResult<()> {
        let mut seen = BTreeSet::new();
        let keys = self
            .updates
            .iter()
            .map(|u| &u.key)
            .chain(self.removed.iter());
        for key in keys {
            if !seen.insert(key) {
                return Err(ApertureError::configuration(format!(
                    "node '{}' appears more than once in a change set",
                    key.as_str()
                )));
            }
        }
        Ok(())
    }
}
