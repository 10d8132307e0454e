//! Change records produced by one transaction on a complex.

use crate::node::NodeKind;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use vgc_core::Id;

bitflags! {
    /// What changed on a modified node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct NodeModificationFlags: u32 {
        const REPARENTED = 1 << 0;
        const CHILDREN_CHANGED = 1 << 1;
        const BOUNDARY_CHANGED = 1 << 2;
        const STAR_CHANGED = 1 << 3;
        const GEOMETRY_CHANGED = 1 << 4;
        /// The geometry of a boundary cell changed.
        const BOUNDARY_GEOMETRY_CHANGED = 1 << 5;
        const PROPERTIES_CHANGED = 1 << 6;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedNodeInfo {
    pub id: Id,
    pub kind: NodeKind,
    /// Name of the operation that created the node.
    pub source_operation: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifiedNodeInfo {
    pub id: Id,
    pub flags: NodeModificationFlags,
    pub modified_properties: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeInsertionType {
    BeforeSibling,
    LastChild,
}

/// One entry of the chronological insertion log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeInsertionInfo {
    pub id: Id,
    pub new_parent: Id,
    pub new_next_sibling: Option<Id>,
    pub insertion_type: NodeInsertionType,
}

/// Accumulated changes of one or more transactions.
///
/// `created`, `destroyed` and `transient` are disjoint: a node created and
/// destroyed within the recorded span is only listed as transient. Modified
/// entries never refer to created, destroyed or transient nodes. The
/// insertion log is chronological and uncompressed, so it still mentions
/// transient nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplexDiff {
    created: Vec<CreatedNodeInfo>,
    destroyed: Vec<Id>,
    transient: Vec<Id>,
    modified: Vec<ModifiedNodeInfo>,
    insertions: Vec<NodeInsertionInfo>,
}

impl ComplexDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.destroyed.is_empty()
            && self.transient.is_empty()
            && self.modified.is_empty()
            && self.insertions.is_empty()
    }

    pub fn created_nodes(&self) -> &[CreatedNodeInfo] {
        &self.created
    }

    pub fn destroyed_nodes(&self) -> &[Id] {
        &self.destroyed
    }

    pub fn transient_nodes(&self) -> &[Id] {
        &self.transient
    }

    pub fn modified_nodes(&self) -> &[ModifiedNodeInfo] {
        &self.modified
    }

    pub fn insertions(&self) -> &[NodeInsertionInfo] {
        &self.insertions
    }

    pub fn was_created(&self, id: Id) -> bool {
        self.created.iter().any(|c| c.id == id)
    }

    pub fn was_destroyed(&self, id: Id) -> bool {
        self.destroyed.contains(&id)
    }

    pub fn is_transient(&self, id: Id) -> bool {
        self.transient.contains(&id)
    }

    pub fn modification_flags(&self, id: Id) -> Option<NodeModificationFlags> {
        self.modified.iter().find(|m| m.id == id).map(|m| m.flags)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn on_node_created(&mut self, id: Id, kind: NodeKind, source_operation: &'static str) {
        self.created.push(CreatedNodeInfo {
            id,
            kind,
            source_operation,
        });
    }

    pub(crate) fn on_node_destroyed(&mut self, id: Id) {
        if let Some(i) = self.created.iter().position(|c| c.id == id) {
            self.created.remove(i);
            self.transient.push(id);
        } else if !self.destroyed.contains(&id) {
            self.destroyed.push(id);
        }
        self.modified.retain(|m| m.id != id);
    }

    pub(crate) fn on_node_modified(
        &mut self,
        id: Id,
        flags: NodeModificationFlags,
        property: Option<&str>,
    ) {
        if let Some(entry) = self.modified.iter_mut().find(|m| m.id == id) {
            entry.flags |= flags;
            if let Some(name) = property {
                entry.modified_properties.insert(name.to_string());
            }
            return;
        }
        self.modified.push(ModifiedNodeInfo {
            id,
            flags,
            modified_properties: property.map(str::to_string).into_iter().collect(),
        });
    }

    pub(crate) fn on_node_inserted(
        &mut self,
        id: Id,
        new_parent: Id,
        new_next_sibling: Option<Id>,
    ) {
        let insertion_type = if new_next_sibling.is_some() {
            NodeInsertionType::BeforeSibling
        } else {
            NodeInsertionType::LastChild
        };
        self.insertions.push(NodeInsertionInfo {
            id,
            new_parent,
            new_next_sibling,
            insertion_type,
        });
    }

    /// Drops modified entries that refer to created or destroyed nodes.
    pub(crate) fn finalize(&mut self) {
        let excluded: HashSet<Id> = self
            .created
            .iter()
            .map(|c| c.id)
            .chain(self.destroyed.iter().copied())
            .chain(self.transient.iter().copied())
            .collect();
        self.modified.retain(|m| !excluded.contains(&m.id));
    }

    /// Appends a later diff to this one.
    pub fn merge(&mut self, other: ComplexDiff) {
        let mut created_index: HashMap<Id, usize> = self
            .created
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, i))
            .collect();
        for info in other.created {
            created_index.insert(info.id, self.created.len());
            self.created.push(info);
        }
        for id in other.destroyed {
            if created_index.remove(&id).is_some() {
                self.created.retain(|c| c.id != id);
                self.transient.push(id);
            } else if !self.destroyed.contains(&id) {
                self.destroyed.push(id);
            }
        }
        self.transient.extend(other.transient);
        for info in other.modified {
            if let Some(entry) = self.modified.iter_mut().find(|m| m.id == info.id) {
                entry.flags |= info.flags;
                entry.modified_properties.extend(info.modified_properties);
            } else {
                self.modified.push(info);
            }
        }
        self.insertions.extend(other.insertions);
        self.finalize();
    }
}
