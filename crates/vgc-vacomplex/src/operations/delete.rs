//! Deletion.

use super::Operations;
use crate::error::{VacError, VacResult};
use crate::node::{Node, NodeData};
use std::collections::HashSet;
use vgc_core::Id;

impl Operations<'_> {
    /// Destroys `nodes` and everything depending on them.
    ///
    /// Groups take their descendants with them, cells take every cell
    /// reachable through their star. Deleting the root deletes its content
    /// but keeps the root itself. Unknown and duplicate ids are ignored.
    ///
    /// With `delete_isolated_vertices`, vertices whose star becomes empty
    /// because of the deletion are destroyed too, including key vertices
    /// isolated by the deletion of such a vertex.
    pub fn hard_delete(&mut self, nodes: &[Id], delete_isolated_vertices: bool) -> VacResult<()> {
        self.run("hard_delete", |ops| ops.hard_delete_(nodes, delete_isolated_vertices))
    }

    /// Deletion that keeps dependent cells alive by approximating the
    /// geometry they lose. Not supported.
    pub fn soft_delete(&mut self, nodes: &[Id]) -> VacResult<()> {
        tracing::warn!("soft_delete requested for {} nodes", nodes.len());
        Err(VacError::NotImplemented("soft_delete"))
    }

    pub(crate) fn hard_delete_(&mut self, nodes: &[Id], delete_isolated_vertices: bool) -> VacResult<()> {
        let root = self.root();
        let mut dying = Vec::new();
        let mut flagged = HashSet::new();
        for id in nodes {
            if !self.complex.contains(*id) {
                tracing::debug!("Ignoring deletion of unknown node {}", id);
                continue;
            }
            if *id == root {
                for child in self.complex.children(root) {
                    self.collect_dependent_nodes(child, &mut dying, &mut flagged);
                }
            } else {
                self.collect_dependent_nodes(*id, &mut dying, &mut flagged);
            }
        }
        if delete_isolated_vertices {
            self.collect_isolated_vertices(&mut dying, &mut flagged);
        }
        if dying.is_empty() {
            return Ok(());
        }

        for id in &dying {
            let Some(cell) = self.complex.cell(*id) else {
                continue;
            };
            let survivors: Vec<Id> = cell
                .boundary
                .iter()
                .copied()
                .filter(|b| !flagged.contains(b))
                .collect();
            for b in survivors {
                self.remove_from_star(b, *id)?;
            }
        }

        for id in &dying {
            let parent_dies = self
                .complex
                .node(*id)
                .and_then(Node::parent)
                .is_some_and(|p| flagged.contains(&p));
            self.destroy_node(*id, !parent_dies);
        }
        tracing::debug!("Hard deleted {} nodes", dying.len());
        Ok(())
    }

    /// Adds `start` and everything depending on it to the dying set.
    fn collect_dependent_nodes(&self, start: Id, dying: &mut Vec<Id>, flagged: &mut HashSet<Id>) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !flagged.insert(id) {
                continue;
            }
            dying.push(id);
            match self.complex.node(id).map(|n| &n.data) {
                Some(NodeData::Group(_)) => stack.extend(self.complex.children(id)),
                Some(NodeData::Cell(cell)) => stack.extend(cell.star.iter().copied()),
                None => {}
            }
        }
    }

    /// Flags vertices left without any surviving star cell.
    ///
    /// Newly flagged vertices are examined in turn, so a key vertex only
    /// used by a dying inbetween vertex is caught whatever the order.
    fn collect_isolated_vertices(&self, dying: &mut Vec<Id>, flagged: &mut HashSet<Id>) {
        let mut queue = dying.clone();
        while let Some(id) = queue.pop() {
            let Some(cell) = self.complex.cell(id) else {
                continue;
            };
            for b in &cell.boundary {
                if flagged.contains(b) {
                    continue;
                }
                let Some(bounding) = self.complex.cell(*b) else {
                    continue;
                };
                if bounding.kind().is_vertex() && bounding.star.iter().all(|s| flagged.contains(s)) {
                    flagged.insert(*b);
                    dying.push(*b);
                    queue.push(*b);
                }
            }
        }
    }
}
