//! Geometry and tree edits that keep the topology unchanged.

use super::Operations;
use crate::diff::NodeModificationFlags;
use crate::error::{VacError, VacResult};
use crate::node::{CellData, NodeKind};
use crate::stroke::StrokeGeometry;
use vgc_core::{Id, Vec2d};

impl Operations<'_> {
    /// Moves a key vertex. Incident open edges are snapped to the new
    /// position, and every dependent cell is flagged.
    pub fn set_key_vertex_position(&mut self, vertex: Id, position: Vec2d) -> VacResult<()> {
        self.run("set_key_vertex_position", |ops| {
            if ops.key_vertex_position(vertex)? == position {
                return Ok(());
            }
            if let CellData::KeyVertex(data) = &mut ops.cell_mut(vertex)?.data {
                data.position = position;
            }
            ops.on_property_modified(vertex, NodeModificationFlags::GEOMETRY_CHANGED, "position");
            for s in ops.cell(vertex)?.star.to_vec() {
                if ops.kind(s)? == NodeKind::KeyEdge {
                    ops.snap_key_edge(s)?;
                    ops.notify_boundary_geometry_changed(s)?;
                }
                ops.on_node_modified(s, NodeModificationFlags::BOUNDARY_GEOMETRY_CHANGED);
            }
            Ok(())
        })
    }

    /// Replaces the stroke of an edge. The stroke must be closed exactly
    /// when the edge is, and is snapped to the end vertices.
    pub fn set_key_edge_geometry(&mut self, edge: Id, mut stroke: Box<dyn StrokeGeometry>) -> VacResult<()> {
        self.run("set_key_edge_geometry", |ops| {
            let data = ops.key_edge(edge)?;
            if data.is_closed() != stroke.is_closed() {
                return Err(VacError::InvalidInput(format!(
                    "stroke closedness does not match edge {edge}"
                )));
            }
            if let (Some(start), Some(end)) = (data.start, data.end) {
                stroke.snap(ops.key_vertex_position(start)?, ops.key_vertex_position(end)?);
            }
            ops.key_edge_mut(edge)?.stroke = stroke;
            ops.on_property_modified(edge, NodeModificationFlags::GEOMETRY_CHANGED, "geometry");
            ops.notify_boundary_geometry_changed(edge)
        })
    }

    /// Reparents a node under `group`, before `next_sibling` or last.
    pub fn move_to_group(&mut self, node: Id, group: Id, next_sibling: Option<Id>) -> VacResult<()> {
        self.run("move_to_group", |ops| {
            if node == ops.root() {
                return Err(VacError::InvalidInput("the root group cannot be moved".to_string()));
            }
            ops.expect_group(group)?;
            if ops.complex.is_descendant(group, node) {
                return Err(VacError::CyclicMove { node, group });
            }
            ops.move_node(node, group, next_sibling)
        })
    }

    fn notify_boundary_geometry_changed(&mut self, cell: Id) -> VacResult<()> {
        for s in self.cell(cell)?.star.to_vec() {
            self.on_node_modified(s, NodeModificationFlags::BOUNDARY_GEOMETRY_CHANGED);
        }
        Ok(())
    }
}
