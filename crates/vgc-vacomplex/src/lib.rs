//! # VGC Vector Algebraic Complex
//!
//! A cell complex for vector graphics: key vertices, key edges and key faces
//! organized in a tree of groups, with every cell knowing the cells it
//! depends on (its boundary) and the cells depending on it (its star).
//!
//! - **Complex**: the node arena, tree queries, and invariant checks
//! - **Operations**: one atomic edit; create, delete, glue, unglue, cut,
//!   uncut, intersect, and geometry primitives
//! - **Diff**: coalesced per-transaction change records and signals
//! - **Edits**: recorded transactions that plug into [`vgc_core::History`]
//! - **Strokes**: edge geometry models and the segment intersector
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vgc_vacomplex::{Complex, LineStroke, Operations};
//! use vgc_core::Vec2d;
//!
//! let mut complex = Complex::new();
//! let mut ops = Operations::new(&mut complex)?;
//! let root = ops.root();
//! let a = ops.create_key_vertex(Vec2d::new(0.0, 0.0), root, None)?;
//! let b = ops.create_key_vertex(Vec2d::new(10.0, 0.0), root, None)?;
//! let stroke = LineStroke::new(Vec2d::new(0.0, 0.0), Vec2d::new(10.0, 0.0), 1.0);
//! ops.create_key_open_edge(a, b, Box::new(stroke), root, None)?;
//! let (diff, edit) = ops.commit_with_undo("Draw edge");
//! assert_eq!(diff.created_nodes().len(), 3);
//! ```

pub mod complex;
pub mod diff;
pub mod edit;
pub mod error;
pub mod intersector;
pub mod node;
pub mod operations;
pub mod stroke;

pub use complex::{Complex, ComplexSignals, NodeCreated, NodeModified};
pub use diff::{
    ComplexDiff, CreatedNodeInfo, ModifiedNodeInfo, NodeInsertionInfo, NodeInsertionType,
    NodeModificationFlags,
};
pub use edit::{ComplexEdit, NodeSnapshot};
pub use error::{VacError, VacResult};
pub use intersector::{PolylineIntersection, SegmentIntersector};
pub use node::{
    Cell, CellData, GroupData, InbetweenVertexData, KeyCycle, KeyEdgeData, KeyFaceData,
    KeyHalfedge, KeyVertexData, Node, NodeData, NodeKind,
};
pub use operations::{
    CutEdgeResult, CutFaceResult, IntersectResult, OneCycleCutPolicy, Operations,
    TwoCycleCutPolicy, UncutAtKeyEdgeResult, UncutAtKeyVertexResult,
};
pub use stroke::{CurveParameter, LineStroke, PolylineStroke, StrokeGeometry};
