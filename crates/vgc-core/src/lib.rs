//! # VGC Core
//!
//! Core types, traits, and utilities shared by the VGC libraries.
//! Provides the fundamental abstractions the topological engine is built on:
//!
//! - **Ids**: stable 64-bit identifiers and per-owner generators
//! - **Geometry**: 2D vectors, rectangles, and polyline helpers
//! - **Signals**: synchronous observer lists used for change notification
//! - **Configuration**: serde/TOML backed settings with validation
//! - **History**: a branching undo/redo tree with amend and pruning
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vgc_core::{ClosureOperation, History};
//!
//! let mut counter = 0i32;
//! let mut history = History::new(10);
//! let group = history.create_undo_group("Increment")?;
//! counter += 1;
//! history.push_operation(ClosureOperation::new(
//!     "add one",
//!     |c: &mut i32| *c -= 1,
//!     |c: &mut i32| *c += 1,
//! ))?;
//! history.close_undo_group(group)?;
//! history.undo(&mut counter)?;
//! assert_eq!(counter, 0);
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod history;
pub mod id;
pub mod signal;

pub use config::{ComplexConfig, HistoryConfig, VgcConfig};
pub use error::{ConfigError, Error, HistoryError, Result};
pub use geometry::{Rect2d, Vec2d};
pub use history::{ClosureOperation, History, UndoGroup, UndoGroupId, UndoOperation};
pub use id::{Id, IdGenerator};
pub use signal::{ConnectionId, Signal};
