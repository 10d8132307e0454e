//! # VGC
//!
//! Topological vector graphics built from layered libraries:
//!
//! 1. **vgc-core** - Ids, geometry, signals, configuration, undo/redo history
//! 2. **vgc-vacomplex** - The vector algebraic complex and its transactional
//!    operations
//!
//! ## Example
//!
//! ```rust,ignore
//! use vgc::core::History;
//! use vgc::vacomplex::{Complex, Operations};
//!
//! vgc::init_logging()?;
//! let mut complex = Complex::new();
//! let mut history = History::new(100);
//!
//! let group = history.create_undo_group("Add vertex")?;
//! let mut ops = Operations::new(&mut complex)?;
//! let root = ops.root();
//! ops.create_key_vertex(vgc::core::Vec2d::new(1.0, 2.0), root, None)?;
//! let (_diff, edit) = ops.commit_with_undo("Add vertex");
//! history.push_operation(edit)?;
//! history.close_undo_group(group)?;
//!
//! history.undo(&mut complex)?;
//! assert_eq!(complex.num_nodes(), 1);
//! ```

pub use vgc_core as core;
pub use vgc_vacomplex as vacomplex;

pub use vgc_core::{
    ComplexConfig, Error, History, HistoryConfig, Id, Result, Signal, UndoGroupId, UndoOperation,
    Vec2d, VgcConfig,
};
pub use vgc_vacomplex::{Complex, ComplexDiff, ComplexEdit, Operations, VacError, VacResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support, INFO by default
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::debug!("VGC {} (built {})", VERSION, BUILD_DATE);
    Ok(())
}
