//! Piece catalog
//!
//! Templates for the modular pieces a layout is assembled from, how they
//! are loaded from TOML, and how connectors are discovered on them.

pub mod analysis;
pub mod builtin;
pub mod registry;
pub mod schema;

pub use analysis::{analyze_template, PieceAnalysis};
pub use registry::PieceCatalog;
pub use schema::{BoundsDef, ConnectorSlot, Marker, NodeDef, PieceMeta, PieceTemplate};
