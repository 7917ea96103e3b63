//! Layout assembly
//!
//! Piece instances, connector alignment, queue-driven growth with sealing,
//! and the single-shot room expansion.

pub mod align;
pub mod arena;
pub mod expand;
pub mod growth;
pub mod result;

pub use align::{compute_pose, signed_angle_about_y};
pub use arena::{Connector, PieceArena, PieceInstance};
pub use expand::{expand_seed, Expansion};
pub use growth::{generate_layout, GrowthEngine};
pub use result::{Diagnostic, LayoutResult, Link, LinkKind, StopReason, UnsealableReason};
