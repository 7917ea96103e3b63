//! Dungeon Assembler - modular dungeon layouts from connector-tagged pieces
//!
//! A layout grows outward from a seed piece. Each open connector gets a
//! room or corridor aligned onto it, kept only if it overlaps nothing
//! already placed; anything that cannot be extended is plugged with a
//! closing wall.

pub mod catalog;
pub mod core;
pub mod layout;
pub mod spatial;
