//! Spatial queries: oriented volumes, the broadphase index and the
//! collision oracle built on top of them

pub mod broadphase;
pub mod oracle;
pub mod volume;

pub use broadphase::{BroadphaseGrid, SpatialIndex};
pub use oracle::CollisionOracle;
pub use volume::OrientedBox;
