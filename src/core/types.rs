//! Core type definitions used throughout the codebase

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Handle to a piece instance owned by a [`PieceArena`](crate::layout::PieceArena)
///
/// Handles are never reused within one arena, so a destroyed piece's handle
/// stays invalid for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceId(pub u64);

/// Identifier of a template inside a [`PieceCatalog`](crate::catalog::PieceCatalog)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub u32);

/// A connector slot on a specific piece instance
///
/// `slot` is the index of the connector in the template's scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectorRef {
    pub piece: PieceId,
    pub slot: usize,
}

impl ConnectorRef {
    pub fn new(piece: PieceId, slot: usize) -> Self {
        Self { piece, slot }
    }
}

impl std::fmt::Display for ConnectorRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "piece {}#{}", self.piece.0, self.slot)
    }
}

/// Role a template plays in the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceRole {
    Corridor,
    Room,
    ClosingWall,
}

impl PieceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceRole::Corridor => "corridor",
            PieceRole::Room => "room",
            PieceRole::ClosingWall => "closing_wall",
        }
    }
}

impl std::fmt::Display for PieceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rigid world pose: position plus rotation
///
/// The world is Y-up; a node's forward direction is its local +Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` with no rotation
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Map a point from this pose's local frame into world space
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Rotate a direction from this pose's local frame into world space
    pub fn transform_direction(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }

    /// Rotation about +Y in radians, for display
    pub fn yaw(&self) -> f32 {
        let forward = self.rotation * Vec3::Z;
        forward.x.atan2(forward.z)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_pose_transform_point() {
        let pose = Pose::new(Vec3::new(1.0, 0.0, 0.0), Quat::from_rotation_y(FRAC_PI_2));
        let p = pose.transform_point(Vec3::new(0.0, 0.0, 2.0));
        // +Z rotated a quarter turn about +Y points at +X
        assert!((p - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_pose_yaw() {
        let pose = Pose::new(Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2));
        assert!((pose.yaw() - FRAC_PI_2).abs() < 1e-5);
        assert_eq!(Pose::IDENTITY.yaw(), 0.0);
    }

    #[test]
    fn test_connector_ref_ordering() {
        let a = ConnectorRef::new(PieceId(1), 2);
        let b = ConnectorRef::new(PieceId(2), 0);
        assert!(a < b);
        assert_eq!(a.to_string(), "piece 1#2");
    }

    #[test]
    fn test_role_serde_names() {
        let role: PieceRole = serde_json::from_str("\"closing_wall\"").unwrap();
        assert_eq!(role, PieceRole::ClosingWall);
        assert_eq!(PieceRole::Room.to_string(), "room");
    }
}
