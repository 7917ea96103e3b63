//! Alignment of a candidate piece onto a target connector
//!
//! Pieces only ever turn about the vertical axis, so every placed piece
//! stays level no matter how its connectors are authored.

use glam::{Quat, Vec3};

use super::arena::Connector;
use crate::core::types::Pose;

/// Horizontal vectors shorter than this have no usable heading
const MIN_HEADING: f32 = 1e-6;

/// Signed angle about +Y that turns `from` onto `to`, in radians
///
/// Only the horizontal components matter. The result lies in (-PI, PI]; a
/// vector with no horizontal heading yields zero.
pub fn signed_angle_about_y(from: Vec3, to: Vec3) -> f32 {
    let (ax, az) = (from.x, from.z);
    let (bx, bz) = (to.x, to.z);
    if ax * ax + az * az < MIN_HEADING || bx * bx + bz * bz < MIN_HEADING {
        return 0.0;
    }

    // Quat::from_rotation_y(t) takes +Z to (sin t, 0, cos t)
    let cross = az * bx - ax * bz;
    let dot = ax * bx + az * bz;
    cross.atan2(dot)
}

/// Root pose that puts `entry` on `target`, facing it head-to-head
///
/// The entry connector is taken in its piece's local frame, so whatever
/// provisional pose the candidate was spawned at is irrelevant. The result
/// turns the piece about +Y until the entry faces opposite the target, then
/// translates it so the two connector positions coincide.
pub fn compute_pose(entry: &Connector, target: &Connector) -> Pose {
    let yaw = signed_angle_about_y(entry.local_forward, -target.forward);
    let rotation = Quat::from_rotation_y(yaw);
    let position = target.position - rotation * entry.local_position;
    Pose::new(position, rotation)
}
