//! Oriented bounding boxes and the separating-axis overlap test

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::types::Pose;

/// Penetration depth below which two face-aligned boxes count as touching
const CONTACT_EPSILON: f32 = 1e-4;

/// Guards the edge-edge axes against near-parallel edges
const PARALLEL_EPSILON: f32 = 1e-6;

/// A box with arbitrary orientation in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub rotation: Quat,
}

impl OrientedBox {
    pub fn new(center: Vec3, half_extents: Vec3, rotation: Quat) -> Self {
        Self {
            center,
            half_extents,
            rotation,
        }
    }

    /// World-space box for a local axis-aligned box carried by `pose`
    pub fn from_local(local_center: Vec3, half_extents: Vec3, pose: &Pose) -> Self {
        Self::new(pose.transform_point(local_center), half_extents, pose.rotation)
    }

    /// The same box with every half extent scaled by `1 - margin`
    pub fn shrunk(&self, margin: f32) -> Self {
        Self {
            half_extents: self.half_extents * (1.0 - margin),
            ..*self
        }
    }

    /// Local X, Y and Z axes in world space
    pub fn axes(&self) -> [Vec3; 3] {
        [
            self.rotation * Vec3::X,
            self.rotation * Vec3::Y,
            self.rotation * Vec3::Z,
        ]
    }

    /// Tight world-aligned bounds as (min, max)
    pub fn aabb(&self) -> (Vec3, Vec3) {
        let [ax, ay, az] = self.axes();
        let h = self.half_extents;
        let extent = ax.abs() * h.x + ay.abs() * h.y + az.abs() * h.z;
        (self.center - extent, self.center + extent)
    }

    /// Separating-axis test against another box
    ///
    /// Boxes whose faces merely touch do not intersect.
    pub fn intersects(&self, other: &OrientedBox) -> bool {
        let a = self.axes();
        let b = other.axes();
        let ea = self.half_extents.to_array();
        let eb = other.half_extents.to_array();

        // Rotation expressing `other` in `self`'s frame
        let mut r = [[0.0f32; 3]; 3];
        let mut abs_r = [[0.0f32; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                r[i][j] = a[i].dot(b[j]);
                abs_r[i][j] = r[i][j].abs() + PARALLEL_EPSILON;
            }
        }

        let d = other.center - self.center;
        let t = [d.dot(a[0]), d.dot(a[1]), d.dot(a[2])];

        // Face axes of self
        for i in 0..3 {
            let ra = ea[i];
            let rb = eb[0] * abs_r[i][0] + eb[1] * abs_r[i][1] + eb[2] * abs_r[i][2];
            if t[i].abs() > ra + rb - CONTACT_EPSILON {
                return false;
            }
        }

        // Face axes of other
        for j in 0..3 {
            let ra = ea[0] * abs_r[0][j] + ea[1] * abs_r[1][j] + ea[2] * abs_r[2][j];
            let rb = eb[j];
            let dist = t[0] * r[0][j] + t[1] * r[1][j] + t[2] * r[2][j];
            if dist.abs() > ra + rb - CONTACT_EPSILON {
                return false;
            }
        }

        // Edge-edge axes a[i] x b[j]
        for i in 0..3 {
            let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
            for j in 0..3 {
                let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                let ra = ea[i1] * abs_r[i2][j] + ea[i2] * abs_r[i1][j];
                let rb = eb[j1] * abs_r[i][j2] + eb[j2] * abs_r[i][j1];
                let dist = t[i2] * r[i1][j] - t[i1] * r[i2][j];
                if dist.abs() > ra + rb {
                    return false;
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    fn unit_box(center: Vec3) -> OrientedBox {
        OrientedBox::new(center, Vec3::splat(1.0), Quat::IDENTITY)
    }

    #[test]
    fn test_overlapping_boxes() {
        assert!(unit_box(Vec3::ZERO).intersects(&unit_box(Vec3::new(1.5, 0.0, 0.0))));
    }

    #[test]
    fn test_separated_boxes() {
        assert!(!unit_box(Vec3::ZERO).intersects(&unit_box(Vec3::new(3.0, 0.0, 0.0))));
    }

    #[test]
    fn test_touching_faces_do_not_intersect() {
        assert!(!unit_box(Vec3::ZERO).intersects(&unit_box(Vec3::new(2.0, 0.0, 0.0))));
    }

    #[test]
    fn test_rotated_box_corner_reaches() {
        // A diamond reaches sqrt(2) along X, so it hits a box 2.3 away
        let diamond = OrientedBox::new(
            Vec3::ZERO,
            Vec3::splat(1.0),
            Quat::from_rotation_y(FRAC_PI_4),
        );
        assert!(diamond.intersects(&unit_box(Vec3::new(2.3, 0.0, 0.0))));
        assert!(!diamond.intersects(&unit_box(Vec3::new(2.5, 0.0, 0.0))));
    }

    #[test]
    fn test_shrunk_separates_shared_plane() {
        let a = OrientedBox::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(2.0, 1.5, 5.0),
            Quat::IDENTITY,
        );
        let b = OrientedBox::new(
            Vec3::new(0.0, 0.0, 15.05),
            Vec3::new(2.0, 1.5, 5.1),
            Quat::IDENTITY,
        );
        assert!(a.intersects(&b));
        assert!(!a.intersects(&b.shrunk(0.05)));
    }

    #[test]
    fn test_aabb_of_rotated_box() {
        let b = OrientedBox::new(
            Vec3::ZERO,
            Vec3::new(2.0, 1.0, 1.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        let (min, max) = b.aabb();
        assert!((max - Vec3::new(1.0, 1.0, 2.0)).length() < 1e-5);
        assert!((min + Vec3::new(1.0, 1.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn test_from_local_uses_pose() {
        let pose = Pose::new(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::from_rotation_y(std::f32::consts::PI),
        );
        let b = OrientedBox::from_local(Vec3::new(0.0, 1.0, 5.0), Vec3::ONE, &pose);
        assert!((b.center - Vec3::new(10.0, 1.0, -5.0)).length() < 1e-4);
    }
}
