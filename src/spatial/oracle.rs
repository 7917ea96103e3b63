//! Collision oracle for candidate placements

use super::broadphase::SpatialIndex;
use super::volume::OrientedBox;
use crate::layout::arena::PieceInstance;

/// Decides whether a candidate piece overlaps already placed geometry
#[derive(Debug, Clone, Copy)]
pub struct CollisionOracle {
    /// Fraction the candidate's box is shrunk by before querying
    margin: f32,
}

impl CollisionOracle {
    pub fn new(margin: f32) -> Self {
        Self { margin }
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// The volume actually tested for `candidate`, if it has bounds
    pub fn test_volume(&self, candidate: &PieceInstance) -> Option<OrientedBox> {
        candidate.world_bounds().map(|b| b.shrunk(self.margin))
    }

    /// True if the candidate intersects any committed piece other than itself
    ///
    /// A candidate without bounds never collides. That is a hole in the
    /// guarantee, not a proof of fit, so it is logged.
    pub fn overlaps<I: SpatialIndex + ?Sized>(&self, candidate: &PieceInstance, index: &I) -> bool {
        let Some(volume) = self.test_volume(candidate) else {
            tracing::debug!(
                "Piece {:?} ({}) has no bounds; skipping overlap test",
                candidate.id,
                candidate.template_name
            );
            return false;
        };

        index.query(&volume).into_iter().any(|hit| hit != candidate.id)
    }
}

impl Default for CollisionOracle {
    fn default() -> Self {
        Self::new(0.05)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin::{corridor_straight, room_small};
    use crate::catalog::schema::PieceTemplate;
    use crate::core::types::{PieceId, PieceRole, Pose, TemplateId};
    use crate::layout::arena::PieceArena;
    use crate::spatial::broadphase::BroadphaseGrid;
    use glam::Vec3;

    fn placed(
        arena: &mut PieceArena,
        grid: &mut BroadphaseGrid,
        template: &PieceTemplate,
        at: Vec3,
    ) -> PieceId {
        let id = arena.spawn(TemplateId(0), template, Pose::at(at), "p");
        let bounds = arena.get(id).unwrap().world_bounds().unwrap();
        grid.insert(id, bounds);
        grid.commit();
        id
    }

    #[test]
    fn test_abutting_piece_does_not_collide() {
        let mut arena = PieceArena::new();
        let mut grid = BroadphaseGrid::new(10.0);
        placed(&mut arena, &mut grid, &corridor_straight(), Vec3::ZERO);

        // Starts exactly where the first corridor ends
        let at = Pose::at(Vec3::new(0.0, 0.0, 10.0));
        let next = arena.spawn(TemplateId(0), &corridor_straight(), at, "n");
        let oracle = CollisionOracle::default();
        assert!(!oracle.overlaps(arena.get(next).unwrap(), &grid));
    }

    #[test]
    fn test_overlapping_piece_collides() {
        let mut arena = PieceArena::new();
        let mut grid = BroadphaseGrid::new(10.0);
        placed(&mut arena, &mut grid, &corridor_straight(), Vec3::ZERO);

        let at = Pose::at(Vec3::new(0.0, 0.0, 5.0));
        let next = arena.spawn(TemplateId(0), &room_small(), at, "n");
        let oracle = CollisionOracle::default();
        assert!(oracle.overlaps(arena.get(next).unwrap(), &grid));
    }

    #[test]
    fn test_ignores_own_volume() {
        let mut arena = PieceArena::new();
        let mut grid = BroadphaseGrid::new(10.0);
        let id = placed(&mut arena, &mut grid, &corridor_straight(), Vec3::ZERO);

        let oracle = CollisionOracle::default();
        assert!(!oracle.overlaps(arena.get(id).unwrap(), &grid));
    }

    #[test]
    fn test_boundless_candidate_never_collides() {
        let mut arena = PieceArena::new();
        let mut grid = BroadphaseGrid::new(10.0);
        placed(&mut arena, &mut grid, &corridor_straight(), Vec3::ZERO);

        let ghost = PieceTemplate::new("ghost", PieceRole::Room);
        let id = arena.spawn(TemplateId(1), &ghost, Pose::IDENTITY, "g");
        let oracle = CollisionOracle::default();
        assert!(oracle.test_volume(arena.get(id).unwrap()).is_none());
        assert!(!oracle.overlaps(arena.get(id).unwrap(), &grid));
    }

    #[test]
    fn test_margin_shrinks_tested_volume() {
        let mut arena = PieceArena::new();
        let id = arena.spawn(TemplateId(0), &corridor_straight(), Pose::IDENTITY, "c");
        let piece = arena.get(id).unwrap();

        let oracle = CollisionOracle::new(0.1);
        assert_eq!(oracle.margin(), 0.1);
        let full = piece.world_bounds().unwrap();
        let tested = oracle.test_volume(piece).unwrap();
        assert!((tested.half_extents - full.half_extents * 0.9).length() < 1e-5);
        assert_eq!(CollisionOracle::default().margin(), 0.05);
    }
}
