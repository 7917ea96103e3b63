//! Piece instances and the arena that owns them
//!
//! The arena stands in for the host scene: it spawns instances from
//! templates, lets the alignment step move a fresh instance once, and
//! destroys rejected candidates. Handles are never reused, so a destroyed
//! piece's id stays dead for the rest of the run.

use ahash::AHashMap;
use glam::Vec3;
use serde::Serialize;

use crate::catalog::schema::{BoundsDef, ConnectorSlot, PieceTemplate};
use crate::core::error::{DungeonError, Result};
use crate::core::types::{ConnectorRef, PieceId, PieceRole, Pose, TemplateId};
use crate::spatial::OrientedBox;

/// World-space view of one connector on a placed piece
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connector {
    pub id: ConnectorRef,
    pub name: String,
    pub position: Vec3,
    /// Unit forward direction
    pub forward: Vec3,
    /// Position relative to the owning piece's root
    pub local_position: Vec3,
    /// Forward relative to the owning piece's root
    pub local_forward: Vec3,
}

/// A piece spawned from a template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieceInstance {
    pub id: PieceId,
    pub template_id: TemplateId,
    pub template_name: String,
    pub role: PieceRole,
    /// Display label ("spawn", "piece_3", "closing_wall", ...)
    pub label: String,
    /// Organizational parent; has no effect on placement
    pub container: Option<String>,
    pub pose: Pose,
    pub bounds: Option<BoundsDef>,
    /// Set once the piece is part of the layout; its pose is then frozen
    pub finalized: bool,
    #[serde(skip)]
    slots: Vec<ConnectorSlot>,
}

impl PieceInstance {
    fn view(&self, slot: &ConnectorSlot) -> Connector {
        Connector {
            id: ConnectorRef::new(self.id, slot.index),
            name: slot.name.clone(),
            position: self.pose.transform_point(slot.position),
            forward: self.pose.transform_direction(slot.forward),
            local_position: slot.position,
            local_forward: slot.forward,
        }
    }

    /// All connectors in scan order
    pub fn connectors(&self) -> Vec<Connector> {
        self.slots.iter().map(|slot| self.view(slot)).collect()
    }

    /// First connector in scan order, used as the entry when attaching
    pub fn first_connector(&self) -> Option<Connector> {
        self.slots.first().map(|slot| self.view(slot))
    }

    pub fn connector(&self, slot: usize) -> Option<Connector> {
        self.slots.get(slot).map(|s| self.view(s))
    }

    pub fn connector_count(&self) -> usize {
        self.slots.len()
    }

    /// Full-size bounding box in world space
    pub fn world_bounds(&self) -> Option<OrientedBox> {
        self.bounds
            .map(|b| OrientedBox::from_local(b.center(), b.half_extents(), &self.pose))
    }
}

/// Owner of every piece instance in one generation run
#[derive(Debug, Default)]
pub struct PieceArena {
    instances: AHashMap<PieceId, PieceInstance>,
    next_id: u64,
}

impl PieceArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an instance of `template` at a provisional pose
    pub fn spawn(
        &mut self,
        template_id: TemplateId,
        template: &PieceTemplate,
        pose: Pose,
        label: impl Into<String>,
    ) -> PieceId {
        self.next_id += 1;
        let id = PieceId(self.next_id);

        self.instances.insert(
            id,
            PieceInstance {
                id,
                template_id,
                template_name: template.name().to_string(),
                role: template.role(),
                label: label.into(),
                container: None,
                pose,
                bounds: template.bounds,
                finalized: false,
                slots: template.connector_slots(),
            },
        );
        id
    }

    /// Discard a provisional instance and all of its connectors
    pub fn destroy(&mut self, id: PieceId) -> Result<PieceInstance> {
        if self.require(id)?.finalized {
            return Err(DungeonError::PieceFinalized(id));
        }
        self.instances
            .remove(&id)
            .ok_or(DungeonError::PieceNotFound(id))
    }

    /// Move a provisional instance to its final pose
    pub fn set_pose(&mut self, id: PieceId, pose: Pose) -> Result<()> {
        let instance = self.get_mut(id)?;
        if instance.finalized {
            return Err(DungeonError::PieceFinalized(id));
        }
        instance.pose = pose;
        Ok(())
    }

    /// Freeze an instance as part of the layout
    pub fn finalize(&mut self, id: PieceId, label: impl Into<String>) -> Result<()> {
        let instance = self.get_mut(id)?;
        instance.finalized = true;
        instance.label = label.into();
        Ok(())
    }

    pub fn reparent(&mut self, id: PieceId, container: &str) -> Result<()> {
        self.get_mut(id)?.container = Some(container.to_string());
        Ok(())
    }

    pub fn get(&self, id: PieceId) -> Option<&PieceInstance> {
        self.instances.get(&id)
    }

    pub fn require(&self, id: PieceId) -> Result<&PieceInstance> {
        self.get(id).ok_or(DungeonError::PieceNotFound(id))
    }

    fn get_mut(&mut self, id: PieceId) -> Result<&mut PieceInstance> {
        self.instances
            .get_mut(&id)
            .ok_or(DungeonError::PieceNotFound(id))
    }

    /// Remove every instance; handles issued so far stay invalid
    pub fn clear(&mut self) {
        self.instances.clear();
    }

    /// Remove an instance regardless of state, handing it to the caller
    pub fn take(&mut self, id: PieceId) -> Option<PieceInstance> {
        self.instances.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin::corridor_straight;
    use glam::Quat;

    #[test]
    fn test_spawn_exposes_connectors() {
        let mut arena = PieceArena::new();
        let id = arena.spawn(TemplateId(0), &corridor_straight(), Pose::IDENTITY, "spawn");
        let piece = arena.get(id).unwrap();

        assert_eq!(piece.connector_count(), 2);
        let connectors = piece.connectors();
        assert_eq!(connectors[0].id, ConnectorRef::new(id, 0));
        assert_eq!(connectors[1].id, ConnectorRef::new(id, 1));
        assert_eq!(piece.first_connector(), Some(connectors[0].clone()));
    }

    #[test]
    fn test_connectors_follow_pose() {
        let mut arena = PieceArena::new();
        let id = arena.spawn(TemplateId(0), &corridor_straight(), Pose::IDENTITY, "c");
        let pose = Pose::new(
            Vec3::new(5.0, 0.0, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        arena.set_pose(id, pose).unwrap();

        let far = arena.get(id).unwrap().connector(1).unwrap();
        assert!((far.position - Vec3::new(15.0, 0.0, 0.0)).length() < 1e-4);
        assert!((far.forward - Vec3::X).length() < 1e-5);
        assert!((far.local_forward - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_ids_never_reused() {
        let mut arena = PieceArena::new();
        let a = arena.spawn(TemplateId(0), &corridor_straight(), Pose::IDENTITY, "a");
        arena.destroy(a).unwrap();
        let b = arena.spawn(TemplateId(0), &corridor_straight(), Pose::IDENTITY, "b");

        assert_ne!(a, b);
        assert!(arena.get(a).is_none());
        assert!(matches!(arena.destroy(a), Err(DungeonError::PieceNotFound(_))));
        assert_eq!(arena.len(), 1);

        arena.clear();
        assert!(arena.is_empty());
        let c = arena.spawn(TemplateId(0), &corridor_straight(), Pose::IDENTITY, "c");
        assert!(c > b);
        assert!(arena.get(b).is_none());
    }

    #[test]
    fn test_finalized_piece_is_frozen() {
        let mut arena = PieceArena::new();
        let id = arena.spawn(TemplateId(0), &corridor_straight(), Pose::IDENTITY, "x");
        arena.finalize(id, "piece_1").unwrap();

        assert_eq!(arena.get(id).unwrap().label, "piece_1");
        assert!(matches!(
            arena.set_pose(id, Pose::IDENTITY),
            Err(DungeonError::PieceFinalized(_))
        ));
        assert!(matches!(arena.destroy(id), Err(DungeonError::PieceFinalized(_))));
    }

    #[test]
    fn test_reparent() {
        let mut arena = PieceArena::new();
        let id = arena.spawn(TemplateId(0), &corridor_straight(), Pose::IDENTITY, "x");
        arena.reparent(id, "dungeon").unwrap();
        assert_eq!(arena.get(id).unwrap().container.as_deref(), Some("dungeon"));
        assert!(arena.reparent(PieceId(99), "dungeon").is_err());
    }

    #[test]
    fn test_world_bounds_follow_pose() {
        let mut arena = PieceArena::new();
        let id = arena.spawn(
            TemplateId(0),
            &corridor_straight(),
            Pose::at(Vec3::new(0.0, -1000.0, 0.0)),
            "x",
        );
        let bounds = arena.get(id).unwrap().world_bounds().unwrap();
        assert!((bounds.center - Vec3::new(0.0, -998.5, 5.0)).length() < 1e-3);
    }
}
