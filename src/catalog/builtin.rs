//! Built-in demo pieces
//!
//! A small catalog good enough to grow a real layout without any files on
//! disk. Mirrors the templates shipped under `data/pieces/`.

use super::registry::PieceCatalog;
use super::schema::{NodeDef, PieceTemplate};
use crate::core::types::PieceRole;

const WALL_HEIGHT: f32 = 3.0;

/// A wall node at `position` turned `yaw` degrees, optionally holding a doorway
fn wall(name: &str, position: [f32; 3], yaw: f32, doorway: bool) -> NodeDef {
    let node = NodeDef::new(name).at(position).yawed(yaw);
    if doorway {
        // Doorways sit on the floor plane, below the wall's center
        node.with_child(NodeDef::connector(
            format!("{}_door", name),
            [0.0, -position[1], 0.0],
            0.0,
        ))
    } else {
        node
    }
}

pub fn corridor_straight() -> PieceTemplate {
    let h = WALL_HEIGHT / 2.0;
    PieceTemplate::new("corridor_straight", PieceRole::Corridor)
        .with_bounds([0.0, h, 5.0], [4.0, WALL_HEIGHT, 10.0])
        .with_node(NodeDef::new("floor").at([0.0, 0.0, 5.0]))
        .with_node(wall("wall_south", [0.0, h, 0.0], 180.0, true))
        .with_node(wall("wall_north", [0.0, h, 10.0], 0.0, true))
        .with_node(wall("wall_east", [2.0, h, 5.0], 90.0, false))
        .with_node(wall("wall_west", [-2.0, h, 5.0], -90.0, false))
}

pub fn corridor_corner() -> PieceTemplate {
    let h = WALL_HEIGHT / 2.0;
    PieceTemplate::new("corridor_corner", PieceRole::Corridor)
        .with_bounds([0.0, h, 2.0], [4.0, WALL_HEIGHT, 4.0])
        .with_node(NodeDef::new("floor").at([0.0, 0.0, 2.0]))
        .with_node(wall("wall_south", [0.0, h, 0.0], 180.0, true))
        .with_node(wall("wall_east", [2.0, h, 2.0], 90.0, true))
        .with_node(wall("wall_north", [0.0, h, 4.0], 0.0, false))
        .with_node(wall("wall_west", [-2.0, h, 2.0], -90.0, false))
}

pub fn room_small() -> PieceTemplate {
    let h = WALL_HEIGHT / 2.0;
    PieceTemplate::new("room_small", PieceRole::Room)
        .with_bounds([0.0, h, 4.0], [8.0, WALL_HEIGHT, 8.0])
        .with_node(NodeDef::new("floor").at([0.0, 0.0, 4.0]))
        .with_node(wall("wall_south", [0.0, h, 0.0], 180.0, true))
        .with_node(wall("wall_north", [0.0, h, 8.0], 0.0, true))
        .with_node(wall("wall_east", [4.0, h, 4.0], 90.0, true))
        .with_node(wall("wall_west", [-4.0, h, 4.0], -90.0, false))
}

pub fn room_vault() -> PieceTemplate {
    let h = WALL_HEIGHT / 2.0;
    PieceTemplate::new("room_vault", PieceRole::Room)
        .with_bounds([0.0, h, 6.0], [12.0, WALL_HEIGHT, 12.0])
        .with_node(NodeDef::new("floor").at([0.0, 0.0, 6.0]))
        .with_node(wall("wall_south", [0.0, h, 0.0], 180.0, true))
        .with_node(wall("wall_north", [0.0, h, 12.0], 0.0, false))
        .with_node(wall("wall_east", [6.0, h, 6.0], 90.0, false))
        .with_node(wall("wall_west", [-6.0, h, 6.0], -90.0, false))
}

/// Thin slab that plugs a doorway; its body sits on the inner side
pub fn closing_wall() -> PieceTemplate {
    let h = WALL_HEIGHT / 2.0;
    PieceTemplate::new("closing_wall", PieceRole::ClosingWall)
        .with_bounds([0.0, h, 0.1], [4.0, WALL_HEIGHT, 0.2])
        .with_node(wall("slab", [0.0, h, 0.0], 0.0, true))
}

/// Catalog holding every built-in piece
pub fn demo_catalog() -> PieceCatalog {
    let mut catalog = PieceCatalog::new();
    catalog.register(corridor_straight());
    catalog.register(corridor_corner());
    catalog.register(room_small());
    catalog.register(room_vault());
    catalog.register(closing_wall());
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::analysis::analyze_template;
    use glam::Vec3;

    #[test]
    fn test_demo_catalog_roles() {
        let catalog = demo_catalog();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.templates_for(PieceRole::Corridor).len(), 2);
        assert_eq!(catalog.templates_for(PieceRole::Room).len(), 2);
        assert_eq!(catalog.templates_for(PieceRole::ClosingWall).len(), 1);
        for (_, template) in catalog.iter() {
            assert!(template.validate().is_empty(), "{}", template.name());
        }
    }

    #[test]
    fn test_straight_corridor_doors_face_outward() {
        let slots = corridor_straight().connector_slots();
        assert_eq!(slots.len(), 2);
        assert!((slots[0].position - Vec3::ZERO).length() < 1e-5);
        assert!((slots[0].forward - Vec3::NEG_Z).length() < 1e-5);
        assert!((slots[1].position - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-5);
        assert!((slots[1].forward - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_room_small_analysis() {
        let analysis = analyze_template(&room_small());
        assert_eq!(analysis.floor.as_deref(), Some("floor"));
        assert_eq!(analysis.doorway_walls.len(), 3);
        assert_eq!(analysis.blind_walls, vec!["wall_west".to_string()]);
    }
}
