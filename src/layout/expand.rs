//! Single-shot expansion: one room on every connector of a seed piece
//!
//! No queue, no overlap test and no sealing. The rooms' own connectors are
//! left as they are.

use rand::Rng;
use serde::Serialize;

use super::align::compute_pose;
use super::arena::{PieceArena, PieceInstance};
use super::result::{Link, LinkKind};
use crate::catalog::registry::PieceCatalog;
use crate::core::config::GeneratorConfig;
use crate::core::error::{DungeonError, Result};
use crate::core::types::{ConnectorRef, PieceRole, Pose, TemplateId};

const SEED_LABEL: &str = "seed_corridor";
const ROOM_LABEL: &str = "room_annex";

#[derive(Debug, Clone, Serialize)]
pub struct Expansion {
    pub seed: PieceInstance,
    /// Attached rooms in seed connector order
    pub rooms: Vec<PieceInstance>,
    pub links: Vec<Link>,
    /// Seed connectors that got no room
    pub skipped: Vec<ConnectorRef>,
}

/// Place `seed` at the origin and attach a random room to each connector
pub fn expand_seed<R: Rng>(
    catalog: &PieceCatalog,
    seed: TemplateId,
    config: &GeneratorConfig,
    rng: &mut R,
) -> Result<Expansion> {
    let seed_template = catalog.require(seed)?;
    if seed_template.connector_count() == 0 {
        return Err(DungeonError::SeedWithoutConnectors(
            seed_template.name().to_string(),
        ));
    }
    if !catalog.has_role(PieceRole::Room) {
        return Err(DungeonError::EmptyRole(PieceRole::Room));
    }

    let mut arena = PieceArena::new();
    let seed_id = arena.spawn(seed, seed_template, Pose::IDENTITY, SEED_LABEL);
    arena.reparent(seed_id, &config.container)?;
    arena.finalize(seed_id, SEED_LABEL)?;

    let targets = arena.require(seed_id)?.connectors();
    let staging = Pose::at(config.staging_position());
    let mut room_ids = Vec::with_capacity(targets.len());
    let mut links = Vec::new();
    let mut skipped = Vec::new();

    for target in &targets {
        let room_template_id = catalog
            .pick_template(PieceRole::Room, rng)
            .ok_or(DungeonError::EmptyRole(PieceRole::Room))?;
        let room_template = catalog.require(room_template_id)?;
        let room = arena.spawn(room_template_id, room_template, staging, ROOM_LABEL);
        arena.reparent(room, &config.container)?;

        let Some(entry) = arena.require(room)?.first_connector() else {
            tracing::warn!(
                "Room '{}' has no connectors; leaving {} empty",
                room_template.name(),
                target.id
            );
            arena.destroy(room)?;
            skipped.push(target.id);
            continue;
        };

        arena.set_pose(room, compute_pose(&entry, target))?;
        arena.finalize(room, ROOM_LABEL)?;
        room_ids.push(room);
        links.push(Link {
            target: target.id,
            entry: entry.id,
            kind: LinkKind::Attached,
        });
    }

    tracing::info!(
        "Expanded '{}' with {} rooms",
        seed_template.name(),
        room_ids.len()
    );

    let rooms = room_ids
        .into_iter()
        .filter_map(|id| arena.take(id))
        .collect();
    let seed = arena
        .take(seed_id)
        .ok_or(DungeonError::PieceNotFound(seed_id))?;

    Ok(Expansion {
        seed,
        rooms,
        links,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin::{corridor_straight, room_small, room_vault};
    use crate::catalog::schema::PieceTemplate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_room_on_every_connector() {
        let mut catalog = PieceCatalog::new();
        let seed = catalog.register(corridor_straight());
        catalog.register(room_small());
        catalog.register(room_vault());

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let expansion = expand_seed(&catalog, seed, &GeneratorConfig::default(), &mut rng).unwrap();

        assert_eq!(expansion.rooms.len(), 2);
        assert!(expansion.skipped.is_empty());
        for (room, link) in expansion.rooms.iter().zip(&expansion.links) {
            assert_eq!(room.label, "room_annex");
            let entry = room.connector(link.entry.slot).unwrap();
            let target = expansion.seed.connector(link.target.slot).unwrap();
            assert!((entry.position - target.position).length() < 1e-3);
            assert!((entry.forward + target.forward).length() < 1e-3);
        }
    }

    #[test]
    fn test_doorless_room_is_skipped() {
        let mut catalog = PieceCatalog::new();
        let seed = catalog.register(corridor_straight());
        catalog.register(PieceTemplate::new("closet", PieceRole::Room));

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let expansion = expand_seed(&catalog, seed, &GeneratorConfig::default(), &mut rng).unwrap();
        assert!(expansion.rooms.is_empty());
        assert_eq!(expansion.skipped.len(), 2);
    }

    #[test]
    fn test_requires_rooms_and_seed_connectors() {
        let mut catalog = PieceCatalog::new();
        let seed = catalog.register(corridor_straight());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            expand_seed(&catalog, seed, &GeneratorConfig::default(), &mut rng),
            Err(DungeonError::EmptyRole(PieceRole::Room))
        ));

        let blank = catalog.register(PieceTemplate::new("blank", PieceRole::Corridor));
        catalog.register(room_small());
        assert!(matches!(
            expand_seed(&catalog, blank, &GeneratorConfig::default(), &mut rng),
            Err(DungeonError::SeedWithoutConnectors(_))
        ));
    }
}
