//! Queue-driven growth of a layout from a seed piece
//!
//! The engine keeps a FIFO queue of open connectors. Each iteration pops
//! one, spawns a room or corridor at the staging position, aligns it onto
//! the connector and keeps it only if it overlaps nothing already placed.
//! A rejected candidate is destroyed and its target sealed with a closing
//! wall straight away. When a cap stops the loop, every connector still
//! queued is sealed in a final sweep, so a finished layout has no open
//! doorways unless a wall itself could not be placed.

use std::collections::VecDeque;

use rand::Rng;

use super::align::compute_pose;
use super::arena::{Connector, PieceArena};
use super::result::{Diagnostic, LayoutResult, Link, LinkKind, StopReason, UnsealableReason};
use crate::catalog::registry::PieceCatalog;
use crate::core::config::GeneratorConfig;
use crate::core::error::{DungeonError, Result};
use crate::core::types::{ConnectorRef, PieceId, PieceRole, Pose, TemplateId};
use crate::spatial::{BroadphaseGrid, CollisionOracle, SpatialIndex};

const SEED_LABEL: &str = "spawn";
const WALL_LABEL: &str = "closing_wall";

/// Why a candidate was destroyed instead of accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Collision,
    NoEntryConnector,
    DegeneratePose,
}

enum Attempt {
    Accepted(PieceId),
    Rejected(Rejection),
}

/// One generation run
///
/// Holds all per-run state, so each run gets a fresh engine and nothing
/// leaks from one layout into the next.
pub struct GrowthEngine<'a, R: Rng, I: SpatialIndex = BroadphaseGrid> {
    catalog: &'a PieceCatalog,
    config: GeneratorConfig,
    oracle: CollisionOracle,
    rng: R,
    arena: PieceArena,
    index: I,
    queue: VecDeque<ConnectorRef>,
    accepted: Vec<PieceId>,
    placed_count: usize,
    links: Vec<Link>,
    unresolved: Vec<ConnectorRef>,
    diagnostics: Vec<Diagnostic>,
    rejections: usize,
}

impl<'a, R: Rng> GrowthEngine<'a, R, BroadphaseGrid> {
    /// Engine backed by a broadphase grid sized from `config`
    pub fn new(catalog: &'a PieceCatalog, config: GeneratorConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let index = BroadphaseGrid::new(config.grid_cell_size);
        Self::with_index(catalog, config, rng, index)
    }
}

impl<'a, R: Rng, I: SpatialIndex> GrowthEngine<'a, R, I> {
    /// Engine backed by a caller-supplied spatial index
    ///
    /// The index is cleared before use.
    pub fn with_index(
        catalog: &'a PieceCatalog,
        config: GeneratorConfig,
        rng: R,
        mut index: I,
    ) -> Result<Self> {
        config.validate()?;
        index.clear();

        Ok(Self {
            catalog,
            oracle: CollisionOracle::new(config.overlap_margin),
            config,
            rng,
            arena: PieceArena::new(),
            index,
            queue: VecDeque::new(),
            accepted: Vec::new(),
            placed_count: 0,
            links: Vec::new(),
            unresolved: Vec::new(),
            diagnostics: Vec::new(),
            rejections: 0,
        })
    }

    /// Grow a layout outward from `seed`
    ///
    /// Fails before touching anything if the seed has no connectors or the
    /// catalog lacks corridors or closing walls. Once growth starts the run
    /// always completes, reporting problems through diagnostics instead.
    pub fn generate(mut self, seed: TemplateId) -> Result<LayoutResult> {
        self.check_catalog(seed)?;

        let catalog = self.catalog;
        let seed_template = catalog.require(seed)?;
        let seed_id = self
            .arena
            .spawn(seed, seed_template, Pose::IDENTITY, SEED_LABEL);
        self.arena.reparent(seed_id, &self.config.container)?;
        self.accept(seed_id, None, SEED_LABEL.to_string())?;
        tracing::info!(
            "Growing layout from '{}' ({} open connectors)",
            seed_template.name(),
            self.queue.len()
        );

        let mut iterations = 0;
        while self.placed_count < self.config.max_pieces && iterations < self.config.max_attempts {
            let Some(target_ref) = self.queue.pop_front() else {
                break;
            };
            iterations += 1;

            let target = self.connector(target_ref)?;
            let template_id = self.choose_template()?;
            match self.try_place(template_id, &target)? {
                Attempt::Accepted(id) => {
                    tracing::debug!("Attached {:?} at {}", id, target_ref);
                }
                Attempt::Rejected(reason) => {
                    tracing::debug!(
                        "Rejected '{}' at {}: {:?}",
                        catalog.require(template_id)?.name(),
                        target_ref,
                        reason
                    );
                    self.rejections += 1;
                    self.seal(&target)?;
                }
            }
        }

        let stop_reason = if self.queue.is_empty() {
            StopReason::QueueDrained
        } else if self.placed_count >= self.config.max_pieces {
            StopReason::PieceCap
        } else {
            StopReason::AttemptCap
        };

        if stop_reason != StopReason::QueueDrained {
            tracing::info!(
                "Growth stopped ({}), sealing {} open connectors",
                stop_reason,
                self.queue.len()
            );
            self.diagnostics.push(Diagnostic::BudgetExhausted {
                reason: stop_reason,
                open_connectors: self.queue.len(),
            });
        }

        while let Some(target_ref) = self.queue.pop_front() {
            let target = self.connector(target_ref)?;
            self.seal(&target)?;
        }

        let pieces = self
            .accepted
            .iter()
            .filter_map(|id| self.arena.take(*id))
            .collect::<Vec<_>>();

        let result = LayoutResult {
            pieces,
            placed_count: self.placed_count,
            links: self.links,
            unresolved: self.unresolved,
            diagnostics: self.diagnostics,
            iterations,
            rejections: self.rejections,
            stop_reason,
        };
        tracing::info!(
            "Layout complete: {} pieces, {} closing walls, {} iterations",
            result.placed_count,
            result.seal_count(),
            result.iterations
        );
        Ok(result)
    }

    fn check_catalog(&self, seed: TemplateId) -> Result<()> {
        let template = self.catalog.get(seed).ok_or_else(|| {
            DungeonError::TemplateNotFound(format!("template #{}", seed.0))
        })?;
        if template.connector_count() == 0 {
            return Err(DungeonError::SeedWithoutConnectors(
                template.name().to_string(),
            ));
        }
        for role in [PieceRole::Corridor, PieceRole::ClosingWall] {
            if !self.catalog.has_role(role) {
                return Err(DungeonError::EmptyRole(role));
            }
        }
        Ok(())
    }

    /// World-space view of a connector on an accepted piece
    fn connector(&self, id: ConnectorRef) -> Result<Connector> {
        self.arena
            .require(id.piece)?
            .connector(id.slot)
            .ok_or(DungeonError::PieceNotFound(id.piece))
    }

    /// Room with the configured probability, a corridor otherwise
    fn choose_template(&mut self) -> Result<TemplateId> {
        let catalog = self.catalog;
        if self.rng.gen_bool(self.config.room_probability) {
            if let Some(id) = catalog.pick_template(PieceRole::Room, &mut self.rng) {
                return Ok(id);
            }
        }
        catalog
            .pick_template(PieceRole::Corridor, &mut self.rng)
            .ok_or(DungeonError::EmptyRole(PieceRole::Corridor))
    }

    /// Spawn a candidate at the staging position, reparented into the layout
    fn spawn_staged(&mut self, template_id: TemplateId, label: &str) -> Result<PieceId> {
        let catalog = self.catalog;
        let template = catalog.require(template_id)?;
        let staging = Pose::at(self.config.staging_position());
        let id = self.arena.spawn(template_id, template, staging, label);
        self.arena.reparent(id, &self.config.container)?;
        Ok(id)
    }

    fn try_place(&mut self, template_id: TemplateId, target: &Connector) -> Result<Attempt> {
        let label = self.catalog.require(template_id)?.name().to_string();
        let candidate = self.spawn_staged(template_id, &label)?;

        let Some(entry) = self.arena.require(candidate)?.first_connector() else {
            self.arena.destroy(candidate)?;
            return Ok(Attempt::Rejected(Rejection::NoEntryConnector));
        };

        let pose = compute_pose(&entry, target);
        if !pose.is_finite() {
            self.arena.destroy(candidate)?;
            return Ok(Attempt::Rejected(Rejection::DegeneratePose));
        }
        self.arena.set_pose(candidate, pose)?;

        if self.oracle.overlaps(self.arena.require(candidate)?, &self.index) {
            self.arena.destroy(candidate)?;
            return Ok(Attempt::Rejected(Rejection::Collision));
        }

        let label = format!("piece_{}", self.placed_count);
        self.accept(candidate, Some(entry.id), label)?;
        self.links.push(Link {
            target: target.id,
            entry: entry.id,
            kind: LinkKind::Attached,
        });
        Ok(Attempt::Accepted(candidate))
    }

    /// Make a layout piece permanent and queue its remaining connectors
    ///
    /// The piece's volume is committed to the index before the next
    /// candidate is tested, so it is visible to every later overlap query.
    fn accept(&mut self, id: PieceId, entry: Option<ConnectorRef>, label: String) -> Result<()> {
        let piece = self.arena.require(id)?;
        if let Some(volume) = piece.world_bounds() {
            self.index.insert(id, volume);
        }
        self.index.commit();

        // Every accepted piece has a fresh id, so these refs were never queued
        let open = piece
            .connectors()
            .into_iter()
            .map(|c| c.id)
            .filter(|c| Some(*c) != entry)
            .collect::<Vec<_>>();

        self.arena.finalize(id, label)?;
        self.accepted.push(id);
        self.placed_count += 1;
        self.queue.extend(open);
        Ok(())
    }

    /// Plug `target` with a closing wall
    ///
    /// The wall is not checked for overlap. If it cannot be aligned the
    /// connector stays open and is reported.
    fn seal(&mut self, target: &Connector) -> Result<()> {
        let catalog = self.catalog;
        let wall_template = catalog
            .pick_template(PieceRole::ClosingWall, &mut self.rng)
            .ok_or(DungeonError::EmptyRole(PieceRole::ClosingWall))?;
        let wall = self.spawn_staged(wall_template, WALL_LABEL)?;

        let Some(entry) = self.arena.require(wall)?.first_connector() else {
            self.arena.destroy(wall)?;
            self.unsealable(target.id, UnsealableReason::NoWallConnector);
            return Ok(());
        };

        let pose = compute_pose(&entry, target);
        if !pose.is_finite() {
            self.arena.destroy(wall)?;
            self.unsealable(target.id, UnsealableReason::DegeneratePose);
            return Ok(());
        }
        self.arena.set_pose(wall, pose)?;

        if let Some(volume) = self.arena.require(wall)?.world_bounds() {
            self.index.insert(wall, volume);
            self.index.commit();
        }
        self.arena.finalize(wall, WALL_LABEL)?;
        self.accepted.push(wall);
        self.links.push(Link {
            target: target.id,
            entry: entry.id,
            kind: LinkKind::Sealed,
        });
        tracing::debug!("Sealed {}", target.id);
        Ok(())
    }

    fn unsealable(&mut self, connector: ConnectorRef, reason: UnsealableReason) {
        tracing::warn!("Could not seal {}: {:?}", connector, reason);
        self.unresolved.push(connector);
        self.diagnostics
            .push(Diagnostic::UnsealableConnector { connector, reason });
    }
}

/// Grow a layout with default settings and the given caps
pub fn generate_layout<R: Rng>(
    catalog: &PieceCatalog,
    seed: TemplateId,
    max_pieces: usize,
    max_attempts: usize,
    rng: R,
) -> Result<LayoutResult> {
    let config = GeneratorConfig {
        max_pieces,
        max_attempts,
        ..GeneratorConfig::default()
    };
    GrowthEngine::new(catalog, config, rng)?.generate(seed)
}
