//! Outcome of a generation run

use ahash::AHashMap;
use serde::Serialize;

use super::arena::PieceInstance;
use crate::core::types::{ConnectorRef, PieceId, PieceRole};

/// Why the growth loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every open connector was resolved by the loop itself
    QueueDrained,
    /// The piece cap was reached with connectors still open
    PieceCap,
    /// The iteration cap was reached with connectors still open
    AttemptCap,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::QueueDrained => "queue drained",
            StopReason::PieceCap => "piece cap reached",
            StopReason::AttemptCap => "attempt cap reached",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// A layout piece was attached through its entry connector
    Attached,
    /// A closing wall plugged the target
    Sealed,
}

/// One resolved connector pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    /// The open connector that was resolved
    pub target: ConnectorRef,
    /// The connector on the new piece that now sits on `target`
    pub entry: ConnectorRef,
    pub kind: LinkKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsealableReason {
    /// The chosen closing-wall template has no connector to align with
    NoWallConnector,
    /// Alignment produced a non-finite pose
    DegeneratePose,
}

/// Non-fatal events recorded during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A connector was left open because no wall could be placed on it
    UnsealableConnector {
        connector: ConnectorRef,
        reason: UnsealableReason,
    },
    /// A cap stopped growth; the remaining connectors went to the final sweep
    BudgetExhausted {
        reason: StopReason,
        open_connectors: usize,
    },
}

/// Everything a finished generation run produced
#[derive(Debug, Clone, Serialize)]
pub struct LayoutResult {
    /// Accepted pieces in placement order, closing walls included
    pub pieces: Vec<PieceInstance>,
    /// Accepted non-wall pieces, the seed included
    pub placed_count: usize,
    pub links: Vec<Link>,
    /// Connectors left open after the final sweep
    pub unresolved: Vec<ConnectorRef>,
    pub diagnostics: Vec<Diagnostic>,
    /// Growth loop iterations performed
    pub iterations: usize,
    /// Candidates destroyed before acceptance
    pub rejections: usize,
    pub stop_reason: StopReason,
}

impl LayoutResult {
    pub fn piece(&self, id: PieceId) -> Option<&PieceInstance> {
        self.pieces.iter().find(|p| p.id == id)
    }

    /// Corridors and rooms, the seed first
    pub fn layout_pieces(&self) -> impl Iterator<Item = &PieceInstance> {
        self.pieces
            .iter()
            .filter(|p| p.role != PieceRole::ClosingWall)
    }

    pub fn closing_walls(&self) -> impl Iterator<Item = &PieceInstance> {
        self.pieces
            .iter()
            .filter(|p| p.role == PieceRole::ClosingWall)
    }

    pub fn seal_count(&self) -> usize {
        self.links
            .iter()
            .filter(|l| l.kind == LinkKind::Sealed)
            .count()
    }

    /// Connectors on layout pieces not resolved by exactly one link
    ///
    /// Each such connector must either be a link target, or be the entry
    /// its piece was attached through. Unresolved connectors reported by the
    /// run show up here as well.
    pub fn dangling_connectors(&self) -> Vec<ConnectorRef> {
        let mut uses: AHashMap<ConnectorRef, usize> = AHashMap::new();
        for link in &self.links {
            *uses.entry(link.target).or_default() += 1;
            *uses.entry(link.entry).or_default() += 1;
        }

        self.layout_pieces()
            .flat_map(|p| p.connectors())
            .map(|c| c.id)
            .filter(|id| uses.get(id).copied().unwrap_or(0) != 1)
            .collect()
    }

    /// True when no layout connector is left open or resolved twice
    pub fn is_sealed(&self) -> bool {
        self.unresolved.is_empty() && self.dangling_connectors().is_empty()
    }
}
