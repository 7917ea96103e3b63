//! Spatial backend for overlap queries against placed pieces

use ahash::AHashMap;

use super::volume::OrientedBox;
use crate::core::types::PieceId;

/// Oriented-box overlap queries over registered piece volumes
///
/// Registration is two-phase: `insert` stages a volume and `commit` makes
/// every staged volume visible. Queries only ever observe committed state,
/// so callers must commit an acceptance before issuing the next query.
pub trait SpatialIndex {
    /// Stage `volume` for `owner`, replacing any previous volume at commit
    fn insert(&mut self, owner: PieceId, volume: OrientedBox);

    /// Drop every volume of `owner`, staged or committed
    fn remove(&mut self, owner: PieceId) -> bool;

    /// Publish all staged volumes to queries
    fn commit(&mut self);

    /// Owners of committed volumes intersecting `volume`, sorted and unique
    fn query(&self, volume: &OrientedBox) -> Vec<PieceId>;

    /// Number of committed volumes
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);
}

/// Volumes covering more cells than this skip the grid and are scanned on
/// every query instead
const MAX_CELLS_PER_VOLUME: i64 = 4096;

type CellSpan = ((i32, i32), (i32, i32));

/// Sparse hash grid over the horizontal plane with exact narrow-phase tests
pub struct BroadphaseGrid {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<PieceId>>,
    volumes: AHashMap<PieceId, OrientedBox>,
    /// Committed volumes too large to bucket
    oversized: Vec<PieceId>,
    pending: Vec<(PieceId, OrientedBox)>,
}

impl BroadphaseGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: AHashMap::new(),
            volumes: AHashMap::new(),
            oversized: Vec::new(),
            pending: Vec::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, x: f32, z: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (z / self.cell_size).floor() as i32,
        )
    }

    /// Cell range under the box's horizontal footprint, or `None` if it is
    /// too large to bucket
    fn cell_span(&self, volume: &OrientedBox) -> Option<CellSpan> {
        let (min, max) = volume.aabb();
        let (x0, z0) = self.cell_coord(min.x, min.z);
        let (x1, z1) = self.cell_coord(max.x, max.z);
        let width = i64::from(x1) - i64::from(x0) + 1;
        let depth = i64::from(z1) - i64::from(z0) + 1;
        let count = width * depth;
        (count <= MAX_CELLS_PER_VOLUME).then_some(((x0, z0), (x1, z1)))
    }

    fn cells_in(span: CellSpan) -> impl Iterator<Item = (i32, i32)> {
        let ((x0, z0), (x1, z1)) = span;
        (x0..=x1).flat_map(move |x| (z0..=z1).map(move |z| (x, z)))
    }

    fn unlink(&mut self, owner: PieceId) -> bool {
        let Some(old) = self.volumes.remove(&owner) else {
            return false;
        };
        match self.cell_span(&old) {
            Some(span) => {
                for coord in Self::cells_in(span) {
                    if let Some(cell) = self.cells.get_mut(&coord) {
                        cell.retain(|&id| id != owner);
                        if cell.is_empty() {
                            self.cells.remove(&coord);
                        }
                    }
                }
            }
            None => self.oversized.retain(|&id| id != owner),
        }
        true
    }

    /// Number of volumes waiting for the next commit
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of committed volumes kept outside the grid
    pub fn oversized_len(&self) -> usize {
        self.oversized.len()
    }
}

impl SpatialIndex for BroadphaseGrid {
    fn insert(&mut self, owner: PieceId, volume: OrientedBox) {
        self.pending.push((owner, volume));
    }

    fn remove(&mut self, owner: PieceId) -> bool {
        let staged = self.pending.len();
        self.pending.retain(|(id, _)| *id != owner);
        let was_staged = self.pending.len() != staged;
        self.unlink(owner) || was_staged
    }

    fn commit(&mut self) {
        for (owner, volume) in std::mem::take(&mut self.pending) {
            self.unlink(owner);
            match self.cell_span(&volume) {
                Some(span) => {
                    for coord in Self::cells_in(span) {
                        self.cells.entry(coord).or_default().push(owner);
                    }
                }
                None => {
                    tracing::debug!("{:?} spans too many cells, kept unbucketed", owner);
                    self.oversized.push(owner);
                }
            }
            self.volumes.insert(owner, volume);
        }
    }

    fn query(&self, volume: &OrientedBox) -> Vec<PieceId> {
        let mut candidates: Vec<PieceId> = match self.cell_span(volume) {
            Some(span) => Self::cells_in(span)
                .filter_map(|coord| self.cells.get(&coord))
                .flatten()
                .chain(self.oversized.iter())
                .copied()
                .collect(),
            // Cheaper to test everything than to walk the cells
            None => self.volumes.keys().copied().collect(),
        };
        candidates.sort_unstable();
        candidates.dedup();

        candidates
            .into_iter()
            .filter(|id| {
                self.volumes
                    .get(id)
                    .map(|placed| placed.intersects(volume))
                    .unwrap_or(false)
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.volumes.len()
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.volumes.clear();
        self.oversized.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn cube(x: f32, z: f32, half: f32) -> OrientedBox {
        OrientedBox::new(Vec3::new(x, 0.0, z), Vec3::splat(half), Quat::IDENTITY)
    }

    #[test]
    fn test_staged_volume_invisible_until_commit() {
        let mut grid = BroadphaseGrid::new(10.0);
        grid.insert(PieceId(1), cube(0.0, 0.0, 2.0));

        assert!(grid.query(&cube(1.0, 0.0, 1.0)).is_empty());
        assert_eq!(grid.pending_len(), 1);

        grid.commit();
        assert_eq!(grid.query(&cube(1.0, 0.0, 1.0)), vec![PieceId(1)]);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_query_spans_cells() {
        let mut grid = BroadphaseGrid::new(4.0);
        grid.insert(PieceId(1), cube(-3.0, -3.0, 1.0));
        grid.insert(PieceId(2), cube(3.0, 3.0, 1.0));
        grid.insert(PieceId(3), cube(40.0, 40.0, 1.0));
        grid.commit();

        let hits = grid.query(&cube(0.0, 0.0, 3.5));
        assert_eq!(hits, vec![PieceId(1), PieceId(2)]);
    }

    #[test]
    fn test_large_volume_found_from_far_cell() {
        let mut grid = BroadphaseGrid::new(2.0);
        grid.insert(PieceId(7), cube(0.0, 0.0, 10.0));
        grid.commit();

        assert_eq!(grid.query(&cube(9.0, 9.0, 0.5)), vec![PieceId(7)]);
    }

    #[test]
    fn test_remove_committed_and_staged() {
        let mut grid = BroadphaseGrid::new(10.0);
        grid.insert(PieceId(1), cube(0.0, 0.0, 1.0));
        grid.commit();
        grid.insert(PieceId(2), cube(0.0, 0.0, 1.0));

        assert!(grid.remove(PieceId(1)));
        assert!(grid.remove(PieceId(2)));
        assert!(!grid.remove(PieceId(3)));

        grid.commit();
        assert!(grid.is_empty());
        assert!(grid.query(&cube(0.0, 0.0, 1.0)).is_empty());
    }

    #[test]
    fn test_reinsert_replaces_volume() {
        let mut grid = BroadphaseGrid::new(10.0);
        grid.insert(PieceId(1), cube(0.0, 0.0, 1.0));
        grid.commit();
        grid.insert(PieceId(1), cube(50.0, 50.0, 1.0));
        grid.commit();

        assert_eq!(grid.len(), 1);
        assert!(grid.query(&cube(0.0, 0.0, 1.0)).is_empty());
        assert_eq!(grid.query(&cube(50.0, 50.0, 1.0)), vec![PieceId(1)]);
    }

    #[test]
    fn test_huge_volume_kept_outside_grid() {
        let mut grid = BroadphaseGrid::new(10.0);
        grid.insert(PieceId(1), cube(0.0, 0.0, 5.0e5));
        grid.insert(PieceId(2), cube(30.0, 30.0, 1.0));
        grid.commit();

        assert_eq!(grid.oversized_len(), 1);
        assert!(grid.cells.len() <= 4);
        assert_eq!(grid.query(&cube(1.0e5, -2.0e5, 1.0)), vec![PieceId(1)]);
        assert_eq!(grid.query(&cube(30.0, 30.0, 0.5)), vec![PieceId(1), PieceId(2)]);

        // A huge query tests every committed volume directly
        assert_eq!(grid.query(&cube(0.0, 0.0, 1.0e6)), vec![PieceId(1), PieceId(2)]);

        assert!(grid.remove(PieceId(1)));
        assert_eq!(grid.oversized_len(), 0);
        assert!(grid.query(&cube(1.0e5, -2.0e5, 1.0)).is_empty());
    }
}
