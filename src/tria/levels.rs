//! Per-level cell storage and the level-independent face store.

use super::CellId;
use super::objects::TriaObjects;
use crate::mesh_error::MeshTriaError;
use crate::topology::entity_kind::EntityKind;

/// All cells of one refinement level together with the per-cell data that
/// only cells carry: parent links, refinement flags, neighbors and, in 3-D,
/// face orientations.
#[derive(Debug, Clone)]
pub struct TriaLevel {
    pub(crate) cells: TriaObjects,
    parents: Vec<Option<usize>>,
    refine_flags: Vec<bool>,
    coarsen_flags: Vec<bool>,
    faces_per_cell: usize,
    neighbors: Vec<Option<CellId>>,
    face_orientations: Vec<bool>,
    stores_orientation: bool,
}

impl TriaLevel {
    pub(crate) fn new(dim: usize, level: usize) -> Self {
        let kind = EntityKind::from_dimension(dim).unwrap_or(EntityKind::Hex);
        Self {
            cells: TriaObjects::new(kind, Some(level)),
            parents: Vec::new(),
            refine_flags: Vec::new(),
            coarsen_flags: Vec::new(),
            faces_per_cell: 2 * dim,
            neighbors: Vec::new(),
            face_orientations: Vec::new(),
            stores_orientation: dim == 3,
        }
    }

    pub fn cells(&self) -> &TriaObjects {
        &self.cells
    }

    /// Number of cell slots on this level.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Bring the cell-only arrays to the length of the cell storage.
    fn sync(&mut self) {
        let n = self.cells.len();
        self.parents.resize(n, None);
        self.refine_flags.resize(n, false);
        self.coarsen_flags.resize(n, false);
        self.neighbors.resize(n * self.faces_per_cell, None);
        if self.stores_orientation {
            self.face_orientations.resize(n * self.faces_per_cell, true);
        }
    }

    pub(crate) fn reserve(&mut self, count: usize) {
        self.cells.reserve(count);
        self.sync();
    }

    /// Claim `count` contiguous cells with cleared per-cell data.
    pub(crate) fn allocate_cells(&mut self, count: usize) -> usize {
        let base = self.cells.allocate(count);
        self.sync();
        for i in base..base + count {
            self.reset(i);
        }
        base
    }

    fn reset(&mut self, index: usize) {
        self.parents[index] = None;
        self.refine_flags[index] = false;
        self.coarsen_flags[index] = false;
        let nf = self.faces_per_cell;
        self.neighbors[index * nf..(index + 1) * nf].fill(None);
        if self.stores_orientation {
            self.face_orientations[index * nf..(index + 1) * nf].fill(true);
        }
    }

    pub(crate) fn release_cell(&mut self, index: usize) -> Result<(), MeshTriaError> {
        self.cells.release(index)?;
        self.reset(index);
        Ok(())
    }

    pub(crate) fn mark_used(&mut self, index: usize) -> Result<(), MeshTriaError> {
        self.cells.mark_used(index)
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents.get(index).copied().flatten()
    }

    pub(crate) fn set_parent(&mut self, index: usize, parent: Option<usize>) {
        self.parents[index] = parent;
    }

    pub fn refine_flag(&self, index: usize) -> bool {
        self.refine_flags.get(index).copied().unwrap_or(false)
    }

    pub fn coarsen_flag(&self, index: usize) -> bool {
        self.coarsen_flags.get(index).copied().unwrap_or(false)
    }

    pub(crate) fn set_refine_flag(&mut self, index: usize, value: bool) {
        self.refine_flags[index] = value;
    }

    pub(crate) fn set_coarsen_flag(&mut self, index: usize, value: bool) {
        self.coarsen_flags[index] = value;
    }

    pub(crate) fn refine_flags(&self) -> &[bool] {
        &self.refine_flags
    }

    pub(crate) fn coarsen_flags(&self) -> &[bool] {
        &self.coarsen_flags
    }

    pub(crate) fn refine_flags_mut(&mut self) -> &mut [bool] {
        &mut self.refine_flags
    }

    pub(crate) fn coarsen_flags_mut(&mut self) -> &mut [bool] {
        &mut self.coarsen_flags
    }

    /// Neighbor across `face`, `None` at the boundary.
    pub fn neighbor(&self, index: usize, face: usize) -> Option<CellId> {
        self.neighbors
            .get(index * self.faces_per_cell + face)
            .copied()
            .flatten()
    }

    pub(crate) fn set_neighbor(&mut self, index: usize, face: usize, neighbor: Option<CellId>) {
        self.neighbors[index * self.faces_per_cell + face] = neighbor;
    }

    pub(crate) fn clear_neighbors(&mut self) {
        self.neighbors.fill(None);
    }

    /// Stored orientation of `face`; always `true` below three dimensions.
    pub fn face_orientation(&self, index: usize, face: usize) -> bool {
        if !self.stores_orientation {
            return true;
        }
        self.face_orientations
            .get(index * self.faces_per_cell + face)
            .copied()
            .unwrap_or(true)
    }

    pub(crate) fn set_face_orientation(&mut self, index: usize, face: usize, value: bool) {
        if self.stores_orientation {
            self.face_orientations[index * self.faces_per_cell + face] = value;
        }
    }

    /// Consistency of the parallel arrays.
    pub(crate) fn check_lengths(&self) -> bool {
        let n = self.cells.len();
        self.parents.len() == n
            && self.refine_flags.len() == n
            && self.coarsen_flags.len() == n
            && self.neighbors.len() == n * self.faces_per_cell
            && (!self.stores_orientation || self.face_orientations.len() == n * self.faces_per_cell)
    }
}

/// Lines and quads shared by cells of all levels.
///
/// In 2-D only `lines` is populated; in 3-D `quads` holds the faces and
/// `lines` their edges. 1-D meshes have vertices as faces and leave both
/// empty.
#[derive(Debug, Clone)]
pub struct TriaFaces {
    pub(crate) lines: TriaObjects,
    pub(crate) quads: TriaObjects,
}

impl Default for TriaFaces {
    fn default() -> Self {
        Self {
            lines: TriaObjects::new(EntityKind::Line, None),
            quads: TriaObjects::new(EntityKind::Quad, None),
        }
    }
}

impl TriaFaces {
    pub fn lines(&self) -> &TriaObjects {
        &self.lines
    }

    pub fn quads(&self) -> &TriaObjects {
        &self.quads
    }

    pub(crate) fn get(&self, kind: EntityKind) -> Option<&TriaObjects> {
        match kind {
            EntityKind::Line => Some(&self.lines),
            EntityKind::Quad => Some(&self.quads),
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, kind: EntityKind) -> Option<&mut TriaObjects> {
        match kind {
            EntityKind::Line => Some(&mut self.lines),
            EntityKind::Quad => Some(&mut self.quads),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_data_follows_allocation() {
        let mut level = TriaLevel::new(3, 1);
        let base = level.allocate_cells(8);
        assert_eq!(base, 0);
        assert!(level.check_lengths());
        level.set_refine_flag(2, true);
        level.set_face_orientation(2, 4, false);
        level.set_neighbor(2, 1, Some(CellId::new(1, 3)));
        assert!(!level.face_orientation(2, 4));
        assert_eq!(level.neighbor(2, 1), Some(CellId::new(1, 3)));

        level.release_cell(2).unwrap();
        assert!(!level.refine_flag(2));
        assert!(level.face_orientation(2, 4));
        assert_eq!(level.neighbor(2, 1), None);
    }

    #[test]
    fn orientation_is_trivial_in_2d() {
        let mut level = TriaLevel::new(2, 0);
        level.allocate_cells(1);
        level.set_face_orientation(0, 1, false);
        assert!(level.face_orientation(0, 1));
    }
}
