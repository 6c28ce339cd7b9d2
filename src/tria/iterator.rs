//! Linear scans over cells across level boundaries.
//!
//! A [`CellIterator`] walks `(level, index)` slots in level-major order and
//! stops only on slots accepted by its [`IteratorFilter`]. Moving past the
//! last slot of a level continues on the next level, so a scan over all
//! active cells needs no knowledge of the level layout. The past-the-end
//! position is both the terminator and the only invalid state.

use std::ptr;

use super::accessor::{CellAccessor, EntityAccessor};
use super::{CellId, Triangulation};
use crate::mesh_error::MeshTriaError;
use crate::topology::entity_kind::EntityKind;

/// Which slots a [`CellIterator`] stops on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IteratorFilter {
    /// Every slot, used or not.
    Raw,
    /// Used cells.
    Used,
    /// Used cells without children.
    #[default]
    Active,
}

#[derive(Clone, Copy, Debug)]
pub struct CellIterator<'a, const DIM: usize> {
    tria: &'a Triangulation<DIM>,
    filter: IteratorFilter,
    position: Option<CellId>,
    only_level: Option<usize>,
}

impl<'a, const DIM: usize> CellIterator<'a, DIM> {
    fn level_len(&self, level: usize) -> usize {
        self.tria.store().levels().get(level).map_or(0, |l| l.len())
    }

    fn accepts(&self, id: CellId) -> bool {
        match self.filter {
            IteratorFilter::Raw => true,
            IteratorFilter::Used => self.tria.is_used_cell(id),
            IteratorFilter::Active => self.tria.is_active_cell(id),
        }
    }

    fn next_slot(&self, id: CellId) -> Option<CellId> {
        if id.index + 1 < self.level_len(id.level) {
            return Some(CellId::new(id.level, id.index + 1));
        }
        if self.only_level.is_some() {
            return None;
        }
        (id.level + 1..self.tria.n_levels())
            .find(|&l| self.level_len(l) > 0)
            .map(|l| CellId::new(l, 0))
    }

    fn prev_slot(&self, id: CellId) -> Option<CellId> {
        if id.index > 0 {
            return Some(CellId::new(id.level, id.index - 1));
        }
        if self.only_level.is_some() {
            return None;
        }
        (0..id.level)
            .rev()
            .find(|&l| self.level_len(l) > 0)
            .map(|l| CellId::new(l, self.level_len(l) - 1))
    }

    fn seek_forward(&self, mut slot: Option<CellId>) -> Option<CellId> {
        while let Some(id) = slot {
            if self.accepts(id) {
                return Some(id);
            }
            slot = self.next_slot(id);
        }
        None
    }

    fn seek_backward(&self, mut slot: Option<CellId>) -> Option<CellId> {
        while let Some(id) = slot {
            if self.accepts(id) {
                return Some(id);
            }
            slot = self.prev_slot(id);
        }
        None
    }

    /// Current slot, `None` past the end.
    pub fn position(&self) -> Option<CellId> {
        self.position
    }

    pub fn filter(&self) -> IteratorFilter {
        self.filter
    }

    pub fn is_end(&self) -> bool {
        self.position.is_none()
    }

    pub fn accessor(&self) -> Result<CellAccessor<'a, DIM>, MeshTriaError> {
        let id = self.position.ok_or(MeshTriaError::PastTheEnd)?;
        self.tria.cell(id)
    }

    /// Move to the next accepted slot, possibly on a later level.
    pub fn advance(&mut self) -> Result<(), MeshTriaError> {
        let id = self.position.ok_or(MeshTriaError::PastTheEnd)?;
        self.position = self.seek_forward(self.next_slot(id));
        Ok(())
    }

    /// Move to the previous accepted slot; before the first one the iterator
    /// becomes past-the-end.
    pub fn retreat(&mut self) -> Result<(), MeshTriaError> {
        let id = self.position.ok_or(MeshTriaError::PastTheEnd)?;
        self.position = self.seek_backward(self.prev_slot(id));
        Ok(())
    }
}

impl<'a, const DIM: usize> Iterator for CellIterator<'a, DIM> {
    type Item = CellAccessor<'a, DIM>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.position?;
        self.position = self.seek_forward(self.next_slot(id));
        self.tria.cell(id).ok()
    }
}

impl<const DIM: usize> PartialEq for CellIterator<'_, DIM> {
    fn eq(&self, other: &Self) -> bool {
        assert!(
            ptr::eq(self.tria, other.tria),
            "compared iterators of different triangulations"
        );
        self.position == other.position
    }
}

impl<const DIM: usize> Triangulation<DIM> {
    fn iter_from(
        &self,
        filter: IteratorFilter,
        level: usize,
        only_level: bool,
    ) -> CellIterator<'_, DIM> {
        let mut it = CellIterator {
            tria: self,
            filter,
            position: None,
            only_level: only_level.then_some(level),
        };
        let first = if level < self.n_levels() && (!only_level || it.level_len(level) > 0) {
            if it.level_len(level) > 0 {
                Some(CellId::new(level, 0))
            } else {
                it.next_slot(CellId::new(level, 0))
            }
        } else {
            None
        };
        it.position = it.seek_forward(first);
        it
    }

    /// First slot on `level` or later, used or not.
    pub fn begin_raw(&self, level: usize) -> CellIterator<'_, DIM> {
        self.iter_from(IteratorFilter::Raw, level, false)
    }

    /// First used cell on `level` or later.
    pub fn begin(&self, level: usize) -> CellIterator<'_, DIM> {
        self.iter_from(IteratorFilter::Used, level, false)
    }

    /// First active cell on `level` or later.
    pub fn begin_active(&self, level: usize) -> CellIterator<'_, DIM> {
        self.iter_from(IteratorFilter::Active, level, false)
    }

    /// The past-the-end iterator.
    pub fn end(&self) -> CellIterator<'_, DIM> {
        CellIterator {
            tria: self,
            filter: IteratorFilter::Raw,
            position: None,
            only_level: None,
        }
    }

    fn last_with(&self, filter: IteratorFilter) -> CellIterator<'_, DIM> {
        let mut it = CellIterator {
            tria: self,
            filter,
            position: None,
            only_level: None,
        };
        let last = (0..self.n_levels())
            .rev()
            .find(|&l| it.level_len(l) > 0)
            .map(|l| CellId::new(l, it.level_len(l) - 1));
        it.position = it.seek_backward(last);
        it
    }

    /// Last used cell.
    pub fn last(&self) -> CellIterator<'_, DIM> {
        self.last_with(IteratorFilter::Used)
    }

    pub fn last_active(&self) -> CellIterator<'_, DIM> {
        self.last_with(IteratorFilter::Active)
    }

    /// All used cells, level by level.
    pub fn cells(&self) -> CellIterator<'_, DIM> {
        self.begin(0)
    }

    /// All active cells, level by level.
    pub fn active_cells(&self) -> CellIterator<'_, DIM> {
        self.begin_active(0)
    }

    pub fn cells_on_level(&self, level: usize) -> CellIterator<'_, DIM> {
        self.iter_from(IteratorFilter::Used, level, true)
    }

    pub fn active_cells_on_level(&self, level: usize) -> CellIterator<'_, DIM> {
        self.iter_from(IteratorFilter::Active, level, true)
    }

    fn face_objects(&self, kind: EntityKind) -> impl Iterator<Item = EntityAccessor<'_, DIM>> {
        let indices: Vec<usize> = if kind.dimension() < DIM {
            self.store()
                .faces()
                .get(kind)
                .map(|objects| objects.used_indices().collect())
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        indices
            .into_iter()
            .filter_map(move |i| self.entity(kind, i).ok())
    }

    /// Used lines of the face store (empty in 1-D, where lines are cells).
    pub fn lines(&self) -> impl Iterator<Item = EntityAccessor<'_, DIM>> {
        self.face_objects(EntityKind::Line)
    }

    /// Used quads of the face store (3-D only).
    pub fn quads(&self) -> impl Iterator<Item = EntityAccessor<'_, DIM>> {
        self.face_objects(EntityKind::Quad)
    }

    /// Used vertices.
    pub fn vertices(&self) -> impl Iterator<Item = EntityAccessor<'_, DIM>> {
        (0..self.n_vertices())
            .filter(move |&v| self.store().vertex_used(v))
            .filter_map(move |v| self.entity(EntityKind::Vertex, v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tria::generators::subdivided_hyper_cube;

    #[test]
    fn active_scan_rolls_over_levels() {
        let mut tria = Triangulation::<1>::new();
        subdivided_hyper_cube(&mut tria, 2, 0.0, 1.0).unwrap();
        tria.cell_mut(CellId::new(0, 1)).unwrap().set_refine_flag().unwrap();
        tria.execute_coarsening_and_refinement().unwrap();

        let ids: Vec<CellId> = tria.active_cells().map(|c| c.id()).collect();
        assert_eq!(ids, vec![CellId::new(0, 0), CellId::new(1, 0), CellId::new(1, 1)]);
        assert_eq!(tria.cells().count(), 4);
        assert_eq!(tria.cells_on_level(0).count(), 2);
        assert_eq!(tria.active_cells_on_level(1).count(), 2);

        let mut it = tria.begin_active(0);
        it.advance().unwrap();
        assert_eq!(it.position(), Some(CellId::new(1, 0)));
        it.retreat().unwrap();
        assert_eq!(it.position(), Some(CellId::new(0, 0)));
        it.retreat().unwrap();
        assert!(it.is_end());
        assert_eq!(it, tria.end());
        assert_eq!(it.accessor().unwrap_err(), MeshTriaError::PastTheEnd);
        assert_eq!(it.advance(), Err(MeshTriaError::PastTheEnd));

        assert_eq!(tria.last_active().position(), Some(CellId::new(1, 1)));
        assert_eq!(tria.begin_raw(5), tria.end());
    }

    #[test]
    fn entity_scans() {
        let mut tria = Triangulation::<2>::new();
        subdivided_hyper_cube(&mut tria, 2, 0.0, 1.0).unwrap();
        assert_eq!(tria.lines().count(), 12);
        assert_eq!(tria.quads().count(), 0);
        assert_eq!(tria.vertices().count(), 9);
    }
}
