//! DoF numbering with a finite element chosen per cell.
//!
//! Every active cell carries an active FE index into an [`FeCollection`].
//! An entity shared by cells with different elements keeps one DoF list per
//! element, each tagged with the element's index. No continuity is enforced
//! between those lists; entities holding more than one are reported as
//! conflicts.

use std::ptr;

use super::DofAccess;
use super::fe::{FeCollection, FiniteElement, FiniteElementData};
use super::handler::check_permutation;
use super::layout::{DofObject, cell_dof_objects, extend_in_cell_order};
use crate::mesh_error::MeshTriaError;
use crate::topology::entity_kind::EntityKind;
use crate::tria::accessor::CellAccessor;
use crate::tria::{CellId, Triangulation};

/// DoF lists of one entity, keyed by FE index and kept sorted by it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeDofMap {
    entries: Vec<(usize, Vec<usize>)>,
}

impl FeDofMap {
    pub fn get(&self, fe_index: usize) -> Option<&[usize]> {
        self.entries
            .binary_search_by_key(&fe_index, |(fe, _)| *fe)
            .ok()
            .map(|pos| self.entries[pos].1.as_slice())
    }

    /// Insert the list for `fe_index` unless one is already present.
    fn get_or_insert_with(&mut self, fe_index: usize, make: impl FnOnce() -> Vec<usize>) -> &[usize] {
        let pos = match self.entries.binary_search_by_key(&fe_index, |(fe, _)| *fe) {
            Ok(pos) => pos,
            Err(pos) => {
                self.entries.insert(pos, (fe_index, make()));
                pos
            }
        };
        &self.entries[pos].1
    }

    /// Number of elements with a list on this entity.
    pub fn n_fes(&self) -> usize {
        self.entries.len()
    }

    pub fn fe_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(fe, _)| *fe)
    }

    fn values_mut(&mut self) -> impl Iterator<Item = &mut usize> {
        self.entries.iter_mut().flat_map(|(_, dofs)| dofs.iter_mut())
    }
}

#[derive(Clone, Debug, Default)]
struct HpStorage {
    vertices: Vec<FeDofMap>,
    lines: Vec<FeDofMap>,
    quads: Vec<FeDofMap>,
    /// Per level, per cell slot; empty for inactive cells.
    cells: Vec<Vec<Vec<usize>>>,
}

/// hp variant of the DoF handler.
#[derive(Clone, Debug)]
pub struct DoFHandler<'a, const DIM: usize> {
    tria: &'a Triangulation<DIM>,
    fes: FeCollection,
    /// Per level, per cell slot.
    active_fe_indices: Vec<Vec<usize>>,
    storage: HpStorage,
    n_dofs: usize,
    distributed: bool,
}

impl<'a, const DIM: usize> DoFHandler<'a, DIM> {
    /// All cells start on FE index 0.
    pub fn new(tria: &'a Triangulation<DIM>) -> Self {
        let active_fe_indices = tria
            .store()
            .levels()
            .iter()
            .map(|level| vec![0; level.len()])
            .collect();
        Self {
            tria,
            fes: FeCollection::new(),
            active_fe_indices,
            storage: HpStorage::default(),
            n_dofs: 0,
            distributed: false,
        }
    }

    pub fn triangulation(&self) -> &'a Triangulation<DIM> {
        self.tria
    }

    /// Select the elements. Existing numbers are dropped.
    pub fn set_fe_collection(&mut self, fes: FeCollection) {
        self.fes = fes;
        self.storage = HpStorage::default();
        self.n_dofs = 0;
        self.distributed = false;
    }

    pub fn fe_collection(&self) -> &FeCollection {
        &self.fes
    }

    fn check_active(&self, id: CellId) -> Result<(), MeshTriaError> {
        if self.tria.cell(id)?.is_active()? {
            Ok(())
        } else {
            Err(MeshTriaError::InactiveCell {
                level: id.level,
                index: id.index,
            })
        }
    }

    /// Choose the element of an active cell. Drops existing numbers.
    pub fn set_active_fe_index(&mut self, id: CellId, fe_index: usize) -> Result<(), MeshTriaError> {
        self.check_active(id)?;
        self.fes.get(fe_index)?;
        self.active_fe_indices[id.level][id.index] = fe_index;
        self.distributed = false;
        Ok(())
    }

    pub fn active_fe_index(&self, id: CellId) -> Result<usize, MeshTriaError> {
        self.check_active(id)?;
        Ok(self.active_fe_indices[id.level][id.index])
    }

    fn cell_fe_data(&self, id: CellId) -> Result<&FiniteElementData, MeshTriaError> {
        self.fes.get(self.active_fe_index(id)?)
    }

    /// Number the DoFs of every active cell with its own element.
    pub fn distribute_dofs(&mut self) -> Result<(), MeshTriaError> {
        if self.fes.is_empty() {
            return Err(MeshTriaError::NoFiniteElement);
        }
        let store = self.tria.store();
        let faces = store.faces();
        let mut storage = HpStorage {
            vertices: vec![FeDofMap::default(); store.n_vertices()],
            lines: vec![FeDofMap::default(); if DIM >= 2 { faces.lines.len() } else { 0 }],
            quads: vec![FeDofMap::default(); if DIM == 3 { faces.quads.len() } else { 0 }],
            cells: store.levels().iter().map(|l| vec![Vec::new(); l.len()]).collect(),
        };
        let mut next = 0;
        let mut fresh = |count: usize| {
            let dofs: Vec<usize> = (next..next + count).collect();
            next += count;
            dofs
        };
        for cell in self.tria.active_cells() {
            let fe_index = self.active_fe_indices[cell.level()][cell.index()];
            let fe = self.fes.get(fe_index)?;
            for local in cell_dof_objects(&cell)? {
                let count = fe.dofs_per_object(local.kind);
                if count == 0 {
                    continue;
                }
                match local.object {
                    DofObject::Vertex(i) => {
                        storage.vertices[i].get_or_insert_with(fe_index, || fresh(count));
                    }
                    DofObject::Line { index, .. } => {
                        storage.lines[index].get_or_insert_with(fe_index, || fresh(count));
                    }
                    DofObject::Quad { index: i, .. } => {
                        storage.quads[i].get_or_insert_with(fe_index, || fresh(count));
                    }
                    DofObject::Interior(id) => storage.cells[id.level][id.index] = fresh(count),
                }
            }
        }
        self.storage = storage;
        self.n_dofs = next;
        self.distributed = true;

        let conflicts = self.n_conflicting_entities();
        if conflicts > 0 {
            log::warn!(
                "{conflicts} entities are shared by cells with different elements; \
                 their dofs are not unified"
            );
        }
        log::debug!(
            "distributed {} dofs with {} elements on {} active cells",
            self.n_dofs,
            self.fes.len(),
            self.tria.n_active_cells()
        );
        Ok(())
    }

    pub fn is_distributed(&self) -> bool {
        self.distributed
    }

    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    /// Vertices, lines and quads holding lists for more than one element.
    pub fn conflicting_entities(&self) -> Vec<(EntityKind, usize)> {
        let tables = [
            (EntityKind::Vertex, &self.storage.vertices),
            (EntityKind::Line, &self.storage.lines),
            (EntityKind::Quad, &self.storage.quads),
        ];
        tables
            .into_iter()
            .flat_map(|(kind, table)| {
                table
                    .iter()
                    .enumerate()
                    .filter(|(_, map)| map.n_fes() > 1)
                    .map(move |(i, _)| (kind, i))
            })
            .collect()
    }

    pub fn n_conflicting_entities(&self) -> usize {
        self.conflicting_entities().len()
    }

    /// Element lists stored on a vertex.
    pub fn vertex_dofs(&self, vertex: usize) -> Result<&FeDofMap, MeshTriaError> {
        if !self.distributed {
            return Err(MeshTriaError::NotDistributed);
        }
        self.storage
            .vertices
            .get(vertex)
            .ok_or(MeshTriaError::out_of_range("vertex", vertex, self.storage.vertices.len()))
    }

    pub fn get_dof_indices(&self, cell: &CellAccessor<'_, DIM>) -> Result<Vec<usize>, MeshTriaError> {
        if !ptr::eq(cell.triangulation(), self.tria) {
            return Err(MeshTriaError::ForeignCell {
                level: cell.level(),
                index: cell.index(),
            });
        }
        if !self.distributed {
            return Err(MeshTriaError::NotDistributed);
        }
        let id = cell.id();
        let fe_index = self.active_fe_index(id)?;
        let fe = self.fes.get(fe_index)?;
        let mut indices = Vec::new();
        for local in cell_dof_objects(cell)? {
            if fe.dofs_per_object(local.kind) == 0 {
                continue;
            }
            let dofs = match local.object {
                DofObject::Vertex(i) => self.storage.vertices[i].get(fe_index),
                DofObject::Line { index, .. } => self.storage.lines[index].get(fe_index),
                DofObject::Quad { index, .. } => self.storage.quads[index].get(fe_index),
                DofObject::Interior(id) => Some(self.storage.cells[id.level][id.index].as_slice()),
            };
            let dofs = dofs.ok_or_else(|| {
                MeshTriaError::InvariantViolation(format!(
                    "{} of cell {id} has no dofs for element {fe_index}",
                    local.kind.name()
                ))
            })?;
            extend_in_cell_order(local.object, dofs, &mut indices);
        }
        Ok(indices)
    }

    pub fn cell_dof_indices(&self, id: CellId) -> Result<Vec<usize>, MeshTriaError> {
        self.get_dof_indices(&self.tria.cell(id)?)
    }

    /// Replace every index `k` by `new_numbers[k]`.
    pub fn renumber(&mut self, new_numbers: &[usize]) -> Result<(), MeshTriaError> {
        if !self.distributed {
            return Err(MeshTriaError::NotDistributed);
        }
        check_permutation(new_numbers, self.n_dofs)?;
        let storage = &mut self.storage;
        let entity_values = storage
            .vertices
            .iter_mut()
            .chain(storage.lines.iter_mut())
            .chain(storage.quads.iter_mut())
            .flat_map(|map| map.values_mut());
        let cell_values = storage.cells.iter_mut().flatten().flatten();
        for value in entity_values.chain(cell_values) {
            *value = new_numbers[*value];
        }
        Ok(())
    }
}

impl<const DIM: usize> DofAccess<DIM> for DoFHandler<'_, DIM> {
    fn triangulation(&self) -> &Triangulation<DIM> {
        self.tria
    }

    fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    fn cell_dof_indices(&self, cell: CellId) -> Result<Vec<usize>, MeshTriaError> {
        DoFHandler::cell_dof_indices(self, cell)
    }

    fn cell_fe(&self, cell: CellId) -> Result<&FiniteElementData, MeshTriaError> {
        self.cell_fe_data(cell)
    }

    fn renumber(&mut self, new_numbers: &[usize]) -> Result<(), MeshTriaError> {
        DoFHandler::renumber(self, new_numbers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tria::generators::subdivided_hyper_cube;

    fn q1_q2() -> FeCollection {
        [
            FiniteElementData::lagrange(1).unwrap(),
            FiniteElementData::lagrange(2).unwrap(),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn uniform_collection_matches_single_element() {
        let mut tria = Triangulation::<2>::new();
        subdivided_hyper_cube(&mut tria, 2, 0.0, 1.0).unwrap();
        let mut dofs = DoFHandler::new(&tria);
        dofs.set_fe_collection(q1_q2());
        dofs.distribute_dofs().unwrap();
        assert_eq!(dofs.n_dofs(), 9);
        assert_eq!(dofs.n_conflicting_entities(), 0);
    }

    #[test]
    fn mixed_elements_keep_separate_lists() {
        let mut tria = Triangulation::<1>::new();
        subdivided_hyper_cube(&mut tria, 2, 0.0, 1.0).unwrap();
        let mut dofs = DoFHandler::new(&tria);
        dofs.set_fe_collection(q1_q2());
        dofs.set_active_fe_index(CellId::new(0, 1), 1).unwrap();
        assert!(dofs.set_active_fe_index(CellId::new(0, 1), 2).is_err());
        dofs.distribute_dofs().unwrap();
        assert_eq!(dofs.n_dofs(), 5);
        assert_eq!(dofs.cell_dof_indices(CellId::new(0, 0)).unwrap(), vec![0, 1]);
        assert_eq!(dofs.cell_dof_indices(CellId::new(0, 1)).unwrap(), vec![2, 3, 4]);
        assert_eq!(dofs.conflicting_entities(), vec![(EntityKind::Vertex, 1)]);
        let shared = dofs.vertex_dofs(1).unwrap();
        assert_eq!(shared.fe_indices().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(shared.get(1), Some(&[2][..]));
    }

    #[test]
    fn inactive_cells_have_no_fe_index() {
        let mut tria = Triangulation::<1>::new();
        subdivided_hyper_cube(&mut tria, 1, 0.0, 1.0).unwrap();
        tria.refine_global(1).unwrap();
        let mut dofs = DoFHandler::new(&tria);
        dofs.set_fe_collection(q1_q2());
        assert!(matches!(
            dofs.active_fe_index(CellId::new(0, 0)),
            Err(MeshTriaError::InactiveCell { .. })
        ));
        assert_eq!(dofs.active_fe_index(CellId::new(1, 1)).unwrap(), 0);
    }
}
