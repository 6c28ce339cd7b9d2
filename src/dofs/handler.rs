//! Global DoF numbering for a single finite element.
//!
//! DoFs are stored per entity kind in flat vectors with a fixed stride equal
//! to the element's per-entity count. An entity shared by several cells is
//! numbered once, by the first active cell that reaches it in level-major
//! order; every later cell reads the same indices back.

use std::ptr;

use super::DofAccess;
use super::fe::{FiniteElement, FiniteElementData};
use super::layout::{DofObject, cell_dof_objects, extend_in_cell_order};
use crate::mesh_error::MeshTriaError;
use crate::topology::entity_kind::EntityKind;
use crate::tria::accessor::CellAccessor;
use crate::tria::{CellId, Triangulation};

/// Marker for a slot that has not been numbered.
pub const INVALID_DOF_INDEX: usize = usize::MAX;

#[derive(Clone, Debug, Default)]
struct DofStorage {
    counts: [usize; 4],
    vertices: Vec<usize>,
    lines: Vec<usize>,
    quads: Vec<usize>,
    /// Per level, per cell slot.
    cells: Vec<Vec<usize>>,
}

impl DofStorage {
    fn new<const DIM: usize>(tria: &Triangulation<DIM>, counts: [usize; 4]) -> Self {
        let store = tria.store();
        let faces = store.faces();
        let (n_lines, n_quads) = match DIM {
            2 => (faces.lines.len(), 0),
            3 => (faces.lines.len(), faces.quads.len()),
            _ => (0, 0),
        };
        Self {
            counts,
            vertices: vec![INVALID_DOF_INDEX; store.n_vertices() * counts[0]],
            lines: vec![INVALID_DOF_INDEX; n_lines * counts[1]],
            quads: vec![INVALID_DOF_INDEX; n_quads * counts[2]],
            cells: store
                .levels()
                .iter()
                .map(|level| vec![INVALID_DOF_INDEX; level.len() * counts[DIM]])
                .collect(),
        }
    }

    fn range(&self, object: DofObject, cell_kind: EntityKind) -> (usize, usize) {
        let n = match object {
            DofObject::Vertex(_) => self.counts[0],
            DofObject::Line { .. } => self.counts[1],
            DofObject::Quad { .. } => self.counts[2],
            DofObject::Interior(_) => self.counts[cell_kind.dimension()],
        };
        let index = match object {
            DofObject::Vertex(i)
            | DofObject::Line { index: i, .. }
            | DofObject::Quad { index: i, .. } => i,
            DofObject::Interior(id) => id.index,
        };
        (index * n, index * n + n)
    }

    fn slice(&self, object: DofObject, cell_kind: EntityKind) -> &[usize] {
        let (lo, hi) = self.range(object, cell_kind);
        let table = match object {
            DofObject::Vertex(_) => &self.vertices,
            DofObject::Line { .. } => &self.lines,
            DofObject::Quad { .. } => &self.quads,
            DofObject::Interior(id) => &self.cells[id.level],
        };
        &table[lo..hi]
    }

    fn slice_mut(&mut self, object: DofObject, cell_kind: EntityKind) -> &mut [usize] {
        let (lo, hi) = self.range(object, cell_kind);
        let table = match object {
            DofObject::Vertex(_) => &mut self.vertices,
            DofObject::Line { .. } => &mut self.lines,
            DofObject::Quad { .. } => &mut self.quads,
            DofObject::Interior(id) => &mut self.cells[id.level],
        };
        &mut table[lo..hi]
    }

    fn values_mut(&mut self) -> impl Iterator<Item = &mut usize> {
        self.vertices
            .iter_mut()
            .chain(self.lines.iter_mut())
            .chain(self.quads.iter_mut())
            .chain(self.cells.iter_mut().flatten())
    }
}

/// Check that `new_numbers` maps `0..n` onto itself.
pub(crate) fn check_permutation(new_numbers: &[usize], n: usize) -> Result<(), MeshTriaError> {
    if new_numbers.len() != n {
        return Err(MeshTriaError::InvalidPermutation(format!(
            "expected {n} entries, found {}",
            new_numbers.len()
        )));
    }
    let mut seen = vec![false; n];
    for (old, &new) in new_numbers.iter().enumerate() {
        match seen.get_mut(new) {
            Some(slot) if !*slot => *slot = true,
            Some(_) => {
                return Err(MeshTriaError::InvalidPermutation(format!(
                    "index {new} assigned twice (at {old})"
                )));
            }
            None => {
                return Err(MeshTriaError::InvalidPermutation(format!(
                    "index {new} at {old} is out of range 0..{n}"
                )));
            }
        }
    }
    Ok(())
}

/// Assigns global DoF indices to the active cells of a triangulation for one
/// finite element.
///
/// The handler borrows the triangulation, so the mesh cannot change while
/// numbers exist for it.
#[derive(Clone, Debug)]
pub struct DoFHandler<'a, const DIM: usize> {
    tria: &'a Triangulation<DIM>,
    fe: Option<FiniteElementData>,
    storage: DofStorage,
    n_dofs: usize,
    distributed: bool,
}

impl<'a, const DIM: usize> DoFHandler<'a, DIM> {
    pub fn new(tria: &'a Triangulation<DIM>) -> Self {
        Self {
            tria,
            fe: None,
            storage: DofStorage::default(),
            n_dofs: 0,
            distributed: false,
        }
    }

    pub fn triangulation(&self) -> &'a Triangulation<DIM> {
        self.tria
    }

    /// Select the element. Existing numbers are dropped.
    pub fn set_fe(&mut self, fe: &impl FiniteElement) {
        self.fe = Some(FiniteElementData::from_element(fe));
        self.storage = DofStorage::default();
        self.n_dofs = 0;
        self.distributed = false;
    }

    pub fn fe(&self) -> Option<&FiniteElementData> {
        self.fe.as_ref()
    }

    fn cell_kind() -> EntityKind {
        EntityKind::from_dimension(DIM).unwrap_or(EntityKind::Hex)
    }

    /// Number all DoFs on active cells.
    pub fn distribute_dofs(&mut self) -> Result<(), MeshTriaError> {
        let fe = self.fe.as_ref().ok_or(MeshTriaError::NoFiniteElement)?;
        let mut storage = DofStorage::new(self.tria, fe.dofs_per_object);
        let mut next = 0;
        for cell in self.tria.active_cells() {
            for local in cell_dof_objects(&cell)? {
                let slots = storage.slice_mut(local.object, Self::cell_kind());
                if slots.first() == Some(&INVALID_DOF_INDEX) {
                    for slot in slots.iter_mut() {
                        *slot = next;
                        next += 1;
                    }
                }
            }
        }
        log::debug!(
            "distributed {} dofs of {} on {} active cells",
            next,
            fe.name,
            self.tria.n_active_cells()
        );
        self.storage = storage;
        self.n_dofs = next;
        self.distributed = true;
        Ok(())
    }

    pub fn is_distributed(&self) -> bool {
        self.distributed
    }

    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    pub fn dofs_per_cell(&self) -> Result<usize, MeshTriaError> {
        self.fe
            .as_ref()
            .map(|fe| fe.dofs_per_cell(DIM))
            .ok_or(MeshTriaError::NoFiniteElement)
    }

    fn check_distributed(&self) -> Result<(), MeshTriaError> {
        if self.distributed {
            Ok(())
        } else {
            Err(MeshTriaError::NotDistributed)
        }
    }

    /// Global indices of an active cell's DoFs in local order.
    pub fn get_dof_indices(&self, cell: &CellAccessor<'_, DIM>) -> Result<Vec<usize>, MeshTriaError> {
        if !ptr::eq(cell.triangulation(), self.tria) {
            return Err(MeshTriaError::ForeignCell {
                level: cell.level(),
                index: cell.index(),
            });
        }
        self.check_distributed()?;
        if !cell.is_active()? {
            return Err(MeshTriaError::InactiveCell {
                level: cell.level(),
                index: cell.index(),
            });
        }
        let mut indices = Vec::new();
        for local in cell_dof_objects(cell)? {
            let slots = self.storage.slice(local.object, Self::cell_kind());
            extend_in_cell_order(local.object, slots, &mut indices);
        }
        Ok(indices)
    }

    pub fn cell_dof_indices(&self, id: CellId) -> Result<Vec<usize>, MeshTriaError> {
        self.get_dof_indices(&self.tria.cell(id)?)
    }

    /// The `i`-th DoF on a vertex.
    pub fn vertex_dof_index(&self, vertex: usize, i: usize) -> Result<usize, MeshTriaError> {
        self.check_distributed()?;
        self.tria.store().vertex(vertex)?;
        let per_vertex = self.storage.counts[0];
        if i >= per_vertex {
            return Err(MeshTriaError::out_of_range("vertex dof", i, per_vertex));
        }
        Ok(self.storage.vertices[vertex * per_vertex + i])
    }

    /// Replace every index `k` by `new_numbers[k]`.
    pub fn renumber(&mut self, new_numbers: &[usize]) -> Result<(), MeshTriaError> {
        self.check_distributed()?;
        check_permutation(new_numbers, self.n_dofs)?;
        for value in self.storage.values_mut() {
            if *value != INVALID_DOF_INDEX {
                *value = new_numbers[*value];
            }
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

    fn cell_fe(&self, _cell: CellId) -> Result<&FiniteElementData, MeshTriaError> {
        self.fe.as_ref().ok_or(MeshTriaError::NoFiniteElement)
    }

    fn renumber(&mut self, new_numbers: &[usize]) -> Result<(), MeshTriaError> {
        DoFHandler::renumber(self, new_numbers)
    }
}
