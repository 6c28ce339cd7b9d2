//! Level-structured triangulations of tensor-product cells.
//!
//! A [`Triangulation`] owns a [`MeshStore`] and provides the operations that
//! keep it consistent: coarse mesh creation, refinement closure, execution of
//! refinement and coarsening, neighbor maintenance and navigation through
//! accessors and iterators.

pub mod accessor;
mod closure;
mod coarsen;
mod create;
pub mod flags;
pub mod generators;
pub mod iterator;
pub mod levels;
mod lookup;
mod neighbors;
pub mod objects;
mod refine;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::debug_invariants::{DebugInvariants, ensure};
use crate::mesh_error::MeshTriaError;
use crate::topology::entity_kind::EntityKind;
use crate::topology::geometry_info::GeometryInfo;

pub use accessor::{CellAccessor, CellMut, EntityAccessor};
pub use create::CellData;
pub use flags::RefinementFlags;
pub use iterator::{CellIterator, IteratorFilter};
pub use store::MeshStore;

/// Address of a cell: its level and its index within that level.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellId {
    pub level: usize,
    pub index: usize,
}

impl CellId {
    pub const fn new(level: usize, index: usize) -> Self {
        Self { level, index }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.level, self.index)
    }
}

/// How the refinement closure constrains neighboring cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalancePolicy {
    /// Face-adjacent active cells differ by at most one level.
    #[default]
    FaceTwoToOne,
    /// Only sibling groups are kept consistent for coarsening.
    Unbalanced,
}

/// Configuration of a [`Triangulation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangulationOptions {
    pub balance: BalancePolicy,
    /// Cells on this level or finer are never refined further.
    pub max_level: Option<usize>,
    /// Upper bound on closure passes. `None` means `2 * n_active_cells + 2`.
    pub max_closure_passes: Option<usize>,
    /// Validate the store after every refinement execution.
    pub check_invariants: bool,
}

impl Default for TriangulationOptions {
    fn default() -> Self {
        Self {
            balance: BalancePolicy::FaceTwoToOne,
            max_level: None,
            max_closure_passes: None,
            check_invariants: false,
        }
    }
}

/// A hierarchy of refined `DIM`-dimensional hypercube cells.
#[derive(Debug, Clone, Default)]
pub struct Triangulation<const DIM: usize> {
    store: MeshStore<DIM>,
    options: TriangulationOptions,
}

pub type LineTriangulation = Triangulation<1>;
pub type QuadTriangulation = Triangulation<2>;
pub type HexTriangulation = Triangulation<3>;

impl<const DIM: usize> Triangulation<DIM> {
    const DIM_SUPPORTED: () = assert!(
        DIM >= 1 && DIM <= 3,
        "triangulations exist in one, two and three dimensions"
    );

    pub fn new() -> Self {
        Self::with_options(TriangulationOptions::default())
    }

    pub fn with_options(options: TriangulationOptions) -> Self {
        let () = Self::DIM_SUPPORTED;
        Self {
            store: MeshStore::new(),
            options,
        }
    }

    pub fn options(&self) -> &TriangulationOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: TriangulationOptions) {
        self.options = options;
    }

    pub fn store(&self) -> &MeshStore<DIM> {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut MeshStore<DIM> {
        &mut self.store
    }

    /// Remove all cells, faces and vertices.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.store.levels().iter().all(|l| l.cells.n_used() == 0)
    }

    pub fn n_levels(&self) -> usize {
        self.store.n_levels()
    }

    pub(crate) fn is_active_cell(&self, id: CellId) -> bool {
        self.store.levels().get(id.level).is_some_and(|l| {
            l.cells.used_at(id.index) && l.cells.children_of(id.index).is_none()
        })
    }

    pub(crate) fn is_used_cell(&self, id: CellId) -> bool {
        self.store
            .levels()
            .get(id.level)
            .is_some_and(|l| l.cells.used_at(id.index))
    }

    /// Active cells of all levels in level-major order.
    pub(crate) fn active_cell_ids(&self) -> Vec<CellId> {
        let mut ids = Vec::new();
        for (l, level) in self.store.levels().iter().enumerate() {
            for i in level.cells.used_indices() {
                if level.cells.children_of(i).is_none() {
                    ids.push(CellId::new(l, i));
                }
            }
        }
        ids
    }

    pub fn n_active_cells(&self) -> usize {
        (0..self.n_levels())
            .map(|l| self.count_on_level(l, true))
            .sum()
    }

    fn count_on_level(&self, level: usize, active_only: bool) -> usize {
        self.store.levels().get(level).map_or(0, |l| {
            l.cells
                .used_indices()
                .filter(|&i| !active_only || l.cells.children_of(i).is_none())
                .count()
        })
    }

    /// Used cells on `level`.
    pub fn n_cells(&self, level: usize) -> Result<usize, MeshTriaError> {
        self.store.level(level)?;
        Ok(self.count_on_level(level, false))
    }

    /// Used cells over all levels.
    pub fn n_total_cells(&self) -> usize {
        (0..self.n_levels())
            .map(|l| self.count_on_level(l, false))
            .sum()
    }

    pub fn n_active_cells_on_level(&self, level: usize) -> Result<usize, MeshTriaError> {
        self.store.level(level)?;
        Ok(self.count_on_level(level, true))
    }

    /// Cell slots on `level`, used or not.
    pub fn n_raw_cells(&self, level: usize) -> Result<usize, MeshTriaError> {
        Ok(self.store.level(level)?.len())
    }

    /// Vertex slots, used or not.
    pub fn n_vertices(&self) -> usize {
        self.store.n_vertices()
    }

    pub fn n_used_vertices(&self) -> usize {
        self.store.n_used_vertices()
    }

    fn n_objects(&self, kind: EntityKind, active_only: bool) -> usize {
        if kind.dimension() > DIM {
            return 0;
        }
        if kind.dimension() == DIM {
            return if active_only {
                self.n_active_cells()
            } else {
                self.n_total_cells()
            };
        }
        self.store.faces().get(kind).map_or(0, |objects| {
            objects
                .used_indices()
                .filter(|&i| !active_only || objects.children_of(i).is_none())
                .count()
        })
    }

    /// Used lines, counting cells in one dimension.
    pub fn n_lines(&self) -> usize {
        self.n_objects(EntityKind::Line, false)
    }

    /// Used lines without children.
    pub fn n_active_lines(&self) -> usize {
        self.n_objects(EntityKind::Line, true)
    }

    /// Used quads, counting cells in two dimensions.
    pub fn n_quads(&self) -> usize {
        self.n_objects(EntityKind::Quad, false)
    }

    pub fn n_active_quads(&self) -> usize {
        self.n_objects(EntityKind::Quad, true)
    }

    pub fn n_hexes(&self) -> usize {
        self.n_objects(EntityKind::Hex, false)
    }

    /// Clear the refine flag of every cell.
    pub fn clear_refine_flags(&mut self) {
        for level in self.store.levels_mut() {
            level.refine_flags_mut().fill(false);
        }
    }

    /// Clear the coarsen flag of every cell.
    pub fn clear_coarsen_flags(&mut self) {
        for level in self.store.levels_mut() {
            level.coarsen_flags_mut().fill(false);
        }
    }

    /// Largest level difference between face-adjacent active cells.
    pub fn max_level_jump(&self) -> usize {
        let mut jump = 0;
        for id in self.active_cell_ids() {
            for face in 0..GeometryInfo::<DIM>::FACES_PER_CELL {
                if let Some(n) = self.store.levels()[id.level].neighbor(id.index, face) {
                    jump = jump.max(id.level.abs_diff(n.level));
                }
            }
        }
        jump
    }
}

impl<const DIM: usize> DebugInvariants for Triangulation<DIM> {
    fn validate_invariants(&self) -> Result<(), MeshTriaError> {
        self.store.validate_invariants()?;
        let levels = self.store.levels();
        for (l, level) in levels.iter().enumerate() {
            for i in level.cells.used_indices() {
                if l > 0 {
                    let parent = level.parent(i);
                    ensure(
                        parent.is_some_and(|p| {
                            levels[l - 1].cells.children_of(p).is_some_and(|base| {
                                base <= i && i < base + GeometryInfo::<DIM>::CHILDREN_PER_CELL
                            })
                        }),
                        || format!("cell ({l}, {i}) is not a child of its parent"),
                    )?;
                }
                for face in 0..GeometryInfo::<DIM>::FACES_PER_CELL {
                    let Some(n) = level.neighbor(i, face) else {
                        continue;
                    };
                    ensure(self.is_used_cell(n) && n.level <= l, || {
                        format!("cell ({l}, {i}) has invalid neighbor {n} across face {face}")
                    })?;
                    if n.level == l {
                        let back = (0..GeometryInfo::<DIM>::FACES_PER_CELL)
                            .any(|g| levels[l].neighbor(n.index, g) == Some(CellId::new(l, i)));
                        ensure(back, || {
                            format!("neighbor {n} of cell ({l}, {i}) does not point back")
                        })?;
                    }
                }
            }
        }
        if self.options.balance == BalancePolicy::FaceTwoToOne {
            let jump = self.max_level_jump();
            ensure(jump <= 1, || {
                format!("face-adjacent active cells differ by {jump} levels")
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_strict_balance() {
        let options = TriangulationOptions::default();
        assert_eq!(options.balance, BalancePolicy::FaceTwoToOne);
        assert_eq!(options.max_level, None);
        let json = serde_json::to_string(&options).unwrap();
        let back: TriangulationOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }

    #[test]
    fn empty_triangulation_counts() {
        let tria = QuadTriangulation::new();
        assert!(tria.is_empty());
        assert_eq!(tria.n_levels(), 0);
        assert_eq!(tria.n_active_cells(), 0);
        assert!(tria.n_cells(0).is_err());
        assert_eq!(CellId::new(2, 5).to_string(), "(2, 5)");
    }
}
