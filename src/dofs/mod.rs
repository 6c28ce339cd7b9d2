//! Degrees of freedom on active cells.
//!
//! [`handler::DoFHandler`] numbers the DoFs of one finite element,
//! [`hp::DoFHandler`] lets every active cell pick its own element from a
//! collection. Both borrow the triangulation they number, and both are
//! reachable through [`DofAccess`] for the helpers in [`tools`] and
//! [`renumber`].

pub mod fe;
pub mod handler;
pub mod hp;
pub mod layout;
pub mod renumber;
pub mod tools;

pub use fe::{FeCollection, FiniteElement, FiniteElementData};
pub use handler::{DoFHandler, INVALID_DOF_INDEX};

use crate::mesh_error::MeshTriaError;
use crate::tria::{CellId, Triangulation};

/// Read access to distributed DoFs, plus renumbering.
pub trait DofAccess<const DIM: usize> {
    fn triangulation(&self) -> &Triangulation<DIM>;

    fn n_dofs(&self) -> usize;

    /// Global indices of an active cell in local order.
    fn cell_dof_indices(&self, cell: CellId) -> Result<Vec<usize>, MeshTriaError>;

    /// The element used on an active cell.
    fn cell_fe(&self, cell: CellId) -> Result<&FiniteElementData, MeshTriaError>;

    /// Replace every index `k` by `new_numbers[k]`.
    fn renumber(&mut self, new_numbers: &[usize]) -> Result<(), MeshTriaError>;
}
