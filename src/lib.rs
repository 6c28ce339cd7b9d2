//! # mesh-tria
//!
//! mesh-tria stores hierarchies of tensor-product meshes (lines, quadrilaterals,
//! hexahedra) for finite element codes. A mesh starts from a set of coarse
//! cells and grows by isotropic refinement; cells can later be coarsened back
//! to their parents. On top of the mesh it numbers degrees of freedom for a
//! single finite element or, in hp mode, for an element chosen per cell.
//!
//! ## Layout
//! - [`topology`]: reference-cell tables (vertices, faces, lines, children)
//!   and orientation rules, independent of any mesh.
//! - [`tria`]: the level store, refinement and coarsening, accessors and
//!   iterators.
//! - [`dofs`]: DoF distribution, hp handlers, boundary extraction and
//!   renumbering.
//!
//! ## Invariants
//! Every mutating entry point re-validates the store in debug builds. Enable
//! the `check-invariants` feature to keep those checks in release builds.
//!
//! ```
//! use mesh_tria::prelude::*;
//!
//! let mut tria = QuadTriangulation::new();
//! hyper_cube(&mut tria, 0.0, 1.0).unwrap();
//! tria.refine_global(2).unwrap();
//! assert_eq!(tria.n_active_cells(), 16);
//!
//! let mut dofs = DoFHandler::new(&tria);
//! dofs.set_fe(&FiniteElementData::lagrange(1).unwrap());
//! dofs.distribute_dofs().unwrap();
//! assert_eq!(dofs.n_dofs(), 25);
//! ```

pub mod debug_invariants;
pub mod dofs;
pub mod mesh_error;
pub mod topology;
pub mod tria;

pub use debug_invariants::DebugInvariants;

/// The types most programs need.
pub mod prelude {
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::dofs::tools::{dof_couplings, extract_boundary_dofs};
    pub use crate::dofs::{
        DoFHandler, DofAccess, FeCollection, FiniteElement, FiniteElementData, hp,
    };
    pub use crate::mesh_error::MeshTriaError;
    pub use crate::topology::{EntityKind, GeometryInfo};
    pub use crate::tria::generators::{hyper_cube, subdivided_hyper_cube, subdivided_hyper_rectangle};
    pub use crate::tria::{
        BalancePolicy, CellAccessor, CellData, CellId, CellIterator, CellMut, EntityAccessor,
        HexTriangulation, IteratorFilter, LineTriangulation, QuadTriangulation, RefinementFlags,
        Triangulation, TriangulationOptions,
    };
}
