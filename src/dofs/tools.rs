//! Queries over distributed DoFs.

use itertools::Itertools;

use super::DofAccess;
use super::fe::FiniteElement;
use super::layout::{cell_dof_objects, is_on_face};
use crate::mesh_error::MeshTriaError;
use crate::topology::geometry_info::GeometryInfo;

/// Sorted indices of all DoFs located on the boundary of the domain.
pub fn extract_boundary_dofs<const DIM: usize, H: DofAccess<DIM>>(
    dofs: &H,
) -> Result<Vec<usize>, MeshTriaError> {
    let mut boundary = Vec::new();
    for cell in dofs.triangulation().active_cells() {
        let mut faces = Vec::new();
        for f in 0..GeometryInfo::<DIM>::FACES_PER_CELL {
            if cell.at_boundary(f)? {
                faces.push(f);
            }
        }
        if faces.is_empty() {
            continue;
        }
        let fe = dofs.cell_fe(cell.id())?;
        let indices = dofs.cell_dof_indices(cell.id())?;
        let mut offset = 0;
        for local in cell_dof_objects(&cell)? {
            let count = fe.dofs_per_object(local.kind);
            if faces.iter().any(|&f| is_on_face::<DIM>(&local, f)) {
                boundary.extend_from_slice(&indices[offset..offset + count]);
            }
            offset += count;
        }
    }
    Ok(boundary.into_iter().sorted_unstable().dedup().collect())
}

/// For every DoF, the sorted DoFs sharing a cell with it (itself included).
pub fn dof_couplings<const DIM: usize, H: DofAccess<DIM>>(
    dofs: &H,
) -> Result<Vec<Vec<usize>>, MeshTriaError> {
    let mut couplings = vec![Vec::new(); dofs.n_dofs()];
    for cell in dofs.triangulation().active_cells() {
        let indices = dofs.cell_dof_indices(cell.id())?;
        for &row in &indices {
            couplings[row].extend_from_slice(&indices);
        }
    }
    Ok(couplings
        .into_iter()
        .map(|row| row.into_iter().sorted_unstable().dedup().collect())
        .collect())
}

/// Largest `|i - j|` over coupled DoFs.
pub fn bandwidth(couplings: &[Vec<usize>]) -> usize {
    couplings
        .iter()
        .enumerate()
        .flat_map(|(i, row)| row.iter().map(move |&j| i.abs_diff(j)))
        .max()
        .unwrap_or(0)
}
