//! Executing refinement and coarsening.
//!
//! An object of dimension `k` is split on a `3^k` grid of vertices: grid
//! point `t` (one ternary digit per axis) is a corner when no digit is `1`,
//! otherwise the midpoint of the sub-object spanned by the axes whose digit is
//! `1`. Midpoints of bounding faces and lines come from their own refinement,
//! which therefore always happens first, so neighbors that are refined later
//! reuse the same vertices and face children.

use super::lookup::ObjectLookup;
use super::neighbors::rebuild_neighbors;
use super::store::MeshStore;
use super::{CellId, Triangulation};
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshTriaError;
use crate::topology::entity_kind::EntityKind;
use crate::topology::geometry_info::face_vertex_unchecked;
use crate::topology::orientation::orientation_of;

/// Position of vertex `w` of child `child` on the `3^k` subdivision grid.
fn grid_index(k: usize, child: usize, w: usize) -> usize {
    let mut index = 0;
    let mut stride = 1;
    for axis in 0..k {
        index += (((child >> axis) & 1) + ((w >> axis) & 1)) * stride;
        stride *= 3;
    }
    index
}

/// Vertex indices of the `3^k` subdivision grid of an object.
fn subdivision_grid(
    k: usize,
    corners: &[usize],
    lookup: &ObjectLookup,
    center: usize,
) -> Result<Vec<usize>, MeshTriaError> {
    let full = (1usize << k) - 1;
    let n = 3usize.pow(k as u32);
    let mut grid = Vec::with_capacity(n);
    for g in 0..n {
        let mut mid = 0;
        let mut side = 0;
        let mut rest = g;
        for axis in 0..k {
            match rest % 3 {
                1 => mid |= 1 << axis,
                2 => side |= 1 << axis,
                _ => {}
            }
            rest /= 3;
        }
        let vertex = if mid == 0 {
            corners[side]
        } else if mid == full {
            center
        } else {
            let sub: Vec<usize> = (0..corners.len())
                .filter(|&v| v & !mid == side)
                .map(|v| corners[v])
                .collect();
            lookup.center(&sub).ok_or_else(|| {
                MeshTriaError::InvariantViolation(format!(
                    "sub-object with vertices {sub:?} is not refined"
                ))
            })?
        };
        grid.push(vertex);
    }
    Ok(grid)
}

/// Add a vertex at the average of `corners`.
fn add_center<const DIM: usize>(store: &mut MeshStore<DIM>, corners: &[usize]) -> usize {
    let mut point = [0.0; DIM];
    for &c in corners {
        let p = store.vertex_at(c);
        for (x, y) in point.iter_mut().zip(p) {
            *x += y;
        }
    }
    for x in &mut point {
        *x /= corners.len() as f64;
    }
    store.add_vertex(point)
}

/// Vertices of `face` of an object with vertices `vertices`.
fn face_vertices(vertices: &[usize], face: usize) -> Vec<usize> {
    (0..vertices.len() / 2)
        .map(|j| vertices[face_vertex_unchecked(face, j)])
        .collect()
}

/// Refine a line or quad of the face store, refining its lines first.
pub(crate) fn refine_face<const DIM: usize>(
    store: &mut MeshStore<DIM>,
    lookup: &mut ObjectLookup,
    kind: EntityKind,
    index: usize,
) -> Result<(), MeshTriaError> {
    let objects = store.objects(0, kind)?;
    if objects.children(index)?.is_some() {
        return Ok(());
    }
    let corners = objects.vertex_indices(index)?.to_vec();
    let lines = objects.faces_of(index).to_vec();
    for line in lines {
        refine_face(store, lookup, EntityKind::Line, line)?;
    }

    let k = kind.dimension();
    let center = add_center(store, &corners);
    let grid = subdivision_grid(k, &corners, lookup, center)?;
    let n_children = kind.n_children();
    let base = store.objects_mut(0, kind)?.allocate(n_children);
    for child in 0..n_children {
        let vertices: Vec<usize> = (0..corners.len())
            .map(|w| grid[grid_index(k, child, w)])
            .collect();
        let mut faces = Vec::new();
        if kind == EntityKind::Quad {
            for f in 0..4 {
                let line = face_vertices(&vertices, f);
                faces.push(lookup.find_or_create(store, EntityKind::Line, &line)?);
            }
        }
        store
            .objects_mut(0, kind)?
            .set_object(base + child, &vertices, &faces);
        lookup.insert(kind, &vertices, base + child);
    }
    store.objects_mut(0, kind)?.set_children(index, base)?;
    lookup.insert_center(&corners, center);
    Ok(())
}

/// Split one active cell into `2^DIM` children on the next level.
pub(crate) fn refine_cell<const DIM: usize>(
    store: &mut MeshStore<DIM>,
    lookup: &mut ObjectLookup,
    id: CellId,
) -> Result<(), MeshTriaError> {
    let level = store.level(id.level)?;
    if level.cells.children(id.index)?.is_some() {
        return Err(MeshTriaError::InactiveCell {
            level: id.level,
            index: id.index,
        });
    }
    let corners = level.cells.vertex_indices(id.index)?.to_vec();
    let faces = level.cells.faces_of(id.index).to_vec();
    let face_kind = MeshStore::<DIM>::face_kind();
    if DIM >= 2 {
        for &face in &faces {
            refine_face(store, lookup, face_kind, face)?;
        }
    }

    let center = add_center(store, &corners);
    let grid = subdivision_grid(DIM, &corners, lookup, center)?;
    let child_level = id.level + 1;
    if child_level == store.n_levels() {
        store.allocate_level();
    }
    let n_children = 1usize << DIM;
    let base = store.level_mut(child_level)?.allocate_cells(n_children);
    for child in 0..n_children {
        let vertices: Vec<usize> = (0..n_children)
            .map(|w| grid[grid_index(DIM, child, w)])
            .collect();
        let mut child_faces = Vec::new();
        let mut orientations = Vec::new();
        if DIM >= 2 {
            for f in 0..2 * DIM {
                let expected = face_vertices(&vertices, f);
                let face = lookup.find_or_create(store, face_kind, &expected)?;
                let stored = store.objects(0, face_kind)?.vertices_of(face);
                orientations.push(orientation_of(face_kind, stored, &expected)?);
                child_faces.push(face);
            }
        }
        let level = store.level_mut(child_level)?;
        level.cells.set_object(base + child, &vertices, &child_faces);
        level.set_parent(base + child, Some(id.index));
        for (f, &o) in orientations.iter().enumerate() {
            level.set_face_orientation(base + child, f, o);
        }
    }
    let level = store.level_mut(id.level)?;
    level.cells.set_children(id.index, base)?;
    level.set_refine_flag(id.index, false);
    level.set_coarsen_flag(id.index, false);
    Ok(())
}

impl<const DIM: usize> Triangulation<DIM> {
    /// Apply the refinement closure, coarsen and refine all flagged cells and
    /// rebuild neighbor information.
    ///
    /// An error leaves the triangulation in an unspecified state.
    pub fn execute_coarsening_and_refinement(&mut self) -> Result<(), MeshTriaError> {
        let passes = self.closure()?.1;
        let coarsened = self.coarsen_flagged()?;
        let refined = self.refine_flagged()?;
        rebuild_neighbors(self.store_mut());
        log::debug!(
            "refinement executed: {refined} cells refined, {coarsened} cells coarsened, \
             {passes} closure passes, {} levels, {} active cells",
            self.n_levels(),
            self.n_active_cells()
        );
        if self.options().check_invariants {
            self.validate_invariants()?;
        }
        self.debug_assert_invariants();
        Ok(())
    }

    /// Refine every active cell `times` times.
    pub fn refine_global(&mut self, times: usize) -> Result<(), MeshTriaError> {
        for _ in 0..times {
            for id in self.active_cell_ids() {
                self.store_mut()
                    .level_mut(id.level)?
                    .set_refine_flag(id.index, true);
            }
            self.execute_coarsening_and_refinement()?;
        }
        Ok(())
    }

    fn refine_flagged(&mut self) -> Result<usize, MeshTriaError> {
        let flagged: Vec<CellId> = self
            .active_cell_ids()
            .into_iter()
            .filter(|id| self.store().levels()[id.level].refine_flag(id.index))
            .collect();
        if flagged.is_empty() {
            return Ok(0);
        }
        let mut lookup = ObjectLookup::from_store(self.store());
        for &id in &flagged {
            refine_cell(self.store_mut(), &mut lookup, id)?;
        }
        Ok(flagged.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tria::CellData;

    fn unit_square() -> Triangulation<2> {
        let mut tria = Triangulation::<2>::new();
        tria.create_triangulation(
            vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            &[CellData::new([0, 1, 2, 3])],
        )
        .unwrap();
        tria
    }

    #[test]
    fn grid_positions() {
        assert_eq!(grid_index(2, 0, 3), 4);
        assert_eq!(grid_index(2, 3, 3), 8);
        assert_eq!(grid_index(1, 1, 0), 1);
    }

    #[test]
    fn refining_a_square_once() {
        let mut tria = unit_square();
        tria.refine_global(1).unwrap();
        assert_eq!(tria.n_levels(), 2);
        assert_eq!(tria.n_active_cells(), 4);
        assert_eq!(tria.n_used_vertices(), 9);
        assert_eq!(tria.n_lines(), 16);
        assert_eq!(tria.n_active_lines(), 12);
        let level = tria.store().level(1).unwrap();
        // child 0 touches the old vertex 0, child 3 the old vertex 3
        assert_eq!(level.cells().vertex_indices(0).unwrap()[0], 0);
        assert_eq!(level.cells().vertex_indices(3).unwrap()[3], 3);
        assert_eq!(tria.store().vertex(level.cells().vertex_indices(0).unwrap()[3]).unwrap(), [0.5, 0.5]);
        assert_eq!(level.neighbor(0, 1), Some(CellId::new(1, 1)));
        assert_eq!(level.neighbor(0, 0), None);
    }

    #[test]
    fn refining_an_active_cell_twice_is_rejected() {
        let mut tria = unit_square();
        tria.refine_global(1).unwrap();
        let mut lookup = ObjectLookup::from_store(tria.store());
        assert_eq!(
            refine_cell(tria.store_mut(), &mut lookup, CellId::new(0, 0)),
            Err(MeshTriaError::InactiveCell { level: 0, index: 0 })
        );
    }
}
