//! Rebuilding the neighbor tables of all levels.
//!
//! Two used cells of one level are neighbors when they share a face object
//! (a vertex in 1-D). A face with a single cell on its level inherits the
//! neighbor of the parent when the cell lies on the matching parent face,
//! which yields the coarser neighbor next to a refined region; on level 0 it
//! is the boundary.

use hashbrown::HashMap;

use super::CellId;
use super::store::MeshStore;
use crate::topology::geometry_info::child_touches_face;

pub(crate) fn rebuild_neighbors<const DIM: usize>(store: &mut MeshStore<DIM>) {
    let n_faces = 2 * DIM;
    let n_children = 1usize << DIM;
    for l in 0..store.n_levels() {
        let assignments = {
            let levels = store.levels();
            let level = &levels[l];
            let mut by_face: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
            for cell in level.cells.used_indices() {
                let keys = if DIM == 1 {
                    level.cells.vertices_of(cell)
                } else {
                    level.cells.faces_of(cell)
                };
                for (face, &key) in keys.iter().enumerate().take(n_faces) {
                    by_face.entry(key).or_default().push((cell, face));
                }
            }

            let mut assignments = Vec::new();
            for sharing in by_face.values() {
                match sharing.as_slice() {
                    &[(a, fa), (b, fb)] => {
                        assignments.push((a, fa, Some(CellId::new(l, b))));
                        assignments.push((b, fb, Some(CellId::new(l, a))));
                    }
                    &[(cell, face)] => {
                        let inherited = if l == 0 {
                            None
                        } else {
                            level.parent(cell).and_then(|p| {
                                let parent_level = &levels[l - 1];
                                let base = parent_level.cells.children_of(p)?;
                                let child = cell.checked_sub(base).filter(|&c| c < n_children)?;
                                if child_touches_face(child, face) {
                                    parent_level.neighbor(p, face)
                                } else {
                                    None
                                }
                            })
                        };
                        assignments.push((cell, face, inherited));
                    }
                    // more than two cells per face is rejected on creation
                    _ => {
                        for &(cell, face) in sharing {
                            assignments.push((cell, face, None));
                        }
                    }
                }
            }
            assignments
        };

        let level = &mut store.levels_mut()[l];
        level.clear_neighbors();
        for (cell, face, neighbor) in assignments {
            level.set_neighbor(cell, face, neighbor);
        }
    }
}
