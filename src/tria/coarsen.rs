//! Coarsening: removing sibling groups and the geometry only they used.

use super::Triangulation;
use super::objects::TriaObjects;
use super::store::MeshStore;
use crate::mesh_error::MeshTriaError;
use crate::topology::entity_kind::EntityKind;

/// Release the children of every object whose whole subtree is
/// unreferenced and every unreferenced root. Sibling groups with at least one
/// referenced member stay together. Returns the number of released slots.
fn prune(objects: &mut TriaObjects, referenced: &[bool]) -> Result<usize, MeshTriaError> {
    let n_children = objects.kind().n_children();
    let mut is_child = vec![false; objects.len()];
    for i in objects.used_indices() {
        if let Some(base) = objects.children_of(i) {
            is_child[base..base + n_children].fill(true);
        }
    }
    let roots: Vec<usize> = objects.used_indices().filter(|&i| !is_child[i]).collect();
    let mut released = 0;
    for root in roots {
        if !visit(objects, referenced, root, n_children, &mut released)? {
            objects.release(root)?;
            released += 1;
        }
    }
    Ok(released)
}

/// Prune below `index` and report whether it or a descendant is referenced.
fn visit(
    objects: &mut TriaObjects,
    referenced: &[bool],
    index: usize,
    n_children: usize,
    released: &mut usize,
) -> Result<bool, MeshTriaError> {
    let mut alive = referenced.get(index).copied().unwrap_or(false);
    if let Some(base) = objects.children_of(index) {
        let mut any_child = false;
        for child in base..base + n_children {
            any_child |= visit(objects, referenced, child, n_children, released)?;
        }
        if !any_child {
            // dead children were already stripped of their own children
            objects.clear_children(index)?;
            for child in base..base + n_children {
                objects.release(child)?;
                *released += 1;
            }
        }
        alive |= any_child;
    }
    Ok(alive)
}

/// Faces of used cells, or lines of used quads when `from_quads` is set.
fn referenced_objects<const DIM: usize>(
    store: &MeshStore<DIM>,
    kind: EntityKind,
    from_quads: bool,
) -> Vec<bool> {
    let len = store.faces().get(kind).map_or(0, TriaObjects::len);
    let mut referenced = vec![false; len];
    if from_quads {
        let quads = store.faces().quads();
        for q in quads.used_indices() {
            for &line in quads.faces_of(q) {
                referenced[line] = true;
            }
        }
    } else {
        for level in store.levels() {
            for cell in level.cells.used_indices() {
                for &face in level.cells.faces_of(cell) {
                    referenced[face] = true;
                }
            }
        }
    }
    referenced
}

impl<const DIM: usize> Triangulation<DIM> {
    /// Remove the children of every parent whose children are all active and
    /// flagged for coarsening. Returns the number of removed cells.
    pub(crate) fn coarsen_flagged(&mut self) -> Result<usize, MeshTriaError> {
        let n_children = 1usize << DIM;
        let mut groups = Vec::new();
        {
            let levels = self.store().levels();
            for l in 0..levels.len().saturating_sub(1) {
                for p in levels[l].cells.used_indices() {
                    let Some(base) = levels[l].cells.children_of(p) else {
                        continue;
                    };
                    let next = &levels[l + 1];
                    let all_flagged = (base..base + n_children).all(|c| {
                        next.cells.used_at(c)
                            && next.cells.children_of(c).is_none()
                            && next.coarsen_flag(c)
                    });
                    if all_flagged {
                        groups.push((l, p, base));
                    }
                }
            }
        }
        if groups.is_empty() {
            return Ok(0);
        }
        let store = self.store_mut();
        for &(l, p, base) in &groups {
            for c in base..base + n_children {
                store.level_mut(l + 1)?.release_cell(c)?;
            }
            store.level_mut(l)?.cells.clear_children(p)?;
        }
        collect_garbage(store)?;
        store.pop_empty_levels();
        Ok(groups.len() * n_children)
    }
}

/// Release faces, lines and vertices no used cell depends on any more.
pub(crate) fn collect_garbage<const DIM: usize>(
    store: &mut MeshStore<DIM>,
) -> Result<(), MeshTriaError> {
    match DIM {
        2 => {
            let referenced = referenced_objects(store, EntityKind::Line, false);
            let released = prune(&mut store.faces_mut().lines, &referenced)?;
            log::trace!("released {released} lines");
        }
        3 => {
            let referenced = referenced_objects(store, EntityKind::Quad, false);
            let quads = prune(&mut store.faces_mut().quads, &referenced)?;
            let referenced = referenced_objects(store, EntityKind::Line, true);
            let lines = prune(&mut store.faces_mut().lines, &referenced)?;
            log::trace!("released {quads} quads and {lines} lines");
        }
        _ => {}
    }

    let mut referenced = vec![false; store.n_vertices()];
    for level in store.levels() {
        for cell in level.cells.used_indices() {
            for &v in level.cells.vertices_of(cell) {
                referenced[v] = true;
            }
        }
    }
    for objects in [store.faces().lines(), store.faces().quads()] {
        for i in objects.used_indices() {
            for &v in objects.vertices_of(i) {
                referenced[v] = true;
            }
        }
    }
    for (v, &r) in referenced.iter().enumerate() {
        if !r && store.vertex_used(v) {
            store.release_vertex(v)?;
        }
    }
    Ok(())
}
