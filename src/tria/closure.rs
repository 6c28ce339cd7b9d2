//! Refinement closure: making refine and coarsen flags consistent.
//!
//! Flags only move in one direction during the iteration: coarsen flags get
//! cleared and refine flags get set. The single exception is a refine flag
//! withdrawn because the neighbor it would need refined sits at the level
//! limit. The pass count is bounded regardless and exceeding the bound is
//! reported as [`MeshTriaError::ClosureDidNotConverge`].

use super::{BalancePolicy, CellId, Triangulation};
use crate::mesh_error::MeshTriaError;
use crate::topology::geometry_info::child_touches_face;

impl<const DIM: usize> Triangulation<DIM> {
    /// Run the closure without executing anything. Returns whether any flag
    /// changed.
    pub fn prepare_coarsening_and_refinement(&mut self) -> Result<bool, MeshTriaError> {
        Ok(self.closure()?.0)
    }

    /// Returns whether any flag changed and the number of passes used.
    pub(crate) fn closure(&mut self) -> Result<(bool, usize), MeshTriaError> {
        let before = (self.save_refine_flags(), self.save_coarsen_flags());
        self.sanitize_flags();

        let bound = self
            .options()
            .max_closure_passes
            .unwrap_or(2 * self.n_active_cells() + 2);
        let mut passes = 0;
        loop {
            if passes >= bound {
                return Err(MeshTriaError::ClosureDidNotConverge { passes });
            }
            passes += 1;
            let mut changed = self.enforce_sibling_coarsening();
            if self.options().balance == BalancePolicy::FaceTwoToOne {
                changed |= self.enforce_face_balance();
            }
            log::trace!("closure pass {passes}: flags changed = {changed}");
            if !changed {
                break;
            }
        }
        let after = (self.save_refine_flags(), self.save_coarsen_flags());
        Ok((before != after, passes))
    }

    /// Drop flags that can never be executed.
    fn sanitize_flags(&mut self) {
        let max_level = self.options().max_level;
        for (l, level) in self.store_mut().levels_mut().iter_mut().enumerate() {
            for i in 0..level.len() {
                let active = level.cells.used_at(i) && level.cells.children_of(i).is_none();
                if !active {
                    level.set_refine_flag(i, false);
                    level.set_coarsen_flag(i, false);
                    continue;
                }
                if max_level.is_some_and(|m| l >= m) {
                    level.set_refine_flag(i, false);
                }
                if l == 0 || level.refine_flag(i) {
                    level.set_coarsen_flag(i, false);
                }
            }
        }
    }

    /// Keep coarsen flags only on complete groups of active siblings.
    fn enforce_sibling_coarsening(&mut self) -> bool {
        let n_children = 1usize << DIM;
        let mut changed = false;
        let levels = self.store_mut().levels_mut();
        for l in 0..levels.len().saturating_sub(1) {
            let parents: Vec<usize> = levels[l]
                .cells
                .used_indices()
                .filter_map(|p| levels[l].cells.children_of(p))
                .collect();
            let next = &mut levels[l + 1];
            for base in parents {
                let group = base..base + n_children;
                if !group.clone().any(|c| next.coarsen_flag(c)) {
                    continue;
                }
                let complete = group.clone().all(|c| {
                    next.cells.used_at(c) && next.cells.children_of(c).is_none() && next.coarsen_flag(c)
                });
                if !complete {
                    for c in group {
                        next.set_coarsen_flag(c, false);
                    }
                    changed = true;
                }
            }
        }
        changed
    }

    fn proposed_level(&self, id: CellId) -> isize {
        let level = &self.store().levels()[id.level];
        id.level as isize + level.refine_flag(id.index) as isize
            - level.coarsen_flag(id.index) as isize
    }

    /// Active cells sharing (part of) `face` of the active cell `id`.
    pub(crate) fn active_neighbors_across(&self, id: CellId, face: usize) -> Vec<CellId> {
        let levels = self.store().levels();
        let Some(neighbor) = levels[id.level].neighbor(id.index, face) else {
            return Vec::new();
        };
        if self.is_active_cell(neighbor) {
            return vec![neighbor];
        }
        if neighbor.level != id.level {
            return Vec::new();
        }
        let Some(back) = (0..2 * DIM)
            .find(|&g| levels[neighbor.level].neighbor(neighbor.index, g) == Some(id))
        else {
            return Vec::new();
        };
        let mut found = Vec::new();
        let mut stack = vec![neighbor];
        while let Some(cell) = stack.pop() {
            let Some(base) = levels[cell.level].cells.children_of(cell.index) else {
                found.push(cell);
                continue;
            };
            for child in 0..1usize << DIM {
                if child_touches_face(child, back) {
                    stack.push(CellId::new(cell.level + 1, base + child));
                }
            }
        }
        found
    }

    /// Refine or stop coarsening neighbors that would end up more than one
    /// level coarser than a face-adjacent cell.
    fn enforce_face_balance(&mut self) -> bool {
        let max_level = self.options().max_level;
        let mut changed = false;
        for id in self.active_cell_ids() {
            for face in 0..2 * DIM {
                for n in self.active_neighbors_across(id, face) {
                    if self.proposed_level(id) <= self.proposed_level(n) + 1 {
                        continue;
                    }
                    let can_refine = max_level.is_none_or(|m| n.level < m);
                    let store = self.store_mut();
                    let levels = store.levels_mut();
                    if levels[n.level].coarsen_flag(n.index) {
                        levels[n.level].set_coarsen_flag(n.index, false);
                        changed = true;
                    } else if !levels[n.level].refine_flag(n.index) && can_refine {
                        levels[n.level].set_refine_flag(n.index, true);
                        changed = true;
                    } else if levels[id.level].refine_flag(id.index) {
                        levels[id.level].set_refine_flag(id.index, false);
                        changed = true;
                    }
                }
            }
        }
        changed
    }
}
