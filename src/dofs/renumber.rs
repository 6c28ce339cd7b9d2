//! Cuthill-McKee ordering of DoFs.
//!
//! Each connected component is numbered breadth-first from a
//! pseudo-peripheral DoF. The next level of the search is ordered by the
//! smallest label among its already-numbered neighbors, then by degree.

use super::DofAccess;
use super::tools::dof_couplings;
use crate::mesh_error::MeshTriaError;

/// Breadth-first level structure rooted at `root`, restricted to unvisited
/// vertices.
fn level_structure(couplings: &[Vec<usize>], root: usize, blocked: &[bool]) -> Vec<Vec<usize>> {
    let mut seen = blocked.to_vec();
    seen[root] = true;
    let mut levels = vec![vec![root]];
    loop {
        let mut next = Vec::new();
        if let Some(last) = levels.last() {
            for &u in last {
                for &v in &couplings[u] {
                    if !seen[v] {
                        seen[v] = true;
                        next.push(v);
                    }
                }
            }
        }
        if next.is_empty() {
            return levels;
        }
        levels.push(next);
    }
}

/// Start from `start` and move to a minimum-degree vertex of the deepest
/// level while the level structure keeps getting deeper.
fn pseudo_peripheral(couplings: &[Vec<usize>], start: usize, blocked: &[bool]) -> usize {
    let degree = |v: usize| couplings[v].len();
    let mut root = start;
    let mut depth = 0;
    loop {
        let levels = level_structure(couplings, root, blocked);
        if levels.len() <= depth {
            return root;
        }
        depth = levels.len();
        root = levels
            .last()
            .and_then(|last| last.iter().copied().min_by_key(|&v| (degree(v), v)))
            .unwrap_or(root);
    }
}

/// Old indices in Cuthill-McKee visiting order.
pub fn cuthill_mckee_order(couplings: &[Vec<usize>]) -> Vec<usize> {
    let n = couplings.len();
    let degree = |v: usize| couplings[v].len();
    let mut label = vec![usize::MAX; n];
    let mut order = Vec::with_capacity(n);
    let mut visited = vec![false; n];
    for start in 0..n {
        if visited[start] {
            continue;
        }
        let root = pseudo_peripheral(couplings, start, &visited);
        visited[root] = true;
        label[root] = order.len();
        order.push(root);
        let mut frontier = vec![root];
        while !frontier.is_empty() {
            let mut next: Vec<(usize, usize, usize)> = Vec::new();
            for &u in &frontier {
                for &v in &couplings[u] {
                    if !visited[v] {
                        visited[v] = true;
                        next.push((label[u], degree(v), v));
                    }
                }
            }
            next.sort_unstable();
            frontier = next.into_iter().map(|(_, _, v)| v).collect();
            for &v in &frontier {
                label[v] = order.len();
                order.push(v);
            }
        }
    }
    order
}

/// Renumber `dofs` in Cuthill-McKee order, reversed if asked.
pub fn cuthill_mckee<const DIM: usize, H: DofAccess<DIM>>(
    dofs: &mut H,
    reversed: bool,
) -> Result<(), MeshTriaError> {
    let couplings = dof_couplings(&*dofs)?;
    let order = cuthill_mckee_order(&couplings);
    let n = order.len();
    let mut new_numbers = vec![0; n];
    for (position, &old) in order.iter().enumerate() {
        new_numbers[old] = if reversed { n - 1 - position } else { position };
    }
    log::debug!(
        "{}Cuthill-McKee renumbering of {} dofs",
        if reversed { "reverse " } else { "" },
        n
    );
    dofs.renumber(&new_numbers)
}
