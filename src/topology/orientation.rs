//! Orientation of shared lines and quads relative to the cells using them.
//!
//! A line or quad is stored once, with one fixed vertex ordering, and is
//! referenced by every cell bounded by it. A cell expects the vertices of its
//! face or line in the order of its own reference tables. The two orders are
//! related either by the identity (`true`) or by the one supported
//! reorientation (`false`): a reversal for lines and a transposition
//! (`[0, 2, 1, 3]`) for quads.

use crate::mesh_error::MeshTriaError;
use crate::topology::entity_kind::EntityKind;

/// Transposition of a quad's lexicographic vertex order.
const QUAD_TRANSPOSE: [usize; 4] = [0, 2, 1, 3];

/// Relation between the `stored` vertex order of an entity and the order
/// `expected` by a cell.
///
/// Returns `true` for identical orders, `false` for the supported
/// reorientation and [`MeshTriaError::UnsupportedOrientation`] otherwise.
pub fn orientation_of(
    kind: EntityKind,
    stored: &[usize],
    expected: &[usize],
) -> Result<bool, MeshTriaError> {
    let unsupported = || MeshTriaError::UnsupportedOrientation {
        kind,
        stored: stored.to_vec(),
        expected: expected.to_vec(),
    };
    if stored.len() != kind.n_vertices() || expected.len() != kind.n_vertices() {
        return Err(unsupported());
    }
    if stored == expected {
        return Ok(true);
    }
    let flipped = match kind {
        EntityKind::Vertex => false,
        EntityKind::Line => stored[0] == expected[1] && stored[1] == expected[0],
        EntityKind::Quad => (0..4).all(|i| stored[i] == expected[QUAD_TRANSPOSE[i]]),
        EntityKind::Hex => false,
    };
    if flipped { Ok(false) } else { Err(unsupported()) }
}

/// Map vertex `local` of an entity in the cell's frame to the entity's
/// stored frame.
pub const fn to_stored_vertex(kind: EntityKind, local: usize, orientation: bool) -> usize {
    if orientation {
        return local;
    }
    match kind {
        EntityKind::Line => 1 - local,
        EntityKind::Quad => QUAD_TRANSPOSE[local],
        _ => local,
    }
}

/// Position in the stored frame of DoF `local` among the `count` DoFs inside
/// a quad, when read in the cell's frame.
///
/// The DoFs form a lexicographic `m x m` grid and the reorientation
/// transposes it. Counts that are not a perfect square keep stored order.
pub const fn to_stored_quad_dof(count: usize, local: usize, orientation: bool) -> usize {
    if orientation {
        return local;
    }
    let mut m = 0;
    while (m + 1) * (m + 1) <= count {
        m += 1;
    }
    if m == 0 || m * m != count {
        return local;
    }
    (local % m) * m + local / m
}
