//! Which entities of a cell carry DoFs, in local numbering order.
//!
//! The local order is: vertices, then lines, then quads (faces in 3-D),
//! then the cell interior. Within each group entities follow the reference
//! cell numbering of [`GeometryInfo`].

use crate::mesh_error::MeshTriaError;
use crate::topology::entity_kind::EntityKind;
use crate::topology::geometry_info::{GeometryInfo, child_touches_face, line_vertex_unchecked};
use crate::topology::orientation::to_stored_quad_dof;
use crate::tria::CellId;
use crate::tria::accessor::CellAccessor;

/// A mesh entity DoFs can live on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DofObject {
    Vertex(usize),
    /// A line of the face store; `reversed` when it is stored against the
    /// order the cell expects.
    Line { index: usize, reversed: bool },
    /// A quad of the face store (3-D faces); `transposed` when the cell sees
    /// it with `face_orientation == false`.
    Quad { index: usize, transposed: bool },
    /// The cell itself.
    Interior(CellId),
}

/// A [`DofObject`] together with its kind and its number within the cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalObject {
    pub object: DofObject,
    pub kind: EntityKind,
    pub local: usize,
}

/// The DoF-carrying entities of an active or inactive cell in local order.
pub fn cell_dof_objects<const DIM: usize>(
    cell: &CellAccessor<'_, DIM>,
) -> Result<Vec<LocalObject>, MeshTriaError> {
    let mut objects = Vec::new();
    for v in 0..GeometryInfo::<DIM>::VERTICES_PER_CELL {
        objects.push(LocalObject {
            object: DofObject::Vertex(cell.vertex_index(v)?),
            kind: EntityKind::Vertex,
            local: v,
        });
    }
    if DIM >= 2 {
        for l in 0..GeometryInfo::<DIM>::LINES_PER_CELL {
            objects.push(LocalObject {
                object: DofObject::Line {
                    index: cell.line_index(l)?,
                    reversed: !cell.line_orientation(l)?,
                },
                kind: EntityKind::Line,
                local: l,
            });
        }
    }
    if DIM == 3 {
        for f in 0..GeometryInfo::<DIM>::FACES_PER_CELL {
            objects.push(LocalObject {
                object: DofObject::Quad {
                    index: cell.face_index(f)?,
                    transposed: !cell.face_orientation(f)?,
                },
                kind: EntityKind::Quad,
                local: f,
            });
        }
    }
    let cell_kind = EntityKind::from_dimension(DIM).unwrap_or(EntityKind::Hex);
    objects.push(LocalObject {
        object: DofObject::Interior(cell.id()),
        kind: cell_kind,
        local: 0,
    });
    Ok(objects)
}

/// Whether a local entity of a `DIM`-cell lies on the cell's face `face`.
pub fn is_on_face<const DIM: usize>(object: &LocalObject, face: usize) -> bool {
    match object.object {
        DofObject::Vertex(_) => child_touches_face(object.local, face),
        DofObject::Line { .. } => {
            child_touches_face(line_vertex_unchecked(DIM, object.local, 0), face)
                && child_touches_face(line_vertex_unchecked(DIM, object.local, 1), face)
        }
        DofObject::Quad { .. } => object.local == face,
        DofObject::Interior(_) => false,
    }
}

/// Append the DoFs of `object`, stored as `slots`, in the cell's frame.
///
/// Reversed lines are read backwards and transposed quads through
/// [`to_stored_quad_dof`].
pub fn extend_in_cell_order(object: DofObject, slots: &[usize], out: &mut Vec<usize>) {
    match object {
        DofObject::Line { reversed: true, .. } => out.extend(slots.iter().rev()),
        DofObject::Quad {
            transposed: true, ..
        } => {
            let n = slots.len();
            out.extend((0..n).map(|k| slots[to_stored_quad_dof(n, k, false)]));
        }
        _ => out.extend_from_slice(slots),
    }
}
