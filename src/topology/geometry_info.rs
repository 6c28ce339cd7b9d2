//! Reference-cell tables for the unit hypercube in `DIM` dimensions.
//!
//! All numberings are lexicographic. Bit `a` of a vertex or child number
//! selects the lower (`0`) or upper (`1`) side along axis `a`, so in 2-D the
//! vertices are `(0,0), (1,0), (0,1), (1,1)`. Face `f` lies on axis `f / 2`
//! at side `f % 2`, hence `opposite_face(f) == f ^ 1`, and the vertices of a
//! face are the cell vertices on that side, again in lexicographic order of
//! the remaining axes.
//!
//! Lines of the cell coincide with faces in 2-D. In higher dimensions the
//! lines of the lower face (`x_{d-1} = 0`) come first, then those of the upper
//! face, then one line along axis `d-1` per vertex of the lower face. This is
//! the numbering that makes
//! `lines_per_cell(d) = 2 * lines_per_cell(d - 1) + vertices_per_cell(d - 1)`
//! hold literally.
//!
//! Counts are associated constants of [`GeometryInfo`]; every lookup that
//! takes an index returns [`MeshTriaError::IndexOutOfRange`] instead of
//! clamping.

use crate::mesh_error::MeshTriaError;

/// Number of `k`-dimensional sub-objects of the `dim`-dimensional unit
/// hypercube, defined by the recursion from `dim - 1`.
pub const fn objects_per_cell(k: usize, dim: usize) -> usize {
    if k > dim {
        return 0;
    }
    if dim == 0 {
        return 1;
    }
    let lower = objects_per_cell(k, dim - 1);
    let lower_faces = if k == 0 {
        0
    } else {
        objects_per_cell(k - 1, dim - 1)
    };
    2 * lower + lower_faces
}

/// Insert `bit` at position `axis` into the binary number `rest`.
const fn insert_bit(rest: usize, axis: usize, bit: usize) -> usize {
    let low = rest & ((1 << axis) - 1);
    let high = rest >> axis;
    low | (bit << axis) | (high << (axis + 1))
}

/// Cell vertex of vertex `vertex` of face `face`. Valid in any dimension.
pub(crate) const fn face_vertex_unchecked(face: usize, vertex: usize) -> usize {
    insert_bit(vertex, face / 2, face % 2)
}

/// Cell vertex of end `vertex` (0 or 1) of line `line` in a `dim`-cube.
pub(crate) const fn line_vertex_unchecked(dim: usize, line: usize, vertex: usize) -> usize {
    match dim {
        0 | 1 => vertex,
        2 => face_vertex_unchecked(line, vertex),
        _ => {
            let lower = objects_per_cell(1, dim - 1);
            let half = 1 << (dim - 1);
            if line < lower {
                line_vertex_unchecked(dim - 1, line, vertex)
            } else if line < 2 * lower {
                line_vertex_unchecked(dim - 1, line - lower, vertex) + half
            } else {
                (line - 2 * lower) + vertex * half
            }
        }
    }
}

/// Child of a `dim`-cube touching subface `subface` of face `face`.
///
/// `subface` is numbered in the frame of the face as stored; when the stored
/// face is transposed relative to the cell (`face_orientation == false`, 3-D
/// only) its two in-plane bits are swapped.
pub(crate) const fn child_on_face_unchecked(
    dim: usize,
    face: usize,
    subface: usize,
    face_orientation: bool,
) -> usize {
    let local = if !face_orientation && dim == 3 {
        ((subface & 1) << 1) | ((subface >> 1) & 1)
    } else {
        subface
    };
    insert_bit(local, face / 2, face % 2)
}

/// Whether child `child` of a cell touches the cell's face `face`.
pub(crate) const fn child_touches_face(child: usize, face: usize) -> bool {
    ((child >> (face / 2)) & 1) == face % 2
}

/// Topology constants and adjacency tables of the `DIM`-dimensional
/// reference cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryInfo<const DIM: usize>;

impl<const DIM: usize> GeometryInfo<DIM> {
    const SUPPORTED: () = assert!(
        DIM <= 4,
        "reference-cell tables exist for dimensions 0 through 4"
    );

    /// Dimension of the reference cell.
    pub const DIM: usize = DIM;
    /// `2^DIM`.
    pub const VERTICES_PER_CELL: usize = objects_per_cell(0, DIM);
    pub const LINES_PER_CELL: usize = objects_per_cell(1, DIM);
    pub const QUADS_PER_CELL: usize = objects_per_cell(2, DIM);
    pub const HEXES_PER_CELL: usize = objects_per_cell(3, DIM);
    /// `2 * DIM`.
    pub const FACES_PER_CELL: usize = 2 * DIM;
    /// `2^DIM` for isotropic refinement.
    pub const CHILDREN_PER_CELL: usize = 1 << DIM;
    pub const VERTICES_PER_FACE: usize = if DIM == 0 { 0 } else { 1 << (DIM - 1) };
    /// Children of a refined face: `children_per_cell` one dimension down.
    pub const SUBFACES_PER_FACE: usize = if DIM == 0 { 0 } else { 1 << (DIM - 1) };
    pub const LINES_PER_FACE: usize = if DIM == 0 {
        0
    } else {
        objects_per_cell(1, DIM - 1)
    };

    fn check(what: &'static str, index: usize, len: usize) -> Result<(), MeshTriaError> {
        let () = Self::SUPPORTED;
        if index < len {
            Ok(())
        } else {
            Err(MeshTriaError::out_of_range(what, index, len))
        }
    }

    /// The face on the other side of the cell along the same axis.
    pub fn opposite_face(face: usize) -> Result<usize, MeshTriaError> {
        Self::check("face", face, Self::FACES_PER_CELL)?;
        Ok(face ^ 1)
    }

    /// Axis the normal of `face` points along.
    pub fn unit_normal_direction(face: usize) -> Result<usize, MeshTriaError> {
        Self::check("face", face, Self::FACES_PER_CELL)?;
        Ok(face / 2)
    }

    /// Sign of the outward normal of `face` along its axis.
    pub fn unit_normal_orientation(face: usize) -> Result<i8, MeshTriaError> {
        Self::check("face", face, Self::FACES_PER_CELL)?;
        Ok(if face % 2 == 0 { -1 } else { 1 })
    }

    /// Cell vertex index of vertex `vertex` of face `face`.
    pub fn face_vertex(face: usize, vertex: usize) -> Result<usize, MeshTriaError> {
        Self::check("face", face, Self::FACES_PER_CELL)?;
        Self::check("face vertex", vertex, Self::VERTICES_PER_FACE)?;
        Ok(face_vertex_unchecked(face, vertex))
    }

    /// Cell vertex index of end `vertex` of line `line`.
    pub fn line_vertex(line: usize, vertex: usize) -> Result<usize, MeshTriaError> {
        Self::check("line", line, Self::LINES_PER_CELL)?;
        Self::check("line vertex", vertex, 2)?;
        Ok(line_vertex_unchecked(DIM, line, vertex))
    }

    /// Which child touches subface `subface` of face `face` when the face is
    /// stored with the given orientation.
    pub fn child_cell_on_face(
        face: usize,
        subface: usize,
        face_orientation: bool,
    ) -> Result<usize, MeshTriaError> {
        Self::check("face", face, Self::FACES_PER_CELL)?;
        Self::check("subface", subface, Self::SUBFACES_PER_FACE)?;
        Ok(child_on_face_unchecked(DIM, face, subface, face_orientation))
    }

    /// Whether `child` touches `face` of its parent.
    pub fn is_child_on_face(child: usize, face: usize) -> Result<bool, MeshTriaError> {
        Self::check("child", child, Self::CHILDREN_PER_CELL)?;
        Self::check("face", face, Self::FACES_PER_CELL)?;
        Ok(child_touches_face(child, face))
    }

    /// Coordinates of a vertex of the unit cell `[0,1]^DIM`.
    pub fn unit_cell_vertex(vertex: usize) -> Result<[f64; DIM], MeshTriaError> {
        Self::check("vertex", vertex, Self::VERTICES_PER_CELL)?;
        let mut point = [0.0; DIM];
        for (axis, x) in point.iter_mut().enumerate() {
            *x = ((vertex >> axis) & 1) as f64;
        }
        Ok(point)
    }
}
