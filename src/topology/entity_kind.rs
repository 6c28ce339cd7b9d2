//! Entity kinds of a tensor-product mesh, ordered by topological dimension.

use serde::{Deserialize, Serialize};

/// The kinds of geometric entities a mesh of dimension up to 3 is made of.
///
/// A *cell* is the kind whose dimension equals the mesh dimension and a
/// *face* is the kind one dimension below.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum EntityKind {
    /// 0D vertex.
    #[default]
    Vertex,
    /// 1D segment.
    Line,
    /// 2D quadrilateral.
    Quad,
    /// 3D hexahedron.
    Hex,
}

impl EntityKind {
    /// All kinds in increasing dimension.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Vertex,
        EntityKind::Line,
        EntityKind::Quad,
        EntityKind::Hex,
    ];

    /// Topological dimension of the kind.
    pub const fn dimension(self) -> usize {
        match self {
            EntityKind::Vertex => 0,
            EntityKind::Line => 1,
            EntityKind::Quad => 2,
            EntityKind::Hex => 3,
        }
    }

    /// The kind of the given dimension, if it is at most 3.
    pub const fn from_dimension(dim: usize) -> Option<Self> {
        match dim {
            0 => Some(EntityKind::Vertex),
            1 => Some(EntityKind::Line),
            2 => Some(EntityKind::Quad),
            3 => Some(EntityKind::Hex),
            _ => None,
        }
    }

    /// Number of vertices bounding one entity of this kind (`2^dim`).
    pub const fn n_vertices(self) -> usize {
        1 << self.dimension()
    }

    /// Number of `(dim - 1)`-dimensional faces bounding one entity.
    pub const fn n_faces(self) -> usize {
        2 * self.dimension()
    }

    /// Number of children produced by isotropic refinement (`2^dim`).
    pub const fn n_children(self) -> usize {
        1 << self.dimension()
    }

    /// Lowercase name used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            EntityKind::Vertex => "vertex",
            EntityKind::Line => "line",
            EntityKind::Quad => "quad",
            EntityKind::Hex => "hex",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_dimension(kind.dimension()), Some(kind));
        }
        assert_eq!(EntityKind::from_dimension(4), None);
    }

    #[test]
    fn counts() {
        assert_eq!(EntityKind::Vertex.n_vertices(), 1);
        assert_eq!(EntityKind::Quad.n_faces(), 4);
        assert_eq!(EntityKind::Hex.n_children(), 8);
        assert!(EntityKind::Line < EntityKind::Quad);
    }
}
