//! Vertex-set lookup of face objects and of the midpoints of refined ones.
//!
//! Lines and quads are identified by the set of their vertex indices, which
//! is what lets two cells find the face they share. The table is rebuilt from
//! the store whenever the topology changes and kept current while new
//! objects are created.

use hashbrown::HashMap;

use super::store::MeshStore;
use crate::mesh_error::MeshTriaError;
use crate::topology::entity_kind::EntityKind;
use crate::topology::geometry_info::face_vertex_unchecked;

fn sorted(vertices: &[usize]) -> Vec<usize> {
    let mut key = vertices.to_vec();
    key.sort_unstable();
    key
}

#[derive(Debug, Default)]
pub(crate) struct ObjectLookup {
    objects: HashMap<(EntityKind, Vec<usize>), usize>,
    centers: HashMap<Vec<usize>, usize>,
}

impl ObjectLookup {
    /// Index all used lines and quads of the face store.
    pub(crate) fn from_store<const DIM: usize>(store: &MeshStore<DIM>) -> Self {
        let mut lookup = Self::default();
        for objects in [store.faces().lines(), store.faces().quads()] {
            for i in objects.used_indices() {
                lookup.insert(objects.kind(), objects.vertices_of(i), i);
                if let Some(base) = objects.children_of(i) {
                    if let Some(&center) = objects.vertices_of(base).last() {
                        lookup.centers.insert(sorted(objects.vertices_of(i)), center);
                    }
                }
            }
        }
        lookup
    }

    pub(crate) fn insert(&mut self, kind: EntityKind, vertices: &[usize], index: usize) {
        self.objects.insert((kind, sorted(vertices)), index);
    }

    pub(crate) fn find(&self, kind: EntityKind, vertices: &[usize]) -> Option<usize> {
        self.objects.get(&(kind, sorted(vertices))).copied()
    }

    /// Midpoint vertex of the object spanned by `corners`, once refined.
    pub(crate) fn center(&self, corners: &[usize]) -> Option<usize> {
        self.centers.get(&sorted(corners)).copied()
    }

    pub(crate) fn insert_center(&mut self, corners: &[usize], center: usize) {
        self.centers.insert(sorted(corners), center);
    }

    /// The line or quad with the given vertices, created in the given order
    /// if it does not exist yet. Quads create their bounding lines as needed.
    pub(crate) fn find_or_create<const DIM: usize>(
        &mut self,
        store: &mut MeshStore<DIM>,
        kind: EntityKind,
        vertices: &[usize],
    ) -> Result<usize, MeshTriaError> {
        if let Some(index) = self.find(kind, vertices) {
            return Ok(index);
        }
        let faces: Vec<usize> = match kind {
            EntityKind::Line => Vec::new(),
            EntityKind::Quad => (0..4)
                .map(|f| {
                    let line = [
                        vertices[face_vertex_unchecked(f, 0)],
                        vertices[face_vertex_unchecked(f, 1)],
                    ];
                    self.find_or_create(store, EntityKind::Line, &line)
                })
                .collect::<Result<_, _>>()?,
            other => {
                return Err(MeshTriaError::Unsupported {
                    operation: "find_or_create",
                    kind: other,
                });
            }
        };
        let objects = store.objects_mut(0, kind)?;
        let index = objects.allocate(1);
        objects.set_object(index, vertices, &faces);
        self.insert(kind, vertices, index);
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quads_share_lines_by_vertex_set() {
        let mut store = MeshStore::<3>::new();
        let mut lookup = ObjectLookup::default();
        let a = lookup
            .find_or_create(&mut store, EntityKind::Quad, &[0, 1, 2, 3])
            .unwrap();
        let b = lookup
            .find_or_create(&mut store, EntityKind::Quad, &[1, 4, 3, 5])
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(store.faces().lines().n_used(), 7);
        assert_eq!(
            lookup
                .find_or_create(&mut store, EntityKind::Quad, &[0, 2, 1, 3])
                .unwrap(),
            a
        );
        assert_eq!(lookup.find(EntityKind::Line, &[3, 1]), Some(1));
    }
}
