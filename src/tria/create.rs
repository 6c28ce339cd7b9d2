//! Building level 0 from a list of vertices and coarse cells.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::Triangulation;
use super::lookup::ObjectLookup;
use super::neighbors::rebuild_neighbors;
use super::store::MeshStore;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshTriaError;
use crate::topology::geometry_info::{GeometryInfo, face_vertex_unchecked};
use crate::topology::orientation::orientation_of;

/// A coarse cell given by its vertex indices in lexicographic order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellData {
    pub vertices: Vec<usize>,
}

impl CellData {
    pub fn new(vertices: impl Into<Vec<usize>>) -> Self {
        Self {
            vertices: vertices.into(),
        }
    }
}

impl<const DIM: usize> Triangulation<DIM> {
    /// Create the coarse mesh. Only allowed on an empty triangulation.
    ///
    /// Shared faces are identified by their vertex sets. Vertices no cell
    /// refers to are kept as unused slots.
    pub fn create_triangulation(
        &mut self,
        vertices: Vec<[f64; DIM]>,
        cells: &[CellData],
    ) -> Result<(), MeshTriaError> {
        if self.n_levels() > 0 || self.n_vertices() > 0 {
            return Err(MeshTriaError::NonEmptyTriangulation);
        }
        if cells.is_empty() {
            return Err(MeshTriaError::InvalidCoarseCell {
                cell: 0,
                reason: "at least one cell is required".to_string(),
            });
        }
        let n_cell_vertices = GeometryInfo::<DIM>::VERTICES_PER_CELL;
        for (c, cell) in cells.iter().enumerate() {
            if cell.vertices.len() != n_cell_vertices {
                return Err(MeshTriaError::InvalidCoarseCell {
                    cell: c,
                    reason: format!(
                        "expected {n_cell_vertices} vertices, got {}",
                        cell.vertices.len()
                    ),
                });
            }
            if let Some(&v) = cell.vertices.iter().find(|&&v| v >= vertices.len()) {
                return Err(MeshTriaError::InvalidCoarseCell {
                    cell: c,
                    reason: format!("vertex {v} out of range (len {})", vertices.len()),
                });
            }
            let mut sorted = cell.vertices.clone();
            sorted.sort_unstable();
            if sorted.windows(2).any(|w| w[0] == w[1]) {
                return Err(MeshTriaError::InvalidCoarseCell {
                    cell: c,
                    reason: "repeated vertex".to_string(),
                });
            }
        }

        let mut store = MeshStore::<DIM>::new();
        let mut referenced = vec![false; vertices.len()];
        for cell in cells {
            for &v in &cell.vertices {
                referenced[v] = true;
            }
        }
        for point in vertices {
            store.add_vertex(point);
        }
        for (v, &r) in referenced.iter().enumerate() {
            if !r {
                store.release_vertex(v)?;
            }
        }

        store.allocate_level();
        let base = store.level_mut(0)?.allocate_cells(cells.len());
        let face_kind = MeshStore::<DIM>::face_kind();
        let n_face_vertices = GeometryInfo::<DIM>::VERTICES_PER_FACE;
        let mut lookup = ObjectLookup::default();
        let mut sharing: HashMap<usize, usize> = HashMap::new();

        for (c, cell) in cells.iter().enumerate() {
            let mut faces = Vec::new();
            let mut orientations = Vec::new();
            for f in 0..GeometryInfo::<DIM>::FACES_PER_CELL {
                let expected: Vec<usize> = (0..n_face_vertices)
                    .map(|j| cell.vertices[face_vertex_unchecked(f, j)])
                    .collect();
                let key = if DIM == 1 {
                    expected[0]
                } else {
                    let face = lookup.find_or_create(&mut store, face_kind, &expected)?;
                    let stored = store.objects(0, face_kind)?.vertices_of(face);
                    orientations.push(orientation_of(face_kind, stored, &expected)?);
                    faces.push(face);
                    face
                };
                let count = sharing.entry(key).or_insert(0);
                *count += 1;
                if *count > 2 {
                    let mut vertices = expected;
                    vertices.sort_unstable();
                    return Err(MeshTriaError::NonManifoldFace { vertices });
                }
            }
            let level = store.level_mut(0)?;
            level.cells.set_object(base + c, &cell.vertices, &faces);
            for (f, &o) in orientations.iter().enumerate() {
                level.set_face_orientation(base + c, f, o);
            }
        }

        rebuild_neighbors(&mut store);
        self.store = store;
        log::debug!(
            "created coarse mesh: {} cells, {} vertices, dim {DIM}",
            cells.len(),
            self.n_used_vertices()
        );
        if self.options.check_invariants {
            self.validate_invariants()?;
        }
        self.debug_assert_invariants();
        Ok(())
    }
}
