//! Borrowed views of single cells, faces, lines and vertices.
//!
//! An accessor is an address plus a shared reference to the owning
//! triangulation. Every structural query re-checks the `used` bit of the
//! slot, so an address that outlived a coarsening step is reported rather
//! than read.

use std::fmt;
use std::ptr;

use super::{CellId, Triangulation};
use crate::mesh_error::{EntityLocation, MeshTriaError};
use crate::topology::entity_kind::EntityKind;
use crate::topology::geometry_info::{GeometryInfo, line_vertex_unchecked};
use crate::topology::orientation::to_stored_vertex;
use crate::tria::levels::TriaLevel;
use crate::tria::objects::TriaObjects;
use crate::tria::store::MeshStore;

/// Read-only view of one cell.
#[derive(Clone, Copy)]
pub struct CellAccessor<'a, const DIM: usize> {
    tria: &'a Triangulation<DIM>,
    id: CellId,
}

impl<const DIM: usize> Triangulation<DIM> {
    /// Accessor for the cell at `id`. The slot must exist but need not be used.
    pub fn cell(&self, id: CellId) -> Result<CellAccessor<'_, DIM>, MeshTriaError> {
        let level = self.store().level(id.level)?;
        if id.index >= level.len() {
            return Err(MeshTriaError::out_of_range("cell", id.index, level.len()));
        }
        Ok(CellAccessor { tria: self, id })
    }

    /// Mutable view of a cell for flag manipulation.
    pub fn cell_mut(&mut self, id: CellId) -> Result<CellMut<'_, DIM>, MeshTriaError> {
        self.cell(id)?;
        Ok(CellMut { tria: self, id })
    }

    /// Accessor for a vertex, line or quad below the cell dimension.
    pub fn entity(
        &self,
        kind: EntityKind,
        index: usize,
    ) -> Result<EntityAccessor<'_, DIM>, MeshTriaError> {
        if kind.dimension() >= DIM {
            return Err(MeshTriaError::KindNotInDimension { kind, dim: DIM });
        }
        let len = match kind {
            EntityKind::Vertex => self.n_vertices(),
            other => self.store().objects(0, other)?.len(),
        };
        if index >= len {
            return Err(MeshTriaError::out_of_range(kind.name(), index, len));
        }
        Ok(EntityAccessor {
            tria: self,
            kind,
            index,
        })
    }
}

impl<'a, const DIM: usize> CellAccessor<'a, DIM> {
    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn level(&self) -> usize {
        self.id.level
    }

    pub fn index(&self) -> usize {
        self.id.index
    }

    pub fn triangulation(&self) -> &'a Triangulation<DIM> {
        self.tria
    }

    fn store_level(&self) -> &'a TriaLevel {
        &self.tria.store().levels()[self.id.level]
    }

    fn location(&self) -> EntityLocation {
        self.store_level().cells.location(self.id.index)
    }

    pub fn used(&self) -> bool {
        self.store_level().cells.used_at(self.id.index)
    }

    fn require_used(&self) -> Result<&'a TriaLevel, MeshTriaError> {
        if self.used() {
            Ok(self.store_level())
        } else {
            Err(MeshTriaError::UnusedEntity(self.location()))
        }
    }

    pub fn has_children(&self) -> Result<bool, MeshTriaError> {
        Ok(self.require_used()?.cells.children_of(self.id.index).is_some())
    }

    /// A used cell without children.
    pub fn is_active(&self) -> Result<bool, MeshTriaError> {
        Ok(!self.has_children()?)
    }

    pub fn n_children(&self) -> Result<usize, MeshTriaError> {
        Ok(if self.has_children()? {
            GeometryInfo::<DIM>::CHILDREN_PER_CELL
        } else {
            0
        })
    }

    pub fn child_index(&self, i: usize) -> Result<usize, MeshTriaError> {
        let level = self.require_used()?;
        let base = level
            .cells
            .children_of(self.id.index)
            .ok_or(MeshTriaError::NoChildren(self.location()))?;
        let n = GeometryInfo::<DIM>::CHILDREN_PER_CELL;
        if i >= n {
            return Err(MeshTriaError::out_of_range("child", i, n));
        }
        Ok(base + i)
    }

    pub fn child(&self, i: usize) -> Result<CellAccessor<'a, DIM>, MeshTriaError> {
        let index = self.child_index(i)?;
        Ok(CellAccessor {
            tria: self.tria,
            id: CellId::new(self.id.level + 1, index),
        })
    }

    /// The parent cell; `None` on level 0.
    pub fn parent(&self) -> Result<Option<CellAccessor<'a, DIM>>, MeshTriaError> {
        let level = self.require_used()?;
        Ok(level.parent(self.id.index).map(|p| CellAccessor {
            tria: self.tria,
            id: CellId::new(self.id.level - 1, p),
        }))
    }

    pub fn refine_flag(&self) -> Result<bool, MeshTriaError> {
        Ok(self.require_used()?.refine_flag(self.id.index))
    }

    pub fn coarsen_flag(&self) -> Result<bool, MeshTriaError> {
        Ok(self.require_used()?.coarsen_flag(self.id.index))
    }

    pub fn user_flag(&self) -> Result<bool, MeshTriaError> {
        self.store_level().cells.user_flag(self.id.index)
    }

    fn check_face(face: usize) -> Result<(), MeshTriaError> {
        let n = GeometryInfo::<DIM>::FACES_PER_CELL;
        if face < n {
            Ok(())
        } else {
            Err(MeshTriaError::out_of_range("face", face, n))
        }
    }

    /// Neighbor across `face`: the same-level cell if it exists, else the
    /// coarser cell covering the face, `None` at the boundary.
    pub fn neighbor(&self, face: usize) -> Result<Option<CellAccessor<'a, DIM>>, MeshTriaError> {
        Self::check_face(face)?;
        let level = self.require_used()?;
        Ok(level.neighbor(self.id.index, face).map(|id| CellAccessor {
            tria: self.tria,
            id,
        }))
    }

    pub fn at_boundary(&self, face: usize) -> Result<bool, MeshTriaError> {
        Ok(self.neighbor(face)?.is_none())
    }

    /// Whether any face lies on the boundary.
    pub fn at_boundary_any(&self) -> Result<bool, MeshTriaError> {
        for face in 0..GeometryInfo::<DIM>::FACES_PER_CELL {
            if self.at_boundary(face)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether any line of the cell lies on the boundary. In 3-D this also
    /// holds for cells touching the boundary only along an edge, which is
    /// detected through same-level face neighbors.
    pub fn has_boundary_lines(&self) -> Result<bool, MeshTriaError> {
        let on_face = self.at_boundary_any()?;
        if on_face || DIM < 3 {
            return Ok(on_face);
        }
        for line in 0..GeometryInfo::<DIM>::LINES_PER_CELL {
            let a = line_vertex_unchecked(DIM, line, 0);
            let b = line_vertex_unchecked(DIM, line, 1);
            let axis = (a ^ b).trailing_zeros() as usize;
            for other in (0..DIM).filter(|&o| o != axis) {
                let third = DIM - axis - other;
                let Some(n) = self.neighbor(2 * other + ((a >> other) & 1))? else {
                    continue;
                };
                if n.level() == self.level() && n.at_boundary(2 * third + ((a >> third) & 1))? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Which face of the neighbor across `face` points back to this cell.
    /// `None` at the boundary and for coarser neighbors.
    pub fn neighbor_of_neighbor(&self, face: usize) -> Result<Option<usize>, MeshTriaError> {
        let Some(n) = self.neighbor(face)? else {
            return Ok(None);
        };
        if n.level() != self.level() {
            return Ok(None);
        }
        for g in 0..GeometryInfo::<DIM>::FACES_PER_CELL {
            if n.store_level().neighbor(n.id.index, g) == Some(self.id) {
                return Ok(Some(g));
            }
        }
        Err(MeshTriaError::InvariantViolation(format!(
            "neighbor {} of cell {} does not point back",
            n.id, self.id
        )))
    }

    pub fn vertex_index(&self, i: usize) -> Result<usize, MeshTriaError> {
        let level = self.require_used()?;
        let vertices = level.cells.vertices_of(self.id.index);
        vertices
            .get(i)
            .copied()
            .ok_or(MeshTriaError::out_of_range("vertex", i, vertices.len()))
    }

    pub fn vertex_indices(&self) -> Result<&'a [usize], MeshTriaError> {
        Ok(self.require_used()?.cells.vertices_of(self.id.index))
    }

    pub fn vertex(&self, i: usize) -> Result<[f64; DIM], MeshTriaError> {
        self.tria.store().vertex(self.vertex_index(i)?)
    }

    /// Average of the vertices.
    pub fn center(&self) -> Result<[f64; DIM], MeshTriaError> {
        let vertices = self.vertex_indices()?;
        let mut c = [0.0; DIM];
        for &v in vertices {
            let p = self.tria.store().vertex(v)?;
            for (x, y) in c.iter_mut().zip(p) {
                *x += y;
            }
        }
        for x in &mut c {
            *x /= vertices.len() as f64;
        }
        Ok(c)
    }

    /// Longest diagonal.
    pub fn diameter(&self) -> Result<f64, MeshTriaError> {
        let n = GeometryInfo::<DIM>::VERTICES_PER_CELL;
        let mut d: f64 = 0.0;
        for v in 0..n / 2 {
            let a = self.vertex(v)?;
            let b = self.vertex(n - 1 - v)?;
            let dist = a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt();
            d = d.max(dist);
        }
        Ok(d)
    }

    /// Product of the extents along the coordinate axes, exact for
    /// axis-aligned cells.
    pub fn measure(&self) -> Result<f64, MeshTriaError> {
        let origin = self.vertex(0)?;
        let mut m = 1.0;
        for axis in 0..DIM {
            let corner = self.vertex(1 << axis)?;
            m *= (corner[axis] - origin[axis]).abs();
        }
        Ok(m)
    }

    /// Index of face `i` in the face store, or the vertex index in 1-D.
    pub fn face_index(&self, i: usize) -> Result<usize, MeshTriaError> {
        Self::check_face(i)?;
        let level = self.require_used()?;
        if DIM == 1 {
            return Ok(level.cells.vertices_of(self.id.index)[i]);
        }
        Ok(level.cells.faces_of(self.id.index)[i])
    }

    pub fn face(&self, i: usize) -> Result<EntityAccessor<'a, DIM>, MeshTriaError> {
        let index = self.face_index(i)?;
        Ok(EntityAccessor {
            tria: self.tria,
            kind: MeshStore::<DIM>::face_kind(),
            index,
        })
    }

    /// Whether face `i` is stored in the order this cell expects. Always
    /// `true` below three dimensions.
    pub fn face_orientation(&self, i: usize) -> Result<bool, MeshTriaError> {
        Self::check_face(i)?;
        Ok(self.require_used()?.face_orientation(self.id.index, i))
    }

    fn check_line(i: usize) -> Result<(), MeshTriaError> {
        if DIM < 2 {
            return Err(MeshTriaError::Unsupported {
                operation: "line",
                kind: EntityKind::Line,
            });
        }
        let n = GeometryInfo::<DIM>::LINES_PER_CELL;
        if i < n {
            Ok(())
        } else {
            Err(MeshTriaError::out_of_range("line", i, n))
        }
    }

    fn expected_line(&self, i: usize) -> Result<[usize; 2], MeshTriaError> {
        let vertices = self.vertex_indices()?;
        Ok([
            vertices[line_vertex_unchecked(DIM, i, 0)],
            vertices[line_vertex_unchecked(DIM, i, 1)],
        ])
    }

    /// Index of line `i` in the face store (2-D and 3-D).
    pub fn line_index(&self, i: usize) -> Result<usize, MeshTriaError> {
        Self::check_line(i)?;
        if DIM == 2 {
            return self.face_index(i);
        }
        let expected = self.expected_line(i)?;
        let lines = self.tria.store().faces().lines();
        let quads = self.tria.store().faces().quads();
        for f in 0..GeometryInfo::<DIM>::FACES_PER_CELL {
            for &line in quads.faces_of(self.face_index(f)?) {
                let v = lines.vertices_of(line);
                if (v[0] == expected[0] && v[1] == expected[1])
                    || (v[0] == expected[1] && v[1] == expected[0])
                {
                    return Ok(line);
                }
            }
        }
        Err(MeshTriaError::InvariantViolation(format!(
            "line {i} of cell {} is not bounded by its faces",
            self.id
        )))
    }

    pub fn line(&self, i: usize) -> Result<EntityAccessor<'a, DIM>, MeshTriaError> {
        Ok(EntityAccessor {
            tria: self.tria,
            kind: EntityKind::Line,
            index: self.line_index(i)?,
        })
    }

    /// Whether line `i` is stored from this cell's first to second vertex.
    pub fn line_orientation(&self, i: usize) -> Result<bool, MeshTriaError> {
        let line = self.line_index(i)?;
        let expected = self.expected_line(i)?;
        let stored = self.tria.store().faces().lines().vertices_of(line);
        Ok(stored[0] == expected[0])
    }
}

impl<const DIM: usize> PartialEq for CellAccessor<'_, DIM> {
    /// Accessors of different triangulations must not be compared.
    fn eq(&self, other: &Self) -> bool {
        assert!(
            ptr::eq(self.tria, other.tria),
            "compared accessors of different triangulations"
        );
        self.id == other.id
    }
}

impl<const DIM: usize> Eq for CellAccessor<'_, DIM> {}

impl<const DIM: usize> fmt::Debug for CellAccessor<'_, DIM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellAccessor")
            .field("dim", &DIM)
            .field("level", &self.id.level)
            .field("index", &self.id.index)
            .finish()
    }
}

/// Read-only view of a vertex, or of a line or quad in the face store.
#[derive(Clone, Copy)]
pub struct EntityAccessor<'a, const DIM: usize> {
    tria: &'a Triangulation<DIM>,
    kind: EntityKind,
    index: usize,
}

impl<'a, const DIM: usize> EntityAccessor<'a, DIM> {
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn objects(&self) -> Result<&'a TriaObjects, MeshTriaError> {
        self.tria.store().objects(0, self.kind)
    }

    fn location(&self) -> EntityLocation {
        EntityLocation {
            kind: self.kind,
            level: None,
            index: self.index,
        }
    }

    pub fn used(&self) -> bool {
        match self.kind {
            EntityKind::Vertex => self.tria.store().vertex_used(self.index),
            _ => self.objects().is_ok_and(|o| o.used_at(self.index)),
        }
    }

    pub fn has_children(&self) -> Result<bool, MeshTriaError> {
        if !self.used() {
            return Err(MeshTriaError::UnusedEntity(self.location()));
        }
        match self.kind {
            EntityKind::Vertex => Ok(false),
            _ => Ok(self.objects()?.children_of(self.index).is_some()),
        }
    }

    pub fn n_children(&self) -> Result<usize, MeshTriaError> {
        Ok(if self.has_children()? {
            self.kind.n_children()
        } else {
            0
        })
    }

    pub fn child(&self, i: usize) -> Result<EntityAccessor<'a, DIM>, MeshTriaError> {
        if !self.has_children()? {
            return Err(MeshTriaError::NoChildren(self.location()));
        }
        let n = self.kind.n_children();
        if i >= n {
            return Err(MeshTriaError::out_of_range("child", i, n));
        }
        let base = self.objects()?.children_of(self.index).unwrap_or_default();
        Ok(EntityAccessor {
            tria: self.tria,
            kind: self.kind,
            index: base + i,
        })
    }

    /// Vertex `i` in the stored order of this entity.
    pub fn vertex_index(&self, i: usize) -> Result<usize, MeshTriaError> {
        if self.kind == EntityKind::Vertex {
            if i != 0 {
                return Err(MeshTriaError::out_of_range("vertex", i, 1));
            }
            self.tria.store().vertex(self.index)?;
            return Ok(self.index);
        }
        let vertices = self.objects()?.vertex_indices(self.index)?;
        vertices
            .get(i)
            .copied()
            .ok_or(MeshTriaError::out_of_range("vertex", i, vertices.len()))
    }

    /// Vertex `i` as seen by a cell with the given relative orientation.
    pub fn oriented_vertex_index(&self, i: usize, orientation: bool) -> Result<usize, MeshTriaError> {
        self.vertex_index(to_stored_vertex(self.kind, i, orientation))
    }

    pub fn vertex(&self, i: usize) -> Result<[f64; DIM], MeshTriaError> {
        self.tria.store().vertex(self.vertex_index(i)?)
    }

    pub fn center(&self) -> Result<[f64; DIM], MeshTriaError> {
        let n = self.kind.n_vertices();
        let mut c = [0.0; DIM];
        for i in 0..n {
            for (x, y) in c.iter_mut().zip(self.vertex(i)?) {
                *x += y;
            }
        }
        for x in &mut c {
            *x /= n as f64;
        }
        Ok(c)
    }

    pub fn user_flag(&self) -> Result<bool, MeshTriaError> {
        match self.kind {
            EntityKind::Vertex => Err(MeshTriaError::Unsupported {
                operation: "user_flag",
                kind: EntityKind::Vertex,
            }),
            _ => self.objects()?.user_flag(self.index),
        }
    }
}

impl<const DIM: usize> PartialEq for EntityAccessor<'_, DIM> {
    fn eq(&self, other: &Self) -> bool {
        assert!(
            ptr::eq(self.tria, other.tria),
            "compared accessors of different triangulations"
        );
        self.kind == other.kind && self.index == other.index
    }
}

impl<const DIM: usize> fmt::Debug for EntityAccessor<'_, DIM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityAccessor({})", self.location())
    }
}

/// Mutable view of one cell for flag manipulation.
pub struct CellMut<'a, const DIM: usize> {
    tria: &'a mut Triangulation<DIM>,
    id: CellId,
}

impl<const DIM: usize> CellMut<'_, DIM> {
    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn as_accessor(&self) -> CellAccessor<'_, DIM> {
        CellAccessor {
            tria: self.tria,
            id: self.id,
        }
    }

    fn level(&mut self) -> &mut TriaLevel {
        &mut self.tria.store_mut().levels_mut()[self.id.level]
    }

    fn require_active(&self) -> Result<(), MeshTriaError> {
        if self.as_accessor().is_active()? {
            Ok(())
        } else {
            Err(MeshTriaError::InactiveCell {
                level: self.id.level,
                index: self.id.index,
            })
        }
    }

    /// Flag an active cell for refinement. Fails while the coarsen flag is set.
    pub fn set_refine_flag(&mut self) -> Result<(), MeshTriaError> {
        self.require_active()?;
        let index = self.id.index;
        if self.level().coarsen_flag(index) {
            return Err(MeshTriaError::ConflictingFlags {
                level: self.id.level,
                index,
            });
        }
        self.level().set_refine_flag(index, true);
        Ok(())
    }

    pub fn clear_refine_flag(&mut self) -> Result<(), MeshTriaError> {
        self.as_accessor().has_children()?;
        let index = self.id.index;
        self.level().set_refine_flag(index, false);
        Ok(())
    }

    /// Flag an active cell for coarsening. Fails while the refine flag is set.
    pub fn set_coarsen_flag(&mut self) -> Result<(), MeshTriaError> {
        self.require_active()?;
        let index = self.id.index;
        if self.level().refine_flag(index) {
            return Err(MeshTriaError::ConflictingFlags {
                level: self.id.level,
                index,
            });
        }
        self.level().set_coarsen_flag(index, true);
        Ok(())
    }

    pub fn clear_coarsen_flag(&mut self) -> Result<(), MeshTriaError> {
        self.as_accessor().has_children()?;
        let index = self.id.index;
        self.level().set_coarsen_flag(index, false);
        Ok(())
    }

    pub fn set_user_flag(&mut self) -> Result<(), MeshTriaError> {
        let index = self.id.index;
        self.level().cells.set_user_flag(index, true)
    }

    pub fn clear_user_flag(&mut self) -> Result<(), MeshTriaError> {
        let index = self.id.index;
        self.level().cells.set_user_flag(index, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tria::generators::hyper_cube;

    #[test]
    fn navigation_on_refined_square() {
        let mut tria = Triangulation::<2>::new();
        hyper_cube(&mut tria, 0.0, 1.0).unwrap();
        tria.refine_global(1).unwrap();
        let root = tria.cell(CellId::new(0, 0)).unwrap();
        assert!(root.has_children().unwrap());
        assert_eq!(root.n_children().unwrap(), 4);
        let c3 = root.child(3).unwrap();
        assert_eq!(c3.parent().unwrap(), Some(root));
        assert_eq!(c3.center().unwrap(), [0.75, 0.75]);
        assert!((c3.measure().unwrap() - 0.25).abs() < 1e-12);
        assert!((c3.diameter().unwrap() - 0.5f64.sqrt()).abs() < 1e-12);
        assert!(c3.at_boundary(1).unwrap());
        let left = c3.neighbor(0).unwrap().unwrap();
        assert_eq!(left, root.child(2).unwrap());
        assert_eq!(c3.neighbor_of_neighbor(0).unwrap(), Some(1));
        assert!(matches!(root.child(4), Err(MeshTriaError::IndexOutOfRange { .. })));
        assert!(matches!(c3.child(0), Err(MeshTriaError::NoChildren(_))));
        assert!(c3.face_orientation(2).unwrap());
    }

    #[test]
    fn face_accessors_reach_children() {
        let mut tria = Triangulation::<2>::new();
        hyper_cube(&mut tria, 0.0, 2.0).unwrap();
        tria.refine_global(1).unwrap();
        let root = tria.cell(CellId::new(0, 0)).unwrap();
        let bottom = root.face(2).unwrap();
        assert_eq!(bottom.kind(), EntityKind::Line);
        assert_eq!(bottom.n_children().unwrap(), 2);
        assert_eq!(bottom.center().unwrap(), [1.0, 0.0]);
        assert_eq!(bottom.child(0).unwrap().vertex(1).unwrap(), [1.0, 0.0]);
        let child_face = root.child(1).unwrap().face(2).unwrap();
        assert_eq!(child_face, bottom.child(1).unwrap());
        assert!(root.child(0).unwrap().line_orientation(0).unwrap());
    }

    #[test]
    fn flags_through_cell_mut() {
        let mut tria = Triangulation::<1>::new();
        hyper_cube(&mut tria, 0.0, 1.0).unwrap();
        let id = CellId::new(0, 0);
        {
            let mut cell = tria.cell_mut(id).unwrap();
            cell.set_refine_flag().unwrap();
            assert_eq!(
                cell.set_coarsen_flag(),
                Err(MeshTriaError::ConflictingFlags { level: 0, index: 0 })
            );
            cell.set_user_flag().unwrap();
        }
        assert!(tria.cell(id).unwrap().refine_flag().unwrap());
        tria.execute_coarsening_and_refinement().unwrap();
        assert!(tria.cell(id).unwrap().user_flag().unwrap());
        assert!(matches!(
            tria.cell_mut(id).unwrap().set_refine_flag(),
            Err(MeshTriaError::InactiveCell { level: 0, index: 0 })
        ));
        assert!(tria.cell(CellId::new(3, 0)).is_err());
    }
}
