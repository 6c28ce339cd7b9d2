//! The mesh level store: every slot array of a triangulation.
//!
//! Cells live on their level; lines and quads below the cell dimension live
//! in the shared face store; vertex positions live in one table. Operations
//! take an `(level, kind, index)` address. For face kinds the level is not
//! part of the address and is ignored.

use super::CellId;
use super::levels::{TriaFaces, TriaLevel};
use super::objects::TriaObjects;
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::mesh_error::{EntityLocation, MeshTriaError};
use crate::topology::entity_kind::EntityKind;
use crate::topology::geometry_info::GeometryInfo;

#[derive(Debug, Clone)]
pub struct MeshStore<const DIM: usize> {
    levels: Vec<TriaLevel>,
    faces: TriaFaces,
    vertices: Vec<[f64; DIM]>,
    vertices_used: Vec<bool>,
    /// Every vertex slot below this one is used.
    first_free_vertex: usize,
}

impl<const DIM: usize> Default for MeshStore<DIM> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const DIM: usize> MeshStore<DIM> {
    pub fn new() -> Self {
        Self {
            levels: Vec::new(),
            faces: TriaFaces::default(),
            vertices: Vec::new(),
            vertices_used: Vec::new(),
            first_free_vertex: 0,
        }
    }

    /// Kind of the cells of this store.
    pub const fn cell_kind() -> EntityKind {
        match EntityKind::from_dimension(DIM) {
            Some(kind) => kind,
            None => EntityKind::Hex,
        }
    }

    /// Kind of the faces of this store's cells.
    pub const fn face_kind() -> EntityKind {
        match DIM {
            0 | 1 => EntityKind::Vertex,
            2 => EntityKind::Line,
            _ => EntityKind::Quad,
        }
    }

    /// Append an empty level and return its index.
    pub fn allocate_level(&mut self) -> usize {
        let level = self.levels.len();
        self.levels.push(TriaLevel::new(DIM, level));
        level
    }

    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> Result<&TriaLevel, MeshTriaError> {
        self.levels.get(level).ok_or(MeshTriaError::LevelOutOfRange {
            level,
            n_levels: self.levels.len(),
        })
    }

    pub(crate) fn level_mut(&mut self, level: usize) -> Result<&mut TriaLevel, MeshTriaError> {
        let n_levels = self.levels.len();
        self.levels
            .get_mut(level)
            .ok_or(MeshTriaError::LevelOutOfRange { level, n_levels })
    }

    pub(crate) fn levels(&self) -> &[TriaLevel] {
        &self.levels
    }

    pub(crate) fn levels_mut(&mut self) -> &mut [TriaLevel] {
        &mut self.levels
    }

    /// Drop trailing levels without used cells, keeping at least one level.
    pub(crate) fn pop_empty_levels(&mut self) -> usize {
        let mut popped = 0;
        while self.levels.len() > 1 && self.levels.last().is_some_and(|l| l.cells.n_used() == 0) {
            self.levels.pop();
            popped += 1;
        }
        popped
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn faces(&self) -> &TriaFaces {
        &self.faces
    }

    pub(crate) fn faces_mut(&mut self) -> &mut TriaFaces {
        &mut self.faces
    }

    fn check_kind(kind: EntityKind) -> Result<(), MeshTriaError> {
        if kind.dimension() > DIM {
            Err(MeshTriaError::KindNotInDimension { kind, dim: DIM })
        } else {
            Ok(())
        }
    }

    /// Slot arrays of `kind` at `level`. Vertices are not slot objects.
    pub fn objects(&self, level: usize, kind: EntityKind) -> Result<&TriaObjects, MeshTriaError> {
        Self::check_kind(kind)?;
        if kind.dimension() == DIM {
            return Ok(&self.level(level)?.cells);
        }
        self.faces.get(kind).ok_or(MeshTriaError::Unsupported {
            operation: "objects",
            kind,
        })
    }

    pub(crate) fn objects_mut(
        &mut self,
        level: usize,
        kind: EntityKind,
    ) -> Result<&mut TriaObjects, MeshTriaError> {
        Self::check_kind(kind)?;
        if kind.dimension() == DIM {
            return Ok(&mut self.level_mut(level)?.cells);
        }
        self.faces.get_mut(kind).ok_or(MeshTriaError::Unsupported {
            operation: "objects",
            kind,
        })
    }

    /// Grow or shrink the arrays of `kind` to hold at least `count` slots.
    pub fn reserve(
        &mut self,
        level: usize,
        kind: EntityKind,
        count: usize,
    ) -> Result<(), MeshTriaError> {
        Self::check_kind(kind)?;
        match kind {
            EntityKind::Vertex => {
                if count > self.vertices.len() {
                    self.first_free_vertex = self.first_free_vertex.min(self.vertices.len());
                    self.vertices.resize(count, [0.0; DIM]);
                    self.vertices_used.resize(count, false);
                } else {
                    let keep = self
                        .vertices_used
                        .iter()
                        .rposition(|&u| u)
                        .map_or(0, |last| last + 1)
                        .max(count);
                    self.vertices.truncate(keep);
                    self.vertices_used.truncate(keep);
                    self.first_free_vertex = self.first_free_vertex.min(keep);
                }
            }
            k if k.dimension() == DIM => self.level_mut(level)?.reserve(count),
            _ => self.objects_mut(level, kind)?.reserve(count),
        }
        Ok(())
    }

    pub fn mark_used(
        &mut self,
        level: usize,
        kind: EntityKind,
        index: usize,
    ) -> Result<(), MeshTriaError> {
        Self::check_kind(kind)?;
        match kind {
            EntityKind::Vertex => {
                let len = self.vertices_used.len();
                let slot = self
                    .vertices_used
                    .get_mut(index)
                    .ok_or(MeshTriaError::out_of_range("vertex", index, len))?;
                *slot = true;
                Ok(())
            }
            k if k.dimension() == DIM => self.level_mut(level)?.mark_used(index),
            _ => self.objects_mut(level, kind)?.mark_used(index),
        }
    }

    /// Free a slot. Cells and faces with live children cannot be released.
    pub fn release(
        &mut self,
        level: usize,
        kind: EntityKind,
        index: usize,
    ) -> Result<(), MeshTriaError> {
        Self::check_kind(kind)?;
        match kind {
            EntityKind::Vertex => self.release_vertex(index),
            k if k.dimension() == DIM => self.level_mut(level)?.release_cell(index),
            _ => self.objects_mut(level, kind)?.release(index),
        }
    }

    pub fn set_children(
        &mut self,
        level: usize,
        kind: EntityKind,
        index: usize,
        child_base: usize,
    ) -> Result<(), MeshTriaError> {
        if kind == EntityKind::Vertex {
            return Err(MeshTriaError::Unsupported {
                operation: "set_children",
                kind,
            });
        }
        self.objects_mut(level, kind)?.set_children(index, child_base)
    }

    pub fn clear_children(
        &mut self,
        level: usize,
        kind: EntityKind,
        index: usize,
    ) -> Result<(), MeshTriaError> {
        if kind == EntityKind::Vertex {
            return Err(MeshTriaError::Unsupported {
                operation: "clear_children",
                kind,
            });
        }
        self.objects_mut(level, kind)?.clear_children(index)
    }

    fn check_cell(&self, level: usize, cell: usize) -> Result<&TriaLevel, MeshTriaError> {
        let lvl = self.level(level)?;
        if cell >= lvl.len() {
            return Err(MeshTriaError::out_of_range("cell", cell, lvl.len()));
        }
        Ok(lvl)
    }

    /// Record the neighbor of `(level, cell)` across `face`; `None` marks the
    /// boundary.
    pub fn set_neighbor(
        &mut self,
        level: usize,
        cell: usize,
        face: usize,
        neighbor: Option<CellId>,
    ) -> Result<(), MeshTriaError> {
        self.check_cell(level, cell)?;
        if face >= GeometryInfo::<DIM>::FACES_PER_CELL {
            return Err(MeshTriaError::out_of_range(
                "face",
                face,
                GeometryInfo::<DIM>::FACES_PER_CELL,
            ));
        }
        if let Some(n) = neighbor {
            self.check_cell(n.level, n.index)?;
        }
        self.level_mut(level)?.set_neighbor(cell, face, neighbor);
        Ok(())
    }

    pub fn neighbor(
        &self,
        level: usize,
        cell: usize,
        face: usize,
    ) -> Result<Option<CellId>, MeshTriaError> {
        let lvl = self.check_cell(level, cell)?;
        if face >= GeometryInfo::<DIM>::FACES_PER_CELL {
            return Err(MeshTriaError::out_of_range(
                "face",
                face,
                GeometryInfo::<DIM>::FACES_PER_CELL,
            ));
        }
        Ok(lvl.neighbor(cell, face))
    }

    /// Number of vertex slots, used or not.
    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn n_used_vertices(&self) -> usize {
        self.vertices_used.iter().filter(|&&u| u).count()
    }

    pub fn vertex(&self, index: usize) -> Result<[f64; DIM], MeshTriaError> {
        match self.vertices_used.get(index) {
            Some(true) => Ok(self.vertices[index]),
            Some(false) => Err(MeshTriaError::UnusedEntity(EntityLocation {
                kind: EntityKind::Vertex,
                level: None,
                index,
            })),
            None => Err(MeshTriaError::out_of_range(
                "vertex",
                index,
                self.vertices.len(),
            )),
        }
    }

    pub fn vertex_used(&self, index: usize) -> bool {
        self.vertices_used.get(index).copied().unwrap_or(false)
    }

    pub(crate) fn vertex_at(&self, index: usize) -> [f64; DIM] {
        self.vertices[index]
    }

    /// Store a new vertex, reusing the first free slot.
    ///
    /// The search starts at the lowest slot released since the last
    /// allocation, so a sequence of additions costs time linear in the
    /// table size.
    pub fn add_vertex(&mut self, point: [f64; DIM]) -> usize {
        let start = self.first_free_vertex;
        let index = match self.vertices_used[start..].iter().position(|&u| !u) {
            Some(offset) => {
                let index = start + offset;
                self.vertices[index] = point;
                self.vertices_used[index] = true;
                index
            }
            None => {
                self.vertices.push(point);
                self.vertices_used.push(true);
                self.vertices.len() - 1
            }
        };
        self.first_free_vertex = index + 1;
        index
    }

    pub(crate) fn release_vertex(&mut self, index: usize) -> Result<(), MeshTriaError> {
        self.vertex(index)?;
        self.vertices_used[index] = false;
        self.first_free_vertex = self.first_free_vertex.min(index);
        Ok(())
    }

    /// Total number of cell slots over all levels.
    pub(crate) fn n_cell_slots(&self) -> usize {
        self.levels.iter().map(TriaLevel::len).sum()
    }
}

impl<const DIM: usize> DebugInvariants for MeshStore<DIM> {
    fn validate_invariants(&self) -> Result<(), MeshTriaError> {
        ensure(self.vertices.len() == self.vertices_used.len(), || {
            "vertex table and used bits differ in length".to_string()
        })?;
        ensure(
            self.vertices_used
                .iter()
                .take(self.first_free_vertex)
                .all(|&u| u),
            || format!("free vertex slot below hint {}", self.first_free_vertex),
        )?;
        for (l, level) in self.levels.iter().enumerate() {
            ensure(level.check_lengths(), || {
                format!("per-cell arrays of level {l} differ in length")
            })?;
            for cell in level.cells.used_indices() {
                for &v in level.cells.vertices_of(cell) {
                    ensure(self.vertex_used(v), || {
                        format!("cell ({l}, {cell}) references unused vertex {v}")
                    })?;
                }
                for &f in level.cells.faces_of(cell) {
                    let faces = self.faces.get(Self::face_kind());
                    ensure(faces.is_some_and(|fs| fs.used_at(f)), || {
                        format!("cell ({l}, {cell}) references unused face {f}")
                    })?;
                }
                if let Some(base) = level.cells.children_of(cell) {
                    let next = self.levels.get(l + 1);
                    for c in base..base + GeometryInfo::<DIM>::CHILDREN_PER_CELL {
                        ensure(
                            next.is_some_and(|n| n.cells.used_at(c) && n.parent(c) == Some(cell)),
                            || format!("cell ({l}, {cell}) has a broken child link to {c}"),
                        )?;
                    }
                }
                ensure(!(level.refine_flag(cell) && level.coarsen_flag(cell)), || {
                    format!("cell ({l}, {cell}) carries both refine and coarsen flags")
                })?;
            }
        }
        for objects in [&self.faces.lines, &self.faces.quads] {
            let n_children = objects.kind().n_children();
            for i in objects.used_indices() {
                if let Some(base) = objects.children_of(i) {
                    for c in base..base + n_children {
                        ensure(objects.used_at(c), || {
                            format!("{} {i} has unused child {c}", objects.kind().name())
                        })?;
                    }
                }
            }
        }
        Ok(())
    }
}
