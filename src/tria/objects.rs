//! Slot arena for one entity kind: parallel arrays indexed by slot number.
//!
//! Slots are never removed from the middle of the arrays. Releasing a slot
//! only clears its `used` bit so that indices held elsewhere stay stable;
//! later allocations reuse free runs before the arrays grow.

use crate::mesh_error::{EntityLocation, MeshTriaError};
use crate::topology::entity_kind::EntityKind;

/// Filler for vertex/face entries of slots that are not in use.
pub(crate) const UNSET: usize = usize::MAX;

/// Storage for all objects of one kind, either on one level (cells) or in the
/// level-independent face store (lines and quads bounding cells).
#[derive(Debug, Clone, Default)]
pub struct TriaObjects {
    kind: EntityKind,
    level: Option<usize>,
    faces_per_object: usize,
    vertices: Vec<usize>,
    faces: Vec<usize>,
    used: Vec<bool>,
    children: Vec<Option<usize>>,
    user_flags: Vec<bool>,
    first_free: usize,
}

impl TriaObjects {
    /// Empty storage for `kind`. `level` is `Some` for per-level cell storage.
    pub fn new(kind: EntityKind, level: Option<usize>) -> Self {
        // the bounding vertices of a line are its faces, stored once
        let faces_per_object = match kind {
            EntityKind::Vertex | EntityKind::Line => 0,
            other => other.n_faces(),
        };
        Self {
            kind,
            level,
            faces_per_object,
            ..Default::default()
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn level(&self) -> Option<usize> {
        self.level
    }

    /// Number of slots, used or not.
    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Number of slots currently in use.
    pub fn n_used(&self) -> usize {
        self.used.iter().filter(|&&u| u).count()
    }

    /// Indices of used slots in increasing order.
    pub fn used_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.used
            .iter()
            .enumerate()
            .filter_map(|(i, &u)| u.then_some(i))
    }

    pub(crate) fn location(&self, index: usize) -> EntityLocation {
        EntityLocation {
            kind: self.kind,
            level: self.level,
            index,
        }
    }

    fn check(&self, index: usize) -> Result<(), MeshTriaError> {
        if index < self.len() {
            Ok(())
        } else {
            Err(MeshTriaError::out_of_range(self.kind.name(), index, self.len()))
        }
    }

    fn check_used(&self, index: usize) -> Result<(), MeshTriaError> {
        self.check(index)?;
        if self.used[index] {
            Ok(())
        } else {
            Err(MeshTriaError::UnusedEntity(self.location(index)))
        }
    }

    /// Resize to hold at least `count` slots.
    ///
    /// Growing appends unused slots. Shrinking only drops trailing unused
    /// slots, so the result may stay longer than `count`.
    pub fn reserve(&mut self, count: usize) {
        if count >= self.len() {
            self.resize(count);
            return;
        }
        let keep = self
            .used
            .iter()
            .rposition(|&u| u)
            .map_or(0, |last| last + 1)
            .max(count);
        // children of unused slots are always cleared, so dropping is safe
        self.resize(keep);
    }

    fn resize(&mut self, count: usize) {
        let nv = self.kind.n_vertices();
        self.vertices.resize(count * nv, UNSET);
        self.faces.resize(count * self.faces_per_object, UNSET);
        self.used.resize(count, false);
        self.children.resize(count, None);
        self.user_flags.resize(count, false);
        self.first_free = self.first_free.min(count);
    }

    pub fn is_used(&self, index: usize) -> Result<bool, MeshTriaError> {
        self.check(index)?;
        Ok(self.used[index])
    }

    pub fn mark_used(&mut self, index: usize) -> Result<(), MeshTriaError> {
        self.check(index)?;
        self.used[index] = true;
        Ok(())
    }

    /// Mark a slot free and wipe its data. Fails while children are alive.
    ///
    /// The user flag is reset with the data. Flags of used slots are only
    /// ever cleared by the client.
    pub fn release(&mut self, index: usize) -> Result<(), MeshTriaError> {
        self.check_used(index)?;
        if self.children[index].is_some() {
            return Err(MeshTriaError::ReleaseWithChildren(self.location(index)));
        }
        self.used[index] = false;
        self.user_flags[index] = false;
        let nv = self.kind.n_vertices();
        self.vertices[index * nv..(index + 1) * nv].fill(UNSET);
        let nf = self.faces_per_object;
        self.faces[index * nf..(index + 1) * nf].fill(UNSET);
        self.first_free = self.first_free.min(index);
        Ok(())
    }

    /// Index of the first of the contiguous children, if refined.
    pub fn children(&self, index: usize) -> Result<Option<usize>, MeshTriaError> {
        self.check(index)?;
        Ok(self.children[index])
    }

    pub fn set_children(&mut self, index: usize, child_base: usize) -> Result<(), MeshTriaError> {
        self.check_used(index)?;
        self.children[index] = Some(child_base);
        Ok(())
    }

    pub fn clear_children(&mut self, index: usize) -> Result<(), MeshTriaError> {
        self.check(index)?;
        self.children[index] = None;
        Ok(())
    }

    /// Vertex indices of a used object in its stored order.
    pub fn vertex_indices(&self, index: usize) -> Result<&[usize], MeshTriaError> {
        self.check_used(index)?;
        Ok(self.vertices_of(index))
    }

    /// Indices of the bounding faces of a used object (empty for lines).
    pub fn face_indices(&self, index: usize) -> Result<&[usize], MeshTriaError> {
        self.check_used(index)?;
        Ok(self.faces_of(index))
    }

    pub(crate) fn vertices_of(&self, index: usize) -> &[usize] {
        let nv = self.kind.n_vertices();
        &self.vertices[index * nv..(index + 1) * nv]
    }

    pub(crate) fn faces_of(&self, index: usize) -> &[usize] {
        let nf = self.faces_per_object;
        &self.faces[index * nf..(index + 1) * nf]
    }

    pub(crate) fn children_of(&self, index: usize) -> Option<usize> {
        self.children[index]
    }

    pub(crate) fn used_at(&self, index: usize) -> bool {
        self.used.get(index).copied().unwrap_or(false)
    }

    /// Fill in the vertices and faces of an allocated slot.
    pub(crate) fn set_object(&mut self, index: usize, vertices: &[usize], faces: &[usize]) {
        debug_assert_eq!(vertices.len(), self.kind.n_vertices());
        debug_assert_eq!(faces.len(), self.faces_per_object);
        let nv = vertices.len();
        self.vertices[index * nv..(index + 1) * nv].copy_from_slice(vertices);
        let nf = faces.len();
        self.faces[index * nf..(index + 1) * nf].copy_from_slice(faces);
    }

    pub fn user_flag(&self, index: usize) -> Result<bool, MeshTriaError> {
        self.check_used(index)?;
        Ok(self.user_flags[index])
    }

    pub fn set_user_flag(&mut self, index: usize, value: bool) -> Result<(), MeshTriaError> {
        self.check_used(index)?;
        self.user_flags[index] = value;
        Ok(())
    }

    pub fn clear_user_flags(&mut self) {
        self.user_flags.fill(false);
    }

    pub(crate) fn user_flags(&self) -> &[bool] {
        &self.user_flags
    }

    pub(crate) fn user_flags_mut(&mut self) -> &mut [bool] {
        &mut self.user_flags
    }

    /// Claim `count` contiguous free slots and mark them used.
    ///
    /// Reuses the first sufficiently long free run at or after the lowest
    /// released slot; appends otherwise. Returns the first slot.
    pub(crate) fn allocate(&mut self, count: usize) -> usize {
        let mut base = self.first_free;
        let mut run = 0;
        let mut found = None;
        for i in self.first_free..self.len() {
            if self.used[i] {
                run = 0;
                base = i + 1;
            } else {
                run += 1;
                if run == count {
                    found = Some(base);
                    break;
                }
            }
        }
        let base = match found {
            Some(base) => base,
            None => {
                let base = self.len();
                self.resize(base + count);
                base
            }
        };
        for i in base..base + count {
            self.used[i] = true;
            self.children[i] = None;
            self.user_flags[i] = false;
        }
        if base == self.first_free {
            self.first_free = self.used[base..]
                .iter()
                .position(|&u| !u)
                .map_or(self.len(), |p| base + p);
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_reuses_free_runs() {
        let mut quads = TriaObjects::new(EntityKind::Quad, None);
        assert_eq!(quads.allocate(4), 0);
        assert_eq!(quads.allocate(4), 4);
        for i in 0..4 {
            quads.release(i).unwrap();
        }
        assert_eq!(quads.n_used(), 4);
        assert_eq!(quads.allocate(2), 0);
        assert_eq!(quads.allocate(4), 8);
        assert_eq!(quads.allocate(2), 2);
        assert_eq!(quads.len(), 12);
    }

    #[test]
    fn user_flags_survive_until_the_slot_is_freed() {
        let mut lines = TriaObjects::new(EntityKind::Line, None);
        let base = lines.allocate(3);
        lines.set_user_flag(base, true).unwrap();
        lines.set_user_flag(base + 1, true).unwrap();
        lines.release(base + 2).unwrap();
        assert!(lines.user_flag(base).unwrap());
        assert!(lines.user_flag(base + 1).unwrap());

        lines.release(base + 1).unwrap();
        assert!(lines.user_flag(base + 1).is_err());
        assert_eq!(lines.allocate(1), base + 1);
        assert!(!lines.user_flag(base + 1).unwrap());
        assert!(lines.user_flag(base).unwrap());
    }

    #[test]
    fn release_requires_childless_used_slot() {
        let mut lines = TriaObjects::new(EntityKind::Line, Some(0));
        let i = lines.allocate(1);
        lines.set_children(i, 7).unwrap();
        assert_eq!(
            lines.release(i),
            Err(MeshTriaError::ReleaseWithChildren(lines.location(i)))
        );
        lines.clear_children(i).unwrap();
        lines.release(i).unwrap();
        assert!(matches!(
            lines.release(i),
            Err(MeshTriaError::UnusedEntity(_))
        ));
        assert!(lines.release(3).is_err());
    }

    #[test]
    fn reserve_keeps_used_tail() {
        let mut lines = TriaObjects::new(EntityKind::Line, None);
        lines.reserve(6);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines.n_used(), 0);
        lines.mark_used(3).unwrap();
        lines.reserve(1);
        assert_eq!(lines.len(), 4);
        assert!(lines.is_used(3).unwrap());
    }

    #[test]
    fn object_data() {
        let mut quads = TriaObjects::new(EntityKind::Quad, None);
        let q = quads.allocate(1);
        quads.set_object(q, &[4, 5, 6, 7], &[0, 1, 2, 3]);
        assert_eq!(quads.vertex_indices(q).unwrap(), &[4, 5, 6, 7]);
        assert_eq!(quads.face_indices(q).unwrap(), &[0, 1, 2, 3]);
        quads.set_user_flag(q, true).unwrap();
        assert!(quads.user_flag(q).unwrap());
        quads.clear_user_flags();
        assert!(!quads.user_flag(q).unwrap());
    }
}
