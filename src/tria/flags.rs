//! Saving and restoring per-cell flags.
//!
//! Flag vectors hold one entry per cell slot at the time of saving, level by
//! level and slot by slot. Replaying saved refine and coarsen flags on a mesh
//! rebuilt the same way reproduces the same refinement.

use serde::{Deserialize, Serialize};

use super::Triangulation;
use super::levels::TriaLevel;
use crate::mesh_error::MeshTriaError;

/// Refine and coarsen flags of all cell slots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementFlags {
    pub refine: Vec<bool>,
    pub coarsen: Vec<bool>,
}

#[derive(Clone, Copy)]
enum Which {
    Refine,
    Coarsen,
    User,
}

fn flags_of(level: &TriaLevel, which: Which) -> &[bool] {
    match which {
        Which::Refine => level.refine_flags(),
        Which::Coarsen => level.coarsen_flags(),
        Which::User => level.cells.user_flags(),
    }
}

fn flags_of_mut(level: &mut TriaLevel, which: Which) -> &mut [bool] {
    match which {
        Which::Refine => level.refine_flags_mut(),
        Which::Coarsen => level.coarsen_flags_mut(),
        Which::User => level.cells.user_flags_mut(),
    }
}

impl<const DIM: usize> Triangulation<DIM> {
    fn save(&self, which: Which) -> Vec<bool> {
        self.store()
            .levels()
            .iter()
            .flat_map(|level| flags_of(level, which).iter().copied())
            .collect()
    }

    fn check_length(&self, flags: &[bool]) -> Result<(), MeshTriaError> {
        let expected = self.store().n_cell_slots();
        if flags.len() != expected {
            return Err(MeshTriaError::FlagLengthMismatch {
                expected,
                found: flags.len(),
            });
        }
        Ok(())
    }

    /// First slot where both vectors are set.
    fn first_conflict(&self, refine: &[bool], coarsen: &[bool]) -> Option<(usize, usize)> {
        let mut offset = 0;
        for (l, level) in self.store().levels().iter().enumerate() {
            for i in 0..level.len() {
                if refine[offset + i] && coarsen[offset + i] {
                    return Some((l, i));
                }
            }
            offset += level.len();
        }
        None
    }

    fn load(&mut self, which: Which, flags: &[bool]) {
        let mut offset = 0;
        for level in self.store_mut().levels_mut() {
            let n = level.len();
            flags_of_mut(level, which).copy_from_slice(&flags[offset..offset + n]);
            offset += n;
        }
    }

    pub fn save_refine_flags(&self) -> Vec<bool> {
        self.save(Which::Refine)
    }

    pub fn save_coarsen_flags(&self) -> Vec<bool> {
        self.save(Which::Coarsen)
    }

    pub fn save_flags(&self) -> RefinementFlags {
        RefinementFlags {
            refine: self.save_refine_flags(),
            coarsen: self.save_coarsen_flags(),
        }
    }

    /// Replace all refine flags. Fails on a length mismatch or when a flag
    /// would meet a set coarsen flag.
    pub fn load_refine_flags(&mut self, flags: &[bool]) -> Result<(), MeshTriaError> {
        self.check_length(flags)?;
        let coarsen = self.save_coarsen_flags();
        if let Some((level, index)) = self.first_conflict(flags, &coarsen) {
            return Err(MeshTriaError::ConflictingFlags { level, index });
        }
        self.load(Which::Refine, flags);
        Ok(())
    }

    pub fn load_coarsen_flags(&mut self, flags: &[bool]) -> Result<(), MeshTriaError> {
        self.check_length(flags)?;
        let refine = self.save_refine_flags();
        if let Some((level, index)) = self.first_conflict(&refine, flags) {
            return Err(MeshTriaError::ConflictingFlags { level, index });
        }
        self.load(Which::Coarsen, flags);
        Ok(())
    }

    pub fn load_flags(&mut self, flags: &RefinementFlags) -> Result<(), MeshTriaError> {
        self.check_length(&flags.refine)?;
        self.check_length(&flags.coarsen)?;
        if let Some((level, index)) = self.first_conflict(&flags.refine, &flags.coarsen) {
            return Err(MeshTriaError::ConflictingFlags { level, index });
        }
        self.load(Which::Refine, &flags.refine);
        self.load(Which::Coarsen, &flags.coarsen);
        Ok(())
    }

    /// User flags of all cell slots.
    pub fn save_user_flags(&self) -> Vec<bool> {
        self.save(Which::User)
    }

    pub fn load_user_flags(&mut self, flags: &[bool]) -> Result<(), MeshTriaError> {
        self.check_length(flags)?;
        self.load(Which::User, flags);
        Ok(())
    }

    /// Clear the user flags of cells, faces and lines.
    pub fn clear_user_flags(&mut self) {
        let store = self.store_mut();
        for level in store.levels_mut() {
            level.cells.clear_user_flags();
        }
        store.faces_mut().lines.clear_user_flags();
        store.faces_mut().quads.clear_user_flags();
    }
}
