//! MeshTriaError: Unified error type for mesh-tria public APIs
//!
//! Every detected contract violation is reported through this type instead of
//! being clamped or silently repaired. Variants fall into two families, see
//! [`ErrorKind`]: caller logic errors and topology impossibilities that can
//! stem from malformed input meshes.

use crate::topology::entity_kind::EntityKind;
use std::fmt;
use thiserror::Error;

/// Address of a mesh entity used in error messages.
///
/// Cells carry the refinement level they live on; lines and quads used as
/// faces live in the level-independent face store and vertices in the vertex
/// table, so their `level` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityLocation {
    pub kind: EntityKind,
    pub level: Option<usize>,
    pub index: usize,
}

impl fmt::Display for EntityLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Some(level) => write!(f, "{:?} ({level}, {})", self.kind, self.index),
            None => write!(f, "{:?} #{}", self.kind, self.index),
        }
    }
}

/// Coarse classification of [`MeshTriaError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller broke a documented precondition (bad index, wrong state).
    Precondition,
    /// The mesh itself cannot satisfy the request (non-convergent closure,
    /// malformed coarse cells, entities that do not exist in this dimension).
    Topology,
}

/// Unified error type for mesh-tria operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshTriaError {
    /// An index into a table, level, or entity array is out of range.
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    /// A refinement level that does not exist was addressed.
    #[error("level {level} does not exist (n_levels = {n_levels})")]
    LevelOutOfRange { level: usize, n_levels: usize },
    /// A slot that is not currently in use was dereferenced.
    #[error("{0} is not in use")]
    UnusedEntity(EntityLocation),
    /// A past-the-end iterator was dereferenced or advanced.
    #[error("dereferenced or advanced a past-the-end iterator")]
    PastTheEnd,
    /// Releasing an entity whose children are still alive.
    #[error("cannot release {0}: it still has live children")]
    ReleaseWithChildren(EntityLocation),
    /// A child was requested from an entity without children.
    #[error("{0} has no children")]
    NoChildren(EntityLocation),
    /// An operation that needs an active (childless) cell got a refined one.
    #[error("cell ({level}, {index}) is not active")]
    InactiveCell { level: usize, index: usize },
    /// Refine and coarsen flags may never be set on the same cell.
    #[error("cell ({level}, {index}) cannot carry both refine and coarsen flags")]
    ConflictingFlags { level: usize, index: usize },
    /// Degrees of freedom were requested before any finite element was selected.
    #[error("no finite element selected before distributing degrees of freedom")]
    NoFiniteElement,
    /// Degrees of freedom were queried before distribution.
    #[error("degrees of freedom have not been distributed")]
    NotDistributed,
    /// A renumbering vector is not a bijection on `0..n_dofs`.
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),
    /// A persisted flag vector does not match the number of cell slots.
    #[error("flag vector has {found} entries, expected {expected}")]
    FlagLengthMismatch { expected: usize, found: usize },
    /// Coarse cells may only be created on an empty triangulation.
    #[error("triangulation already contains cells")]
    NonEmptyTriangulation,
    /// An accessor from a different triangulation was handed to a query.
    #[error("cell ({level}, {index}) belongs to a different triangulation")]
    ForeignCell { level: usize, index: usize },
    /// The entity kind is above the mesh dimension.
    #[error("entity kind {kind:?} does not exist in dimension {dim}")]
    KindNotInDimension { kind: EntityKind, dim: usize },
    /// The operation is not defined for this entity kind.
    #[error("operation `{operation}` is not defined for {kind:?}")]
    Unsupported {
        operation: &'static str,
        kind: EntityKind,
    },
    /// The 2:1 balance closure exceeded its pass budget.
    #[error("refinement closure did not converge after {passes} passes")]
    ClosureDidNotConverge { passes: usize },
    /// A coarse cell description is malformed.
    #[error("invalid coarse cell {cell}: {reason}")]
    InvalidCoarseCell { cell: usize, reason: String },
    /// A face is shared by more than two cells of one level.
    #[error("face with vertices {vertices:?} is shared by more than two cells")]
    NonManifoldFace { vertices: Vec<usize> },
    /// A shared line or quad is stored in an ordering that is neither the
    /// expected one nor its supported reorientation.
    #[error("unsupported orientation of {kind:?} with vertices {stored:?} (expected {expected:?})")]
    UnsupportedOrientation {
        kind: EntityKind,
        stored: Vec<usize>,
        expected: Vec<usize>,
    },
    /// Generator parameters describe no valid domain.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// A structural invariant of the store does not hold.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl MeshTriaError {
    /// Classify this error as a precondition violation or a topology failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MeshTriaError::ClosureDidNotConverge { .. }
            | MeshTriaError::InvalidCoarseCell { .. }
            | MeshTriaError::NonManifoldFace { .. }
            | MeshTriaError::UnsupportedOrientation { .. }
            | MeshTriaError::KindNotInDimension { .. }
            | MeshTriaError::Unsupported { .. }
            | MeshTriaError::InvariantViolation(_) => ErrorKind::Topology,
            _ => ErrorKind::Precondition,
        }
    }

    pub(crate) fn out_of_range(what: &'static str, index: usize, len: usize) -> Self {
        MeshTriaError::IndexOutOfRange { what, index, len }
    }
}
