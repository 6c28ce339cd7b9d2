//! Invariant checking shared by the mesh store, the triangulation and the
//! DoF handlers.
//!
//! Checks run after every mutating entry point in debug builds and, in release
//! builds, when the `check-invariants` or `strict-invariants` feature is on.

use crate::mesh_error::MeshTriaError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Validate invariants and return the first violation encountered.
    fn validate_invariants(&self) -> Result<(), MeshTriaError>;

    /// Panic on the first violation when invariant checking is enabled.
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "debug_assert_invariants");
    }
}

/// Turn a failed condition into an [`MeshTriaError::InvariantViolation`].
pub(crate) fn ensure(cond: bool, message: impl FnOnce() -> String) -> Result<(), MeshTriaError> {
    if cond {
        Ok(())
    } else {
        Err(MeshTriaError::InvariantViolation(message()))
    }
}

/// Run a fallible check and panic with context when invariant checking is
/// enabled; compiles to nothing otherwise.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_reports_message() {
        assert!(ensure(true, || unreachable!()).is_ok());
        let err = ensure(false, || "parent link broken".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "invariant violated: parent link broken");
    }
}
