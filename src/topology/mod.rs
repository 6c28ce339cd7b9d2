//! Reference-cell topology shared by every mesh dimension.
//!
//! Nothing in here depends on a particular mesh: the tables describe the
//! unit hypercube and the entity kinds a tensor-product mesh is built from.

pub mod entity_kind;
pub mod geometry_info;
pub mod orientation;

pub use entity_kind::EntityKind;
pub use geometry_info::{GeometryInfo, objects_per_cell};
pub use orientation::orientation_of;
