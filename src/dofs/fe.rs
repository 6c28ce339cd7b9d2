//! Finite element descriptors as seen by DoF numbering.
//!
//! Only the number of degrees of freedom an element places on each entity
//! kind and its identity matter here. Shape functions belong elsewhere.

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshTriaError;
use crate::topology::entity_kind::EntityKind;
use crate::topology::geometry_info::objects_per_cell;

/// The interface DoF numbering needs from a finite element.
pub trait FiniteElement {
    /// Human-readable identity, e.g. `FE_Q(2)`.
    fn name(&self) -> &str;

    /// DoFs placed on each entity of the given kind.
    fn dofs_per_object(&self, kind: EntityKind) -> usize;

    fn dofs_per_vertex(&self) -> usize {
        self.dofs_per_object(EntityKind::Vertex)
    }

    fn dofs_per_line(&self) -> usize {
        self.dofs_per_object(EntityKind::Line)
    }

    fn dofs_per_quad(&self) -> usize {
        self.dofs_per_object(EntityKind::Quad)
    }

    fn dofs_per_hex(&self) -> usize {
        self.dofs_per_object(EntityKind::Hex)
    }

    /// Total DoFs on one `dim`-dimensional cell.
    fn dofs_per_cell(&self, dim: usize) -> usize {
        EntityKind::ALL
            .iter()
            .filter(|kind| kind.dimension() <= dim)
            .map(|&kind| objects_per_cell(kind.dimension(), dim) * self.dofs_per_object(kind))
            .sum()
    }
}

/// A finite element described by its per-entity DoF counts.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiniteElementData {
    pub name: String,
    /// Indexed by entity dimension: vertex, line, quad, hex.
    pub dofs_per_object: [usize; 4],
}

impl FiniteElementData {
    pub fn new(name: impl Into<String>, dofs_per_object: [usize; 4]) -> Self {
        Self {
            name: name.into(),
            dofs_per_object,
        }
    }

    /// Continuous tensor-product Lagrange element of the given degree:
    /// one DoF per vertex and `(degree - 1)^k` on each `k`-dimensional entity.
    pub fn lagrange(degree: usize) -> Result<Self, MeshTriaError> {
        if degree == 0 {
            return Err(MeshTriaError::InvalidGeometry(
                "continuous Lagrange elements need degree >= 1".to_string(),
            ));
        }
        let inner = degree - 1;
        Ok(Self::new(
            format!("FE_Q({degree})"),
            [1, inner, inner * inner, inner * inner * inner],
        ))
    }

    /// Discontinuous element with all `(degree + 1)^dim` DoFs in the cell
    /// interior.
    pub fn discontinuous(degree: usize, dim: usize) -> Self {
        let mut counts = [0; 4];
        if let Some(slot) = counts.get_mut(dim) {
            *slot = (degree + 1).pow(dim as u32);
        }
        Self::new(format!("FE_DGQ({degree})"), counts)
    }

    /// Copy the counts of any other element.
    pub fn from_element(fe: &impl FiniteElement) -> Self {
        Self::new(
            fe.name(),
            [
                fe.dofs_per_vertex(),
                fe.dofs_per_line(),
                fe.dofs_per_quad(),
                fe.dofs_per_hex(),
            ],
        )
    }
}

impl FiniteElement for FiniteElementData {
    fn name(&self) -> &str {
        &self.name
    }

    fn dofs_per_object(&self, kind: EntityKind) -> usize {
        self.dofs_per_object[kind.dimension()]
    }
}

/// The elements an hp DoF handler chooses from. A cell's active FE index
/// is a position in this collection and serves as the element's identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeCollection {
    elements: Vec<FiniteElementData>,
}

impl FeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element and return its index.
    pub fn push(&mut self, fe: &impl FiniteElement) -> usize {
        self.elements.push(FiniteElementData::from_element(fe));
        self.elements.len() - 1
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&FiniteElementData, MeshTriaError> {
        self.elements
            .get(index)
            .ok_or(MeshTriaError::out_of_range("fe index", index, self.elements.len()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FiniteElementData> {
        self.elements.iter()
    }
}

impl FromIterator<FiniteElementData> for FeCollection {
    fn from_iter<I: IntoIterator<Item = FiniteElementData>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lagrange_counts() {
        let q1 = FiniteElementData::lagrange(1).unwrap();
        assert_eq!(q1.dofs_per_cell(1), 2);
        assert_eq!(q1.dofs_per_cell(2), 4);
        assert_eq!(q1.dofs_per_cell(3), 8);
        let q2 = FiniteElementData::lagrange(2).unwrap();
        assert_eq!(q2.dofs_per_line(), 1);
        assert_eq!(q2.dofs_per_cell(2), 9);
        assert_eq!(q2.dofs_per_cell(3), 27);
        assert_eq!(FiniteElementData::lagrange(3).unwrap().dofs_per_cell(2), 16);
        assert!(FiniteElementData::lagrange(0).is_err());
    }

    #[test]
    fn collection_indices() {
        let mut fes = FeCollection::new();
        assert_eq!(fes.push(&FiniteElementData::lagrange(1).unwrap()), 0);
        assert_eq!(fes.push(&FiniteElementData::discontinuous(0, 2)), 1);
        assert_eq!(fes.get(1).unwrap().dofs_per_cell(2), 1);
        assert!(fes.get(2).is_err());
    }
}
