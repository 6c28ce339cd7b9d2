//! Coarse meshes of boxes.

use super::Triangulation;
use super::create::CellData;
use crate::mesh_error::MeshTriaError;

fn invalid_geometry(message: impl Into<String>) -> MeshTriaError {
    MeshTriaError::InvalidGeometry(message.into())
}

/// One cell covering `[left, right]^DIM`.
pub fn hyper_cube<const DIM: usize>(
    tria: &mut Triangulation<DIM>,
    left: f64,
    right: f64,
) -> Result<(), MeshTriaError> {
    subdivided_hyper_cube(tria, 1, left, right)
}

/// `n^DIM` equal cells covering `[left, right]^DIM`.
pub fn subdivided_hyper_cube<const DIM: usize>(
    tria: &mut Triangulation<DIM>,
    n: usize,
    left: f64,
    right: f64,
) -> Result<(), MeshTriaError> {
    subdivided_hyper_rectangle(tria, [n; DIM], [left; DIM], [right; DIM])
}

/// A box between the corners `p1` and `p2` split into `repetitions[a]` cells
/// along axis `a`. Vertices and cells are numbered with axis 0 running
/// fastest.
pub fn subdivided_hyper_rectangle<const DIM: usize>(
    tria: &mut Triangulation<DIM>,
    repetitions: [usize; DIM],
    p1: [f64; DIM],
    p2: [f64; DIM],
) -> Result<(), MeshTriaError> {
    if let Some(axis) = repetitions.iter().position(|&r| r == 0) {
        return Err(invalid_geometry(format!(
            "zero repetitions along axis {axis}"
        )));
    }
    let mut lower = [0.0; DIM];
    let mut upper = [0.0; DIM];
    for axis in 0..DIM {
        lower[axis] = p1[axis].min(p2[axis]);
        upper[axis] = p1[axis].max(p2[axis]);
        if !(upper[axis] > lower[axis]) {
            return Err(invalid_geometry(format!(
                "box has no extent along axis {axis}"
            )));
        }
    }

    let points_per_axis: Vec<usize> = repetitions.iter().map(|r| r + 1).collect();
    let n_points: usize = points_per_axis.iter().product();
    let mut vertices = Vec::with_capacity(n_points);
    for flat in 0..n_points {
        let mut rest = flat;
        let mut point = [0.0; DIM];
        for axis in 0..DIM {
            let i = rest % points_per_axis[axis];
            rest /= points_per_axis[axis];
            let t = i as f64 / repetitions[axis] as f64;
            point[axis] = lower[axis] + t * (upper[axis] - lower[axis]);
        }
        vertices.push(point);
    }

    let n_cells: usize = repetitions.iter().product();
    let mut cells = Vec::with_capacity(n_cells);
    for flat in 0..n_cells {
        let mut rest = flat;
        let mut origin = [0usize; DIM];
        for axis in 0..DIM {
            origin[axis] = rest % repetitions[axis];
            rest /= repetitions[axis];
        }
        let corners: Vec<usize> = (0..1usize << DIM)
            .map(|v| {
                let mut index = 0;
                let mut stride = 1;
                for axis in 0..DIM {
                    index += (origin[axis] + ((v >> axis) & 1)) * stride;
                    stride *= points_per_axis[axis];
                }
                index
            })
            .collect();
        cells.push(CellData::new(corners));
    }
    tria.create_triangulation(vertices, &cells)
}
