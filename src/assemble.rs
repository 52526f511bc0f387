//! Assembly of weak-form operators into global sparse matrices.
//!
//! The element loop is serial and traverses triangles in index order, so
//! re-assembling the same operator on an unchanged mesh reproduces the
//! triplet sequence bit for bit.

use tracing::debug;

use crate::{
  fe::{ElementOrder, FiniteElement},
  mesh::{Point, PointLocator, TriangleMesh},
  operators::BilinearOp,
  sparse::SparseMatrix,
  Error,
};

/// Integrates `op` over every triangle and scatters the local matrices into
/// a global `nnodes x nnodes` triplet matrix. Basis functions shared between
/// adjacent triangles accumulate one contribution per incident triangle.
pub fn assemble_operator(
  op: &BilinearOp,
  mesh: &TriangleMesh,
  fe: &mut FiniteElement,
) -> SparseMatrix {
  let ndofs = fe.ndofs();
  let nquad = fe.nquad();
  let nnodes = mesh.nnodes();

  let mut triplets = Vec::with_capacity(mesh.ntriangles() * ndofs * ndofs);
  for t in 0..mesh.ntriangles() {
    fe.update_element(t);
    let scale = fe.det_jacobian().abs();
    for i in 0..ndofs {
      for j in 0..ndofs {
        let mut val = 0.0;
        for q in 0..nquad {
          val += fe.quad_weight(q) * op.eval(fe, i, j, q);
        }
        val *= scale;
        if val != 0.0 {
          triplets.push((fe.global_dof(i), fe.global_dof(j), val));
        }
      }
    }
  }

  debug!(
    ntriangles = mesh.ntriangles(),
    ntriplets = triplets.len(),
    "assembled operator"
  );
  SparseMatrix::from_triplets(nnodes, nnodes, triplets)
}

/// The evaluation matrix Psi: row k holds the basis function values of the
/// triangle containing observation k, evaluated at that location. An
/// observation contained in no triangle is a fatal input error.
pub fn evaluation_matrix(
  mesh: &TriangleMesh,
  order: ElementOrder,
  locator: &PointLocator,
  locations: &[Point],
) -> Result<SparseMatrix, Error> {
  let ndofs = order.ndofs();
  let mut psi = SparseMatrix::new(locations.len(), mesh.nnodes());

  for (k, p) in locations.iter().enumerate() {
    let (t, bary) = locator
      .locate(p)
      .ok_or(Error::PointOutsideMesh { index: k })?;
    // Barycentric (l0, l1, l2) -> reference coordinates (l1, l2).
    let xi = Point::new(bary[1], bary[2]);
    for i in 0..ndofs {
      let val = crate::fe::ref_shape(order, i, &xi);
      if val != 0.0 {
        psi.push(k, mesh.dof(t, i, order), val);
      }
    }
  }
  Ok(psi)
}

/// Physical coordinates of all quadrature points, triangle-major.
pub fn integration_points(mesh: &TriangleMesh, fe: &mut FiniteElement) -> Vec<Point> {
  let mut points = Vec::with_capacity(mesh.ntriangles() * fe.nquad());
  for t in 0..mesh.ntriangles() {
    fe.update_element(t);
    for q in 0..fe.nquad() {
      points.push(*fe.quad_point(q));
    }
  }
  points
}
