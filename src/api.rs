//! Entry points for host callers.
//!
//! Thin dispatch over the core: picks the element order from a plain degree
//! (returning `None` for anything other than 1 or 2, without touching the
//! core), builds `RegressionData`, and converts matrix output into the
//! 1-indexed triplet lists hosts consume. Anything beyond that (array
//! layouts, host memory) stays on the caller's side.

use crate::{
  assemble::{self, assemble_operator},
  fe::{ElementOrder, FiniteElement},
  mesh::{Point, TriangleMesh},
  operators::{self, BilinearOp},
  regression::{self, PdeCoefficients, RegressionData, RegressionSolution},
  Error, NodeIdx,
};

/// Regression inputs shared by all smoothing variants.
pub struct RegressionInput {
  pub locations: Option<Vec<Point>>,
  pub observations: Vec<f64>,
  pub covariates: Option<na::DMatrix<f64>>,
  pub boundary: Vec<(NodeIdx, f64)>,
  pub lambdas: Vec<f64>,
  pub compute_dof: bool,
}

/// Sparse matrix as (row, column, value) triplets, **1-indexed**, duplicates
/// compacted, in column-major order.
pub type TripletList = Vec<(usize, usize, f64)>;

fn run_regression(
  mesh: &TriangleMesh,
  degree: usize,
  input: RegressionInput,
  pde: Option<PdeCoefficients>,
) -> Option<Result<RegressionSolution, Error>> {
  let order = ElementOrder::from_degree(degree)?;
  let data = RegressionData {
    locations: input.locations,
    observations: na::DVector::from_vec(input.observations),
    covariates: input.covariates,
    boundary: input.boundary,
    lambdas: input.lambdas,
    order,
    pde,
    compute_dof: input.compute_dof,
  };
  Some(regression::solve(mesh, &data))
}

/// Smoothing with the plain Laplacian penalty.
pub fn regression_laplace(
  mesh: &TriangleMesh,
  degree: usize,
  input: RegressionInput,
) -> Option<Result<RegressionSolution, Error>> {
  run_regression(mesh, degree, input, None)
}

/// Smoothing with a constant-coefficient elliptic penalty.
pub fn regression_pde(
  mesh: &TriangleMesh,
  degree: usize,
  input: RegressionInput,
  c: f64,
  k: na::Matrix2<f64>,
  beta: na::Vector2<f64>,
) -> Option<Result<RegressionSolution, Error>> {
  run_regression(mesh, degree, input, Some(PdeCoefficients::constant(c, k, beta)))
}

/// Smoothing with a space-varying elliptic penalty.
pub fn regression_pde_space_varying(
  mesh: &TriangleMesh,
  degree: usize,
  input: RegressionInput,
  coefficients: PdeCoefficients,
) -> Option<Result<RegressionSolution, Error>> {
  run_regression(mesh, degree, input, Some(coefficients))
}

/// Physical quadrature point coordinates, triangle-major.
pub fn integration_points(
  mesh: &TriangleMesh,
  degree: usize,
) -> Option<Result<Vec<Point>, Error>> {
  let order = ElementOrder::from_degree(degree)?;
  Some(FiniteElement::new(mesh, order).map(|mut fe| assemble::integration_points(mesh, &mut fe)))
}

fn operator_triplets(
  mesh: &TriangleMesh,
  order: ElementOrder,
  op: &BilinearOp,
) -> Result<TripletList, Error> {
  let mut fe = FiniteElement::new(mesh, order)?;
  let matrix = assemble_operator(op, mesh, &mut fe);
  Ok(
    matrix
      .to_canonical_triplets()
      .into_iter()
      .map(|(r, c, v)| (r + 1, c + 1, v))
      .collect(),
  )
}

pub fn mass_matrix(mesh: &TriangleMesh, degree: usize) -> Option<Result<TripletList, Error>> {
  let order = ElementOrder::from_degree(degree)?;
  Some(operator_triplets(mesh, order, &operators::mass()))
}

pub fn stiffness_matrix(mesh: &TriangleMesh, degree: usize) -> Option<Result<TripletList, Error>> {
  let order = ElementOrder::from_degree(degree)?;
  Some(operator_triplets(mesh, order, &operators::stiff()))
}

/// The assembled constant-coefficient elliptic operator
/// `c * mass + stiff[K] + beta . grad`.
pub fn pde_matrix(
  mesh: &TriangleMesh,
  degree: usize,
  c: f64,
  k: na::Matrix2<f64>,
  beta: na::Vector2<f64>,
) -> Option<Result<TripletList, Error>> {
  let order = ElementOrder::from_degree(degree)?;
  let op = PdeCoefficients::constant(c, k, beta).operator();
  Some(operator_triplets(mesh, order, &op))
}

/// Space-varying variant of [`pde_matrix`].
pub fn pde_space_varying_matrix(
  mesh: &TriangleMesh,
  degree: usize,
  coefficients: &PdeCoefficients,
) -> Option<Result<TripletList, Error>> {
  let order = ElementOrder::from_degree(degree)?;
  Some(operator_triplets(mesh, order, &coefficients.operator()))
}
