//! Penalized mixed regression over a triangulated domain.
//!
//! Minimizes `|z - W gamma - Psi f|^2 + lambda f^T R f` over the covariate
//! coefficients `gamma` and basis coefficients `f`, where R is the assembled
//! penalty operator (pure stiffness, or the full reaction-diffusion-advection
//! operator when PDE coefficients are given). One coupled sparse system is
//! solved per smoothing parameter; the penalty and evaluation matrices are
//! assembled once and shared across the whole lambda sequence.

use tracing::debug;

use crate::{
  assemble::{assemble_operator, evaluation_matrix},
  fe::{ElementOrder, FiniteElement},
  mesh::{Point, PointLocator, TriangleMesh},
  operators::{self, BilinearOp, ScalarCoeff, TensorCoeff, VectorCoeff},
  sparse::{FaerLu, SparseMatrix},
  Error, NodeIdx,
};

/// Coefficients of the elliptic penalty operator
/// `c * mass + stiff[K] + beta . grad`. Each may be constant or a function
/// of physical position.
pub struct PdeCoefficients {
  pub reaction: ScalarCoeff,
  pub diffusion: TensorCoeff,
  pub advection: VectorCoeff,
}

impl PdeCoefficients {
  pub fn constant(c: f64, k: na::Matrix2<f64>, beta: na::Vector2<f64>) -> Self {
    Self {
      reaction: ScalarCoeff::Constant(c),
      diffusion: TensorCoeff::Constant(k),
      advection: VectorCoeff::Constant(beta),
    }
  }

  /// The weak-form expression tree of the penalty.
  pub fn operator(&self) -> BilinearOp {
    operators::mass().scaled(self.reaction.clone())
      + operators::stiff_aniso(self.diffusion.clone())
      + operators::advection(self.advection.clone())
  }
}

pub struct RegressionData {
  /// Observation locations; `None` places observation k at mesh node k.
  pub locations: Option<Vec<Point>>,
  pub observations: na::DVector<f64>,
  /// Covariate design matrix, one row per observation.
  pub covariates: Option<na::DMatrix<f64>>,
  /// Dirichlet pairs (node, prescribed value); nodes not listed are free
  /// (natural/Neumann).
  pub boundary: Vec<(NodeIdx, f64)>,
  pub lambdas: Vec<f64>,
  pub order: ElementOrder,
  /// `None` means pure Laplacian smoothing (stiffness-only penalty).
  pub pde: Option<PdeCoefficients>,
  /// Skip the degrees-of-freedom trace when false; dof entries are then -1.
  pub compute_dof: bool,
}

impl RegressionData {
  fn validate(&self, mesh: &TriangleMesh) -> Result<(), Error> {
    if self.lambdas.is_empty() {
      return Err(Error::EmptyLambdaSequence);
    }
    let nobs = self.observations.len();
    match &self.locations {
      Some(locations) => {
        if locations.len() != nobs {
          return Err(Error::ObservationCountMismatch {
            nobs,
            nlocs: locations.len(),
          });
        }
      }
      None => {
        if nobs > mesh.nnodes() {
          return Err(Error::ObservationCountMismatch {
            nobs,
            nlocs: mesh.nnodes(),
          });
        }
      }
    }
    if let Some(w) = &self.covariates {
      if w.nrows() != nobs {
        return Err(Error::CovariateRowMismatch {
          rows: w.nrows(),
          nobs,
        });
      }
    }
    let mut seen = vec![false; mesh.nnodes()];
    for &(node, _) in &self.boundary {
      if node >= mesh.nnodes() {
        return Err(Error::BoundaryIndexOutOfRange {
          index: node,
          nnodes: mesh.nnodes(),
        });
      }
      if seen[node] {
        return Err(Error::DuplicateBoundaryNode { index: node });
      }
      seen[node] = true;
    }
    Ok(())
  }
}

pub struct RegressionSolution {
  /// One vector per lambda: covariate coefficients first, then one basis
  /// coefficient per mesh node.
  pub coefficients: Vec<na::DVector<f64>>,
  /// Effective degrees of freedom per lambda (trace of the hat matrix).
  pub dof: Vec<f64>,
}

/// Fits the smoothing surface for every lambda in `data.lambdas`.
pub fn solve(mesh: &TriangleMesh, data: &RegressionData) -> Result<RegressionSolution, Error> {
  data.validate(mesh)?;

  let mut fe = FiniteElement::new(mesh, data.order)?;
  let penalty_op = match &data.pde {
    Some(pde) => pde.operator(),
    None => operators::stiff(),
  };
  let penalty = assemble_operator(&penalty_op, mesh, &mut fe);

  let nnodes = mesh.nnodes();
  let nobs = data.observations.len();
  let psi = match &data.locations {
    Some(locations) => {
      let locator = PointLocator::new(mesh);
      evaluation_matrix(mesh, data.order, &locator, locations)?
    }
    None => SparseMatrix::from_triplets(nobs, nnodes, (0..nobs).map(|k| (k, k, 1.0)).collect()),
  };
  let psi_csc = psi.to_nalgebra_csc();
  let psi_t = psi_csc.transpose();

  let q = data.covariates.as_ref().map_or(0, |w| w.ncols());
  let size = q + nnodes;

  // Unpenalized normal-equation block B = [W Psi]^T [W Psi] and its
  // right-hand side [W Psi]^T z. Lambda only adds the scaled penalty on the
  // basis block.
  let mut base = SparseMatrix::new(size, size);
  let mut rhs0 = na::DVector::zeros(size);
  if let Some(w) = &data.covariates {
    let wtw = w.transpose() * w;
    for r in 0..q {
      for c in 0..q {
        base.push(r, c, wtw[(r, c)]);
      }
    }
    let psi_t_w = &psi_t * w;
    for c in 0..q {
      for r in 0..nnodes {
        let v = psi_t_w[(r, c)];
        if v != 0.0 {
          base.push(c, q + r, v);
          base.push(q + r, c, v);
        }
      }
    }
    let wtz = w.transpose() * &data.observations;
    for r in 0..q {
      rhs0[r] = wtz[r];
    }
  }
  let psi_t_psi = &psi_t * &psi_csc;
  for (r, c, &v) in psi_t_psi.triplet_iter() {
    base.push(q + r, q + c, v);
  }
  let psi_t_z = &psi_t * &data.observations;
  for r in 0..nnodes {
    rhs0[q + r] = psi_t_z[r];
  }

  // Dirichlet bookkeeping in block indexing.
  let mut bc_flags = vec![false; size];
  let mut x_bc = na::DVector::zeros(size);
  for &(node, value) in &data.boundary {
    bc_flags[q + node] = true;
    x_bc[q + node] = value;
  }

  // The trace argument of the hat matrix, with prescribed rows/columns
  // removed: those coefficients are not estimated from z.
  let trace_block = data.compute_dof.then(|| {
    let mut b = base.clone();
    if !data.boundary.is_empty() {
      b.set_zero(|r, c| bc_flags[r] || bc_flags[c]);
    }
    b.to_nalgebra_dense()
  });

  let mut coefficients = Vec::with_capacity(data.lambdas.len());
  let mut dof = Vec::with_capacity(data.lambdas.len());

  for &lambda in &data.lambdas {
    let mut a = base.clone();
    a.push_block(q, q, lambda, &penalty);

    let mut rhs = rhs0.clone();
    if !data.boundary.is_empty() {
      // Row/column elimination: move the prescribed part to the right-hand
      // side, then pin the fixed coefficients with a unit diagonal.
      let a_csc = a.to_nalgebra_csc();
      rhs -= &a_csc * &x_bc;
      a.set_zero(|r, c| bc_flags[r] || bc_flags[c]);
      for &(node, value) in &data.boundary {
        a.push(q + node, q + node, 1.0);
        rhs[q + node] = value;
      }
    }

    let lu = FaerLu::new(a.to_nalgebra_csc())?;
    let x = lu.solve(&rhs);

    let edf = match &trace_block {
      Some(b) => lu.solve_mat(b).diagonal().sum(),
      None => -1.0,
    };
    debug!(lambda, edf, "solved penalized system");

    coefficients.push(x);
    dof.push(edf);
  }

  Ok(RegressionSolution { coefficients, dof })
}
