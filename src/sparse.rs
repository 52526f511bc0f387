//! Triplet-based sparse matrices and the sparse LU solver wrapper.
//!
//! Assembly accumulates duplicate triplets; they are summed on conversion to
//! COO/CSC. Indices are 0-based everywhere inside the crate; the 1-based view
//! for host consumption lives in [`SparseMatrix::to_canonical_triplets`]
//! callers (see `api`).

use faer::solvers::SpSolver;
use itertools::Itertools;

use crate::Error;

#[derive(Default, Clone, PartialEq)]
pub struct SparseMatrix {
  nrows: usize,
  ncols: usize,
  triplets: Vec<(usize, usize, f64)>,
}

impl SparseMatrix {
  pub fn new(nrows: usize, ncols: usize) -> Self {
    Self::from_triplets(nrows, ncols, Vec::new())
  }

  pub fn from_triplets(nrows: usize, ncols: usize, triplets: Vec<(usize, usize, f64)>) -> Self {
    Self {
      nrows,
      ncols,
      triplets,
    }
  }

  pub fn nrows(&self) -> usize {
    self.nrows
  }
  pub fn ncols(&self) -> usize {
    self.ncols
  }

  pub fn ntriplets(&self) -> usize {
    self.triplets.len()
  }

  pub fn push(&mut self, r: usize, c: usize, v: f64) {
    self.triplets.push((r, c, v));
  }

  /// Appends all triplets of `other`, offset to the block at `(row0, col0)`
  /// and scaled by `scale`.
  pub fn push_block(&mut self, row0: usize, col0: usize, scale: f64, other: &SparseMatrix) {
    for &(r, c, v) in &other.triplets {
      self.triplets.push((row0 + r, col0 + c, scale * v));
    }
  }

  /// Removes all triplets whose position satisfies the predicate.
  pub fn set_zero<F>(&mut self, predicate: F)
  where
    F: Fn(usize, usize) -> bool,
  {
    let mut i = 0;
    while i < self.triplets.len() {
      let (r, c, _) = self.triplets[i];
      if predicate(r, c) {
        self.triplets.swap_remove(i);
      } else {
        i += 1;
      }
    }
  }

  pub fn to_nalgebra_coo(&self) -> nas::CooMatrix<f64> {
    let (rows, cols, vals) = self.triplets.iter().copied().multiunzip();
    nas::CooMatrix::try_from_triplets(self.nrows, self.ncols, rows, cols, vals).unwrap()
  }

  pub fn to_nalgebra_csc(&self) -> nas::CscMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_nalgebra_dense(&self) -> na::DMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_triplets(self) -> Vec<(usize, usize, f64)> {
    self.triplets
  }

  /// Duplicate-free triplets in column-major order, the canonical read-only
  /// view handed to hosts.
  pub fn to_canonical_triplets(&self) -> Vec<(usize, usize, f64)> {
    self
      .to_nalgebra_csc()
      .triplet_iter()
      .map(|(r, c, &v)| (r, c, v))
      .collect()
  }
}

type SparseMatrixFaer = faer::sparse::SparseColMat<usize, f64>;

pub fn nalgebra2faer(m: nas::CscMatrix<f64>) -> SparseMatrixFaer {
  let nrows = m.nrows();
  let ncols = m.ncols();
  let (col_ptrs, row_indices, values) = m.disassemble();

  let symbolic =
    faer::sparse::SymbolicSparseColMat::new_checked(nrows, ncols, col_ptrs, None, row_indices);
  faer::sparse::SparseColMat::new(symbolic, values)
}

/// Sparse LU factorization. The assembled systems are non-symmetric in
/// general (advection term, parametric coupling), so LU it is.
pub struct FaerLu {
  raw: faer::sparse::linalg::solvers::Lu<usize, f64>,
}
impl FaerLu {
  pub fn new(a: nas::CscMatrix<f64>) -> Result<Self, Error> {
    let raw = nalgebra2faer(a)
      .sp_lu()
      .map_err(|_| Error::SingularSystem)?;
    Ok(Self { raw })
  }

  pub fn solve(&self, b: &na::DVector<f64>) -> na::DVector<f64> {
    let b = faer::col::from_slice(b.as_slice());
    na::DVector::from_vec(self.raw.solve(b).as_slice().to_vec())
  }

  pub fn solve_mat(&self, b: &na::DMatrix<f64>) -> na::DMatrix<f64> {
    let b = faer::Mat::from_fn(b.nrows(), b.ncols(), |i, j| b[(i, j)]);
    let x = self.raw.solve(b);
    na::DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)])
  }
}
