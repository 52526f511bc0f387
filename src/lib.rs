//! Finite element smoothing of spatial point data over triangulated 2D domains.
//!
//! The regression surface minimizes a penalized least-squares functional whose
//! roughness term is a diffusion-advection-reaction operator in weak form,
//! assembled over the triangulation with Lagrange elements of order 1 or 2.

extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod api;
pub mod assemble;
pub mod fe;
pub mod mesh;
pub mod operators;
pub mod regression;
pub mod sparse;

pub type NodeIdx = usize;
pub type TriangleIdx = usize;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("triangle {triangle} references node {index}, but mesh has only {nnodes} nodes")]
  InvalidNodeIndex {
    triangle: TriangleIdx,
    index: NodeIdx,
    nnodes: usize,
  },
  #[error("triangle {triangle} is degenerate (zero area)")]
  DegenerateTriangle { triangle: TriangleIdx },
  #[error("mesh has {ntriangles} triangles but {nmidpoints} midpoint triples")]
  MidpointCountMismatch {
    ntriangles: usize,
    nmidpoints: usize,
  },
  #[error("quadratic basis requested, but mesh carries no edge-midpoint nodes")]
  MissingMidpoints,
  #[error("boundary condition references node {index}, but mesh has only {nnodes} nodes")]
  BoundaryIndexOutOfRange { index: NodeIdx, nnodes: usize },
  #[error("node {index} appears more than once in the boundary conditions")]
  DuplicateBoundaryNode { index: NodeIdx },
  #[error("covariate matrix has {rows} rows, but there are {nobs} observations")]
  CovariateRowMismatch { rows: usize, nobs: usize },
  #[error("{nobs} observations do not match the {nlocs} observation locations")]
  ObservationCountMismatch { nobs: usize, nlocs: usize },
  #[error("smoothing parameter sequence is empty")]
  EmptyLambdaSequence,
  #[error("observation {index} lies outside the mesh")]
  PointOutsideMesh { index: usize },
  #[error("linear system is singular or too ill-conditioned to factorize")]
  SingularSystem,
}
