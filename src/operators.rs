//! Weak-form operator algebra.
//!
//! A [`BilinearOp`] is an immutable expression tree over the mass, stiffness
//! and gradient (advection) forms, scaled by scalar/tensor coefficients and
//! combined by addition. Nothing is evaluated at construction; the tree is
//! walked once per (i, j, q) during assembly, with coefficients evaluated at
//! the quadrature point's physical position. One tree can be reused across
//! any number of meshes and assemblies.
//!
//! The composition surface mirrors the analytic notation: the full elliptic
//! operator reads `c * mass() + stiff_aniso(k) + advection(beta)`.

use std::ops::{Add, Mul};
use std::rc::Rc;

use crate::{fe::FiniteElement, mesh::Point};

pub type ScalarField = dyn Fn(&Point) -> f64;
pub type TensorField = dyn Fn(&Point) -> na::Matrix2<f64>;
pub type VectorField = dyn Fn(&Point) -> na::Vector2<f64>;

/// Scalar coefficient, constant or evaluated at the physical position.
#[derive(Clone)]
pub enum ScalarCoeff {
  Constant(f64),
  Varying(Rc<ScalarField>),
}

impl ScalarCoeff {
  pub fn varying(f: impl Fn(&Point) -> f64 + 'static) -> Self {
    Self::Varying(Rc::new(f))
  }

  pub fn eval(&self, x: &Point) -> f64 {
    match self {
      Self::Constant(c) => *c,
      Self::Varying(f) => f(x),
    }
  }
}

impl From<f64> for ScalarCoeff {
  fn from(c: f64) -> Self {
    Self::Constant(c)
  }
}

/// 2x2 tensor coefficient for anisotropic diffusion.
#[derive(Clone)]
pub enum TensorCoeff {
  Constant(na::Matrix2<f64>),
  Varying(Rc<TensorField>),
}

impl TensorCoeff {
  pub fn varying(f: impl Fn(&Point) -> na::Matrix2<f64> + 'static) -> Self {
    Self::Varying(Rc::new(f))
  }

  pub fn eval(&self, x: &Point) -> na::Matrix2<f64> {
    match self {
      Self::Constant(k) => *k,
      Self::Varying(f) => f(x),
    }
  }
}

impl From<na::Matrix2<f64>> for TensorCoeff {
  fn from(k: na::Matrix2<f64>) -> Self {
    Self::Constant(k)
  }
}

/// Advection vector coefficient.
#[derive(Clone)]
pub enum VectorCoeff {
  Constant(na::Vector2<f64>),
  Varying(Rc<VectorField>),
}

impl VectorCoeff {
  pub fn varying(f: impl Fn(&Point) -> na::Vector2<f64> + 'static) -> Self {
    Self::Varying(Rc::new(f))
  }

  pub fn eval(&self, x: &Point) -> na::Vector2<f64> {
    match self {
      Self::Constant(b) => *b,
      Self::Varying(f) => f(x),
    }
  }
}

impl From<na::Vector2<f64>> for VectorCoeff {
  fn from(b: na::Vector2<f64>) -> Self {
    Self::Constant(b)
  }
}

/// A weak-form bilinear integrand, evaluated per local basis pair and
/// quadrature point during assembly.
#[derive(Clone)]
pub enum BilinearOp {
  /// phi_i phi_j
  Mass,
  /// grad phi_i . K grad phi_j (isotropic when `None`)
  Stiff(Option<TensorCoeff>),
  /// phi_i (beta . grad phi_j)
  Grad(VectorCoeff),
  Scaled(ScalarCoeff, Box<BilinearOp>),
  Sum(Box<BilinearOp>, Box<BilinearOp>),
}

pub fn mass() -> BilinearOp {
  BilinearOp::Mass
}

pub fn stiff() -> BilinearOp {
  BilinearOp::Stiff(None)
}

pub fn stiff_aniso(k: impl Into<TensorCoeff>) -> BilinearOp {
  BilinearOp::Stiff(Some(k.into()))
}

pub fn advection(beta: impl Into<VectorCoeff>) -> BilinearOp {
  BilinearOp::Grad(beta.into())
}

impl BilinearOp {
  pub fn scaled(self, coeff: impl Into<ScalarCoeff>) -> Self {
    Self::Scaled(coeff.into(), Box::new(self))
  }

  /// Local integrand contribution at quadrature point `q` of the current
  /// element, for local basis pair (i, j).
  pub fn eval(&self, fe: &FiniteElement, i: usize, j: usize, q: usize) -> f64 {
    match self {
      Self::Mass => fe.phi(i, q) * fe.phi(j, q),
      Self::Stiff(None) => fe.grad_phi(i, q).dot(fe.grad_phi(j, q)),
      Self::Stiff(Some(k)) => {
        let k = k.eval(fe.quad_point(q));
        fe.grad_phi(i, q).dot(&(k * fe.grad_phi(j, q)))
      }
      Self::Grad(beta) => {
        let beta = beta.eval(fe.quad_point(q));
        fe.phi(i, q) * beta.dot(fe.grad_phi(j, q))
      }
      Self::Scaled(c, inner) => c.eval(fe.quad_point(q)) * inner.eval(fe, i, j, q),
      Self::Sum(a, b) => a.eval(fe, i, j, q) + b.eval(fe, i, j, q),
    }
  }
}

impl Add for BilinearOp {
  type Output = BilinearOp;
  fn add(self, rhs: BilinearOp) -> BilinearOp {
    BilinearOp::Sum(Box::new(self), Box::new(rhs))
  }
}

impl Mul<BilinearOp> for f64 {
  type Output = BilinearOp;
  fn mul(self, rhs: BilinearOp) -> BilinearOp {
    rhs.scaled(self)
  }
}
