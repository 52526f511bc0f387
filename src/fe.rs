//! Reference elements, quadrature and the per-element evaluation context.
//!
//! Shape functions live on the reference triangle with vertices
//! (0,0), (1,0), (0,1); barycentric coordinates are
//! l0 = 1 - x - y, l1 = x, l2 = y.

use once_cell::sync::Lazy;

use crate::{
  mesh::{Point, TriangleMesh},
  Error, NodeIdx, TriangleIdx,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementOrder {
  Linear,
  Quadratic,
}

impl ElementOrder {
  pub fn from_degree(degree: usize) -> Option<Self> {
    match degree {
      1 => Some(Self::Linear),
      2 => Some(Self::Quadratic),
      _ => None,
    }
  }

  pub fn degree(self) -> usize {
    match self {
      Self::Linear => 1,
      Self::Quadratic => 2,
    }
  }

  /// Local basis functions per triangle: 3 corner hats or 6 (corners + edge
  /// bubbles).
  pub fn ndofs(self) -> usize {
    match self {
      Self::Linear => 3,
      Self::Quadratic => 6,
    }
  }
}

/// A quadrature rule on the reference triangle. Weights sum to the reference
/// area 1/2, so `sum_q w_q |det J| f(x_q)` integrates over a physical
/// triangle.
pub struct QuadRule {
  pub points: Vec<Point>,
  pub weights: Vec<f64>,
}

impl QuadRule {
  pub fn npoints(&self) -> usize {
    self.weights.len()
  }
}

/// 3-point rule, exact for polynomials up to degree 2.
static QUAD_DEGREE2: Lazy<QuadRule> = Lazy::new(|| QuadRule {
  points: vec![
    Point::new(1.0 / 6.0, 1.0 / 6.0),
    Point::new(2.0 / 3.0, 1.0 / 6.0),
    Point::new(1.0 / 6.0, 2.0 / 3.0),
  ],
  weights: vec![1.0 / 6.0; 3],
});

/// 6-point rule, exact for polynomials up to degree 4.
static QUAD_DEGREE4: Lazy<QuadRule> = Lazy::new(|| {
  let a = 0.445948490915965;
  let b = 0.091576213509771;
  let wa = 0.223381589678011 / 2.0;
  let wb = 0.109951743655322 / 2.0;
  QuadRule {
    points: vec![
      Point::new(a, a),
      Point::new(1.0 - 2.0 * a, a),
      Point::new(a, 1.0 - 2.0 * a),
      Point::new(b, b),
      Point::new(1.0 - 2.0 * b, b),
      Point::new(b, 1.0 - 2.0 * b),
    ],
    weights: vec![wa, wa, wa, wb, wb, wb],
  }
});

/// The rule matching an element order: mass integrands of degree 2p need
/// exactness 2 for linear and 4 for quadratic elements.
pub fn quad_rule(order: ElementOrder) -> &'static QuadRule {
  match order {
    ElementOrder::Linear => &QUAD_DEGREE2,
    ElementOrder::Quadratic => &QUAD_DEGREE4,
  }
}

fn grad_bary(i: usize) -> Point {
  match i {
    0 => Point::new(-1.0, -1.0),
    1 => Point::new(1.0, 0.0),
    _ => Point::new(0.0, 1.0),
  }
}

fn bary(i: usize, p: &Point) -> f64 {
  match i {
    0 => 1.0 - p.x - p.y,
    1 => p.x,
    _ => p.y,
  }
}

/// Reference shape function `i` at reference point `p`.
pub fn ref_shape(order: ElementOrder, i: usize, p: &Point) -> f64 {
  match order {
    ElementOrder::Linear => bary(i, p),
    ElementOrder::Quadratic => {
      if i < 3 {
        let l = bary(i, p);
        l * (2.0 * l - 1.0)
      } else {
        // Edge bubble opposite corner i - 3.
        let (j, k) = ((i - 2) % 3, (i - 1) % 3);
        4.0 * bary(j, p) * bary(k, p)
      }
    }
  }
}

/// Gradient of reference shape function `i` at reference point `p`.
pub fn ref_shape_grad(order: ElementOrder, i: usize, p: &Point) -> Point {
  match order {
    ElementOrder::Linear => grad_bary(i),
    ElementOrder::Quadratic => {
      if i < 3 {
        (4.0 * bary(i, p) - 1.0) * grad_bary(i)
      } else {
        let (j, k) = ((i - 2) % 3, (i - 1) % 3);
        4.0 * (bary(k, p) * grad_bary(j) + bary(j, p) * grad_bary(k))
      }
    }
  }
}

/// Evaluation context for one triangle at a time.
///
/// `update_element` recomputes the affine map and caches everything that all
/// operators assembled in the same mesh pass share: physical quadrature
/// points, the Jacobian determinant and pushed-forward basis gradients.
/// Reference basis values are element-independent and tabulated once.
pub struct FiniteElement<'a> {
  mesh: &'a TriangleMesh,
  order: ElementOrder,
  rule: &'static QuadRule,
  /// `phi[q][i]`: reference basis values, fixed.
  phi: Vec<Vec<f64>>,
  /// `ref_grads[q][i]`: reference basis gradients, fixed.
  ref_grads: Vec<Vec<Point>>,

  current: TriangleIdx,
  det_jac: f64,
  /// `phys_grads[q][i] = J^-T grad_ref`, per element.
  phys_grads: Vec<Vec<Point>>,
  phys_points: Vec<Point>,
}

impl<'a> FiniteElement<'a> {
  pub fn new(mesh: &'a TriangleMesh, order: ElementOrder) -> Result<Self, Error> {
    if !mesh.supports(order) {
      return Err(Error::MissingMidpoints);
    }
    let rule = quad_rule(order);
    let ndofs = order.ndofs();

    let phi = rule
      .points
      .iter()
      .map(|p| (0..ndofs).map(|i| ref_shape(order, i, p)).collect())
      .collect();
    let ref_grads: Vec<Vec<Point>> = rule
      .points
      .iter()
      .map(|p| (0..ndofs).map(|i| ref_shape_grad(order, i, p)).collect())
      .collect();

    let mut fe = Self {
      mesh,
      order,
      rule,
      phi,
      phys_grads: ref_grads.clone(),
      ref_grads,
      current: 0,
      det_jac: 0.0,
      phys_points: vec![Point::zeros(); rule.npoints()],
    };
    if mesh.ntriangles() > 0 {
      fe.update_element(0);
    }
    Ok(fe)
  }

  pub fn order(&self) -> ElementOrder {
    self.order
  }
  pub fn ndofs(&self) -> usize {
    self.order.ndofs()
  }
  pub fn nquad(&self) -> usize {
    self.rule.npoints()
  }
  pub fn current_triangle(&self) -> TriangleIdx {
    self.current
  }

  /// Recomputes the affine map x = a + J xi for triangle `t` and refreshes
  /// the cached physical quantities.
  pub fn update_element(&mut self, t: TriangleIdx) {
    let [a, b, c] = self.mesh.corner_coords(t);
    let jac = na::Matrix2::from_columns(&[b - a, c - a]);
    let det = jac.determinant();
    // Mesh construction rejects degenerate triangles, so det != 0.
    let inv_jac_t = na::Matrix2::new(jac[(1, 1)], -jac[(1, 0)], -jac[(0, 1)], jac[(0, 0)]) / det;

    self.current = t;
    self.det_jac = det;
    for q in 0..self.nquad() {
      self.phys_points[q] = a + jac * self.rule.points[q];
      for i in 0..self.ndofs() {
        self.phys_grads[q][i] = inv_jac_t * self.ref_grads[q][i];
      }
    }
  }

  /// Basis value at quadrature point `q` (element-independent).
  pub fn phi(&self, i: usize, q: usize) -> f64 {
    self.phi[q][i]
  }

  /// Physical gradient of basis `i` at quadrature point `q`.
  pub fn grad_phi(&self, i: usize, q: usize) -> &Point {
    &self.phys_grads[q][i]
  }

  /// Physical coordinates of quadrature point `q`.
  pub fn quad_point(&self, q: usize) -> &Point {
    &self.phys_points[q]
  }

  pub fn quad_weight(&self, q: usize) -> f64 {
    self.rule.weights[q]
  }

  pub fn det_jacobian(&self) -> f64 {
    self.det_jac
  }

  /// Global node index of local basis `i` on the current triangle.
  pub fn global_dof(&self, i: usize) -> NodeIdx {
    self.mesh.dof(self.current, i, self.order)
  }
}
