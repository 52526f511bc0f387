//! Immutable triangulated 2D domains.
//!
//! A mesh is built once per call from caller-supplied flat data and never
//! mutated afterwards. For quadratic elements the mesh additionally carries
//! one edge-midpoint node per triangle edge; midpoint `k` lies on the edge
//! opposite corner `k` (midpoint 0 on edge (1,2), 1 on (2,0), 2 on (0,1)).

use crate::{fe::ElementOrder, Error, NodeIdx, TriangleIdx};

pub type Point = na::Vector2<f64>;

pub struct TriangleMesh {
  nodes: Vec<Point>,
  corners: Vec<[NodeIdx; 3]>,
  midpoints: Option<Vec<[NodeIdx; 3]>>,
}

impl TriangleMesh {
  /// Validates connectivity and geometry. Out-of-range node indices,
  /// zero-area triangles and a midpoint table whose length differs from the
  /// triangle count are construction errors.
  pub fn new(
    nodes: Vec<Point>,
    corners: Vec<[NodeIdx; 3]>,
    midpoints: Option<Vec<[NodeIdx; 3]>>,
  ) -> Result<Self, Error> {
    let nnodes = nodes.len();
    for (t, corner) in corners.iter().enumerate() {
      for &index in corner {
        if index >= nnodes {
          return Err(Error::InvalidNodeIndex {
            triangle: t,
            index,
            nnodes,
          });
        }
      }
    }
    if let Some(midpoints) = &midpoints {
      if midpoints.len() != corners.len() {
        return Err(Error::MidpointCountMismatch {
          ntriangles: corners.len(),
          nmidpoints: midpoints.len(),
        });
      }
      for (t, midpoint) in midpoints.iter().enumerate() {
        for &index in midpoint {
          if index >= nnodes {
            return Err(Error::InvalidNodeIndex {
              triangle: t,
              index,
              nnodes,
            });
          }
        }
      }
    }

    let mesh = Self {
      nodes,
      corners,
      midpoints,
    };
    for t in 0..mesh.ntriangles() {
      if mesh.signed_area(t).abs() < f64::EPSILON {
        return Err(Error::DegenerateTriangle { triangle: t });
      }
    }
    Ok(mesh)
  }

  pub fn nnodes(&self) -> usize {
    self.nodes.len()
  }
  pub fn ntriangles(&self) -> usize {
    self.corners.len()
  }
  pub fn node(&self, i: NodeIdx) -> &Point {
    &self.nodes[i]
  }
  pub fn nodes(&self) -> &[Point] {
    &self.nodes
  }

  pub fn corner_coords(&self, t: TriangleIdx) -> [Point; 3] {
    let [a, b, c] = self.corners[t];
    [self.nodes[a], self.nodes[b], self.nodes[c]]
  }

  pub fn supports(&self, order: ElementOrder) -> bool {
    match order {
      ElementOrder::Linear => true,
      ElementOrder::Quadratic => self.midpoints.is_some(),
    }
  }

  /// Global node of local basis function `local` on triangle `t`.
  /// Locals 0..3 are corners; 3..6 map to the edge-midpoint nodes.
  pub fn dof(&self, t: TriangleIdx, local: usize, order: ElementOrder) -> NodeIdx {
    debug_assert!(local < order.ndofs());
    if local < 3 {
      self.corners[t][local]
    } else {
      match &self.midpoints {
        Some(midpoints) => midpoints[t][local - 3],
        None => panic!("quadratic dof on a mesh without midpoint nodes"),
      }
    }
  }

  pub fn signed_area(&self, t: TriangleIdx) -> f64 {
    let [a, b, c] = self.corner_coords(t);
    0.5 * cross2(&(b - a), &(c - a))
  }

  pub fn area(&self, t: TriangleIdx) -> f64 {
    self.signed_area(t).abs()
  }

  pub fn total_area(&self) -> f64 {
    (0..self.ntriangles()).map(|t| self.area(t)).sum()
  }

  /// Barycentric coordinates of `p` w.r.t. triangle `t`.
  pub fn barycentric(&self, t: TriangleIdx, p: &Point) -> [f64; 3] {
    let [a, b, c] = self.corner_coords(t);
    let det = cross2(&(b - a), &(c - a));
    let l1 = cross2(&(p - a), &(c - a)) / det;
    let l2 = cross2(&(b - a), &(p - a)) / det;
    [1.0 - l1 - l2, l1, l2]
  }
}

fn cross2(u: &Point, v: &Point) -> f64 {
  u.x * v.y - u.y * v.x
}

/// Tolerance for the containment test; points on shared edges belong to
/// whichever incident triangle is found first.
const BARY_TOL: f64 = 1e-10;

/// Uniform bounding-box grid over the mesh for point location.
///
/// Each grid cell lists the triangles whose bounding box overlaps it; a query
/// tests only the candidates of the cell containing the point.
pub struct PointLocator<'a> {
  mesh: &'a TriangleMesh,
  min: Point,
  max: Point,
  nx: usize,
  ny: usize,
  cells: Vec<Vec<TriangleIdx>>,
}

impl<'a> PointLocator<'a> {
  pub fn new(mesh: &'a TriangleMesh) -> Self {
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for node in mesh.nodes() {
      min = min.inf(node);
      max = max.sup(node);
    }

    let n = (mesh.ntriangles() as f64).sqrt().ceil() as usize;
    let nx = n.max(1);
    let ny = n.max(1);
    let mut locator = Self {
      mesh,
      min,
      max,
      nx,
      ny,
      cells: vec![Vec::new(); nx * ny],
    };

    for t in 0..mesh.ntriangles() {
      let [a, b, c] = mesh.corner_coords(t);
      let tmin = a.inf(&b).inf(&c);
      let tmax = a.sup(&b).sup(&c);
      let (ix0, iy0) = locator.cell_of(&tmin);
      let (ix1, iy1) = locator.cell_of(&tmax);
      for iy in iy0..=iy1 {
        for ix in ix0..=ix1 {
          locator.cells[iy * nx + ix].push(t);
        }
      }
    }
    locator
  }

  fn cell_of(&self, p: &Point) -> (usize, usize) {
    let extent = self.max - self.min;
    let fx = if extent.x > 0.0 {
      (p.x - self.min.x) / extent.x
    } else {
      0.0
    };
    let fy = if extent.y > 0.0 {
      (p.y - self.min.y) / extent.y
    } else {
      0.0
    };
    let ix = ((fx * self.nx as f64) as isize).clamp(0, self.nx as isize - 1) as usize;
    let iy = ((fy * self.ny as f64) as isize).clamp(0, self.ny as isize - 1) as usize;
    (ix, iy)
  }

  /// Finds the triangle containing `p` together with its barycentric
  /// coordinates, or `None` if no triangle contains it.
  pub fn locate(&self, p: &Point) -> Option<(TriangleIdx, [f64; 3])> {
    if p.x < self.min.x - BARY_TOL
      || p.x > self.max.x + BARY_TOL
      || p.y < self.min.y - BARY_TOL
      || p.y > self.max.y + BARY_TOL
    {
      return None;
    }
    let (ix, iy) = self.cell_of(p);
    for &t in &self.cells[iy * self.nx + ix] {
      let bary = self.mesh.barycentric(t, p);
      if bary.iter().all(|&l| l >= -BARY_TOL) {
        return Some((t, bary));
      }
    }
    None
  }
}
