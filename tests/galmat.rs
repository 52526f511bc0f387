//! Global assembly properties on structured unit-square meshes.

extern crate nalgebra as na;

use fesmooth::{
  assemble::assemble_operator,
  fe::{ElementOrder, FiniteElement},
  mesh::{Point, TriangleMesh},
  operators::{self, ScalarCoeff},
};

/// Unit square, (n+1)^2 nodes, 2 n^2 triangles, all counterclockwise.
fn unit_square_mesh(n: usize) -> TriangleMesh {
  let h = 1.0 / n as f64;
  let mut nodes = Vec::with_capacity((n + 1) * (n + 1));
  for j in 0..=n {
    for i in 0..=n {
      nodes.push(Point::new(i as f64 * h, j as f64 * h));
    }
  }
  let at = |i: usize, j: usize| j * (n + 1) + i;
  let mut corners = Vec::with_capacity(2 * n * n);
  for j in 0..n {
    for i in 0..n {
      corners.push([at(i, j), at(i + 1, j), at(i + 1, j + 1)]);
      corners.push([at(i, j), at(i + 1, j + 1), at(i, j + 1)]);
    }
  }
  TriangleMesh::new(nodes, corners, None).unwrap()
}

#[test]
fn mass_is_symmetric_and_sums_to_area() {
  let mesh = unit_square_mesh(4);
  let mut fe = FiniteElement::new(&mesh, ElementOrder::Linear).unwrap();
  let mass = assemble_operator(&operators::mass(), &mesh, &mut fe).to_nalgebra_dense();

  assert!((&mass - mass.transpose()).norm() < 1e-14);

  let total: f64 = mass.iter().sum();
  println!("total mass: {total}");
  assert!((total - 1.0).abs() < 1e-12);

  // Row sum of node i is the integral of basis i, strictly positive.
  for i in 0..mesh.nnodes() {
    assert!(mass.row(i).iter().sum::<f64>() > 0.0);
  }
}

#[test]
fn stiffness_has_constants_in_null_space() {
  let mesh = unit_square_mesh(4);
  let mut fe = FiniteElement::new(&mesh, ElementOrder::Linear).unwrap();
  let stiff = assemble_operator(&operators::stiff(), &mesh, &mut fe).to_nalgebra_dense();

  assert!((&stiff - stiff.transpose()).norm() < 1e-13);
  for i in 0..mesh.nnodes() {
    let row_sum: f64 = stiff.row(i).iter().sum();
    assert!(row_sum.abs() < 1e-12, "row {i}: {row_sum}");
  }
}

#[test]
fn advection_is_not_symmetric() {
  let mesh = unit_square_mesh(3);
  let mut fe = FiniteElement::new(&mesh, ElementOrder::Linear).unwrap();
  let beta = na::Vector2::new(1.0, 0.0);
  let adv = assemble_operator(&operators::advection(beta), &mesh, &mut fe).to_nalgebra_dense();

  assert!((&adv - adv.transpose()).norm() > 1e-8);
}

#[test]
fn operator_addition_matches_separate_assembly() {
  let mesh = unit_square_mesh(3);
  let mut fe = FiniteElement::new(&mesh, ElementOrder::Linear).unwrap();

  let beta = na::Vector2::new(0.5, -1.0);
  let k = na::Matrix2::new(2.0, 0.5, 0.5, 1.0);

  let combined = assemble_operator(
    &(3.0 * operators::mass() + operators::stiff_aniso(k) + operators::advection(beta)),
    &mesh,
    &mut fe,
  )
  .to_nalgebra_dense();

  let separate = 3.0
    * assemble_operator(&operators::mass(), &mesh, &mut fe).to_nalgebra_dense()
    + assemble_operator(&operators::stiff_aniso(k), &mesh, &mut fe).to_nalgebra_dense()
    + assemble_operator(&operators::advection(beta), &mesh, &mut fe).to_nalgebra_dense();

  let diff = (&combined - &separate).norm();
  println!("additivity diff: {diff:e}");
  assert!(diff < 1e-12);
}

#[test]
fn scalar_scaling_commutes_with_assembly() {
  let mesh = unit_square_mesh(2);
  let mut fe = FiniteElement::new(&mesh, ElementOrder::Linear).unwrap();

  let scaled = assemble_operator(&(7.0 * operators::mass()), &mesh, &mut fe).to_nalgebra_dense();
  let plain = assemble_operator(&operators::mass(), &mesh, &mut fe).to_nalgebra_dense();
  assert!((scaled - 7.0 * plain).norm() < 1e-13);
}

#[test]
fn reassembly_is_deterministic() {
  let mesh = unit_square_mesh(4);
  let mut fe = FiniteElement::new(&mesh, ElementOrder::Linear).unwrap();
  let op = 2.0 * operators::mass() + operators::stiff();

  let first = assemble_operator(&op, &mesh, &mut fe).to_triplets();
  let second = assemble_operator(&op, &mesh, &mut fe).to_triplets();
  assert_eq!(first, second);
}

#[test]
fn varying_coefficient_evaluates_at_physical_points() {
  // Mass scaled by (1 + x) on the reference triangle: all basis sums cancel
  // and the matrix total is the exact integral of (1 + x), which the 3-point
  // rule integrates exactly.
  let nodes = vec![
    Point::new(0.0, 0.0),
    Point::new(1.0, 0.0),
    Point::new(0.0, 1.0),
  ];
  let mesh = TriangleMesh::new(nodes, vec![[0, 1, 2]], None).unwrap();
  let mut fe = FiniteElement::new(&mesh, ElementOrder::Linear).unwrap();

  let op = operators::mass().scaled(ScalarCoeff::varying(|p: &Point| 1.0 + p.x));
  let matrix = assemble_operator(&op, &mesh, &mut fe).to_nalgebra_dense();

  let total: f64 = matrix.iter().sum();
  let exact = 0.5 + 1.0 / 6.0;
  assert!((total - exact).abs() < 1e-14, "total {total} vs {exact}");
}

#[test]
fn quadratic_assembly_uses_midpoint_dofs() {
  // One-cell square split in two triangles, full P2 node set: 4 corners,
  // 4 edge midpoints on the outline, 1 on the diagonal.
  let nodes = vec![
    Point::new(0.0, 0.0), // 0
    Point::new(1.0, 0.0), // 1
    Point::new(1.0, 1.0), // 2
    Point::new(0.0, 1.0), // 3
    Point::new(0.5, 0.0), // 4
    Point::new(1.0, 0.5), // 5
    Point::new(0.5, 1.0), // 6
    Point::new(0.0, 0.5), // 7
    Point::new(0.5, 0.5), // 8 diagonal
  ];
  let corners = vec![[0, 1, 2], [0, 2, 3]];
  let midpoints = vec![[5, 8, 4], [6, 7, 8]];
  let mesh = TriangleMesh::new(nodes, corners, Some(midpoints)).unwrap();

  let mut fe = FiniteElement::new(&mesh, ElementOrder::Quadratic).unwrap();
  let mass = assemble_operator(&operators::mass(), &mesh, &mut fe).to_nalgebra_dense();
  let stiff = assemble_operator(&operators::stiff(), &mesh, &mut fe).to_nalgebra_dense();

  let total: f64 = mass.iter().sum();
  assert!((total - 1.0).abs() < 1e-12);

  for i in 0..mesh.nnodes() {
    let row_sum: f64 = stiff.row(i).iter().sum();
    assert!(row_sum.abs() < 1e-12, "row {i}: {row_sum}");
  }

  // The diagonal midpoint is shared by both triangles and must accumulate
  // from each: its mass diagonal entry is twice the single-element value.
  assert!(mass[(8, 8)] > 1.5 * mass[(4, 4)]);
}
