//! Test support library
//! Provides various helper functions & utilities for tests.
#![allow(dead_code)]

use csgbrush::{
    brush::{Brush, BrushShape, CsgMode, shapes::cuboid},
    float_types::Real,
    geometry::{Polygon, Vertex},
};
use nalgebra::{Point3, Vector3};

/// Returns the approximate bounding box `[min_x, min_y, min_z, max_x, max_y, max_z]`
/// for a set of polygons.
pub fn bounding_box(polygons: &[Polygon]) -> [Real; 6] {
    let mut min = Point3::new(Real::MAX, Real::MAX, Real::MAX);
    let mut max = Point3::new(Real::MIN, Real::MIN, Real::MIN);
    for poly in polygons {
        for v in poly.vertices() {
            min = min.inf(&v.pos);
            max = max.sup(&v.pos);
        }
    }
    [min.x, min.y, min.z, max.x, max.y, max.z]
}

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Helper to make a simple Polygon in 3D with given vertices.
pub fn make_polygon_3d(points: &[[Real; 3]]) -> Polygon {
    let verts: Vec<Vertex> = points
        .iter()
        .map(|p| Vertex::new(Point3::new(p[0], p[1], p[2]), Vector3::z()))
        .collect();
    Polygon::new(verts, None).expect("test polygon must not be degenerate")
}

/// Axis-aligned cube faces spanning `min..max` on every axis.
pub fn cube_polygons(min: Real, max: Real) -> Vec<Polygon> {
    cuboid(Point3::new(min, min, min), Point3::new(max, max, max), None)
}

/// Generated cube brush of edge `size` centred on `center`.
pub fn cube_brush(center: [Real; 3], size: Real, mode: CsgMode) -> Brush {
    Brush::from_shape(
        BrushShape::Cuboid {
            center: Point3::new(center[0], center[1], center[2]),
            size: Vector3::repeat(size),
        },
        mode,
    )
}

/// Sum of polygon areas.
pub fn total_area<'a>(polygons: impl IntoIterator<Item = &'a Polygon>) -> Real {
    polygons.into_iter().map(Polygon::area).sum()
}
