//! Building polygons from unordered coplanar point sets.

use crate::float_types::{PI, Real, tolerances};
use crate::geometry::{Polygon, Vertex};
use geo::{ConvexHull, MultiPoint, Point as GeoPoint};
use nalgebra::{Point3, Rotation3, Vector2, Vector3, Vector4};

/// Drop points that are within `epsilon` of an earlier point.
pub fn dedupe_points(points: &[Point3<Real>], epsilon: Real) -> Vec<Point3<Real>> {
    let mut unique: Vec<Point3<Real>> = Vec::with_capacity(points.len());
    for p in points {
        if !unique.iter().any(|q| (p - q).norm_squared() <= epsilon * epsilon) {
            unique.push(*p);
        }
    }
    unique
}

/// Normal of the widest triangle spanned by the points: the longest chord plus
/// the point farthest from it. `None` when every point is (nearly) collinear.
pub fn best_fit_normal(points: &[Point3<Real>]) -> Option<Vector3<Real>> {
    if points.len() < 3 {
        return None;
    }
    let p0 = points[0];
    let p1 = *points
        .iter()
        .max_by(|a, b| (*a - p0).norm_squared().total_cmp(&(*b - p0).norm_squared()))?;
    let chord = p1 - p0;
    let eps = tolerances().point;
    if chord.norm() <= eps {
        return None;
    }
    let p2 = *points.iter().max_by(|a, b| {
        (*a - p0)
            .cross(&chord)
            .norm_squared()
            .total_cmp(&(*b - p0).cross(&chord).norm_squared())
    })?;
    let normal = chord.cross(&(p2 - p0));
    if normal.norm() <= eps * eps {
        return None;
    }
    Some(normal.normalize())
}

/// Rotation taking `normal` onto +Z.
fn rotation_to_z(normal: &Vector3<Real>) -> Rotation3<Real> {
    Rotation3::rotation_between(normal, &Vector3::z())
        .unwrap_or_else(|| Rotation3::from_axis_angle(&Vector3::x_axis(), PI))
}

/// Sort `points` counter-clockwise around their centroid as seen from `normal`
/// and build the vertices, with uvs taken from the rotated projection.
fn ring_from_points(points: &[Point3<Real>], normal: Vector3<Real>) -> Vec<Vertex> {
    let rotation = rotation_to_z(&normal);
    let projected: Vec<Vector2<Real>> = points.iter().map(|p| (rotation * p).xy().coords).collect();
    let center = projected.iter().fold(Vector2::zeros(), |acc, p| acc + p) / projected.len() as Real;

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        let pa = projected[a] - center;
        let pb = projected[b] - center;
        pa.y.atan2(pa.x).total_cmp(&pb.y.atan2(pb.x))
    });

    order
        .into_iter()
        .map(|i| {
            Vertex::with_attributes(points[i], normal, projected[i], Vector4::repeat(1.0))
        })
        .collect()
}

/// Remove vertices that lie on the segment between their neighbours.
pub fn remove_collinear_vertices(vertices: &[Vertex], epsilon: Real) -> Vec<Vertex> {
    let mut ring = vertices.to_vec();
    let mut i = 0;
    // every removal shrinks the ring, every skip advances `i`
    while ring.len() > 3 && i < ring.len() {
        let n = ring.len();
        let prev = ring[(i + n - 1) % n].pos;
        let next = ring[(i + 1) % n].pos;
        let chord = next - prev;
        let len = chord.norm();
        let off_line = if len <= Real::EPSILON {
            0.0
        } else {
            (ring[i].pos - prev).cross(&chord).norm() / len
        };
        if off_line <= epsilon {
            ring.remove(i);
            i = i.saturating_sub(1);
        } else {
            i += 1;
        }
    }
    ring
}

/// Build a convex polygon from an unordered coplanar point set by sorting the
/// points angularly around their centroid.
///
/// Near-identical points are merged first when `dedupe` is set. Returns `None`
/// (and logs) when fewer than three distinct points remain or the points do not
/// span a plane. The polygon faces the normal of the widest triangle of the set;
/// callers orient it.
pub fn polygon_from_points(points: &[Point3<Real>], dedupe: bool) -> Option<Polygon> {
    let tol = tolerances();
    let points = if dedupe {
        dedupe_points(points, tol.dedupe)
    } else {
        points.to_vec()
    };
    if points.len() < 3 {
        log::warn!("polygon_from_points: only {} distinct points", points.len());
        return None;
    }
    let Some(normal) = best_fit_normal(&points) else {
        log::warn!("polygon_from_points: {} points are collinear", points.len());
        return None;
    };

    let ring = remove_collinear_vertices(&ring_from_points(&points, normal), tol.point);
    let polygon = Polygon::new(ring, None);
    if polygon.is_none() {
        log::warn!("polygon_from_points: degenerate normal after sorting");
    }
    polygon
}

/// Like [`polygon_from_points`], but interior and collinear points are first
/// discarded by a 2D convex hull of the projected set.
pub fn convex_polygon_from_points(points: &[Point3<Real>]) -> Option<Polygon> {
    let points = dedupe_points(points, tolerances().dedupe);
    if points.len() < 3 {
        log::warn!("convex_polygon_from_points: only {} distinct points", points.len());
        return None;
    }
    let normal = best_fit_normal(&points)?;
    let rotation = rotation_to_z(&normal);
    let projected: Vec<GeoPoint<Real>> = points
        .iter()
        .map(|p| {
            let r = rotation * p;
            GeoPoint::new(r.x, r.y)
        })
        .collect();

    let hull = MultiPoint::from(projected.clone()).convex_hull();
    let hull_points: Vec<Point3<Real>> = hull
        .exterior()
        .coords()
        .filter_map(|c| projected.iter().position(|p| p.0 == *c).map(|i| points[i]))
        .collect();

    polygon_from_points(&hull_points, true)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builds_square_from_shuffled_points() {
        let points = [
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.00001),
        ];
        let poly = polygon_from_points(&points, true).expect("square");
        assert_eq!(poly.vertices().len(), 4);
        approx::assert_relative_eq!(poly.area(), 1.0, epsilon = 1e-6);
        approx::assert_relative_eq!(poly.plane().normal().z.abs(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn too_few_points_fail() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        assert!(polygon_from_points(&points, false).is_none());
        let line = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(polygon_from_points(&line, false).is_none());
    }

    #[test]
    fn collinear_ring_points_are_removed() {
        let points = [
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(0.5, 0.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(1.0, 1.0, 2.0),
            Point3::new(0.0, 1.0, 2.0),
        ];
        let poly = polygon_from_points(&points, false).expect("square");
        assert_eq!(poly.vertices().len(), 4);
    }

    #[test]
    fn hull_variant_drops_interior_points() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(0.0, 1.0, 1.0),
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(0.0, 2.0, 2.0),
        ];
        let poly = convex_polygon_from_points(&points).expect("hull");
        assert_eq!(poly.vertices().len(), 4);
        approx::assert_relative_eq!(poly.area(), 4.0, epsilon = 1e-9);
    }
}
