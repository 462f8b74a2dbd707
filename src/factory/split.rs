//! Cutting a polygon, or a closed polygon set, by an arbitrary plane.

use crate::factory::construct::polygon_from_points;
use crate::float_types::{Real, parry3d::bounding_volume::Aabb, tolerances};
use crate::geometry::{Plane, PointSide, Polygon, PolygonSide, Vertex};
use nalgebra::Point3;

/// Result of [`split_polygon`]. A side is `None` when its vertex list could
/// not form a valid polygon.
#[derive(Debug, Clone)]
pub struct PolygonSplit {
    pub front: Option<Polygon>,
    pub back: Option<Polygon>,
    /// Vertices created on, or already lying on, the clip plane
    pub seam: Vec<Vertex>,
}

impl PolygonSplit {
    /// Both halves are valid polygons.
    pub const fn succeeded(&self) -> bool {
        self.front.is_some() && self.back.is_some()
    }
}

/// Split `polygon` by `plane`.
///
/// Each half inherits material, exclusion flags and the unique index of the
/// parent. A half with fewer than three vertices or a zero normal is dropped,
/// which is how slivers produced by the classification tolerance are handled.
pub fn split_polygon(polygon: &Polygon, plane: &Plane) -> PolygonSplit {
    let vertices = polygon.vertices();
    let n = vertices.len();
    let sides: Vec<PointSide> = vertices.iter().map(|v| plane.orient_point(&v.pos)).collect();
    let distances: Vec<Real> = vertices.iter().map(|v| plane.signed_distance(&v.pos)).collect();

    let mut front: Vec<Vertex> = Vec::with_capacity(n + 1);
    let mut back: Vec<Vertex> = Vec::with_capacity(n + 1);
    let mut seam: Vec<Vertex> = Vec::new();

    for i in 0..n {
        let prev = (i + n - 1) % n;
        let current = vertices[i];

        match (sides[prev], sides[i]) {
            (_, PointSide::On) => {
                front.push(current);
                back.push(current);
                seam.push(current);
            },
            (PointSide::Back, PointSide::Front) => {
                let t = distances[prev] / (distances[prev] - distances[i]);
                let crossing = Vertex::lerp(&vertices[prev], &current, t);
                front.push(crossing);
                front.push(current);
                back.push(crossing);
                seam.push(crossing);
            },
            (PointSide::Front, PointSide::Back) => {
                // interpolate from the back vertex so both orientations agree
                let t = distances[i] / (distances[i] - distances[prev]);
                let crossing = Vertex::lerp(&current, &vertices[prev], t);
                front.push(crossing);
                back.push(crossing);
                back.push(current);
                seam.push(crossing);
            },
            (_, PointSide::Front) => front.push(current),
            (_, PointSide::Back) => back.push(current),
        }
    }

    PolygonSplit {
        front: Polygon::derived_from(front, polygon),
        back: Polygon::derived_from(back, polygon),
        seam,
    }
}

/// The part of `polygon` behind every plane of a convex region (planes facing
/// out). `None` when nothing of substance is left.
pub fn clip_polygon_to_planes(polygon: &Polygon, planes: &[Plane]) -> Option<Polygon> {
    let mut piece = polygon.clone();
    for plane in planes {
        match plane.classify_polygon(&piece) {
            PolygonSide::Front => return None,
            PolygonSide::Back | PolygonSide::Coplanar => {},
            PolygonSide::Spanning => {
                let split = split_polygon(&piece, plane);
                match (split.front, split.back) {
                    (Some(_), Some(back)) => piece = back,
                    // sliver in front: the piece is effectively behind
                    (None, Some(_)) => {},
                    (_, None) => return None,
                }
            },
        }
    }
    Some(piece)
}

/// Bounding box of a polygon set; `None` for an empty set.
pub fn polygons_bounding_box(polygons: &[Polygon]) -> Option<Aabb> {
    let mut iter = polygons.iter();
    let first = iter.next()?.bounding_box();
    Some(iter.fold(first, |acc, p| {
        let bb = p.bounding_box();
        Aabb::new(acc.mins.inf(&bb.mins), acc.maxs.sup(&bb.maxs))
    }))
}

/// Cut a closed polyhedron (one brush's polygons) by `plane`.
///
/// Returns `(front, back)`, each closed by a capping polygon marked
/// `exclude_from_final`, or `None` when no split is necessary: the plane misses
/// the polyhedron or one side would keep fewer than three polygons. In that
/// case the whole set lies on one side.
pub fn split_polygons_by_plane(
    polygons: &[Polygon],
    plane: &Plane,
) -> Option<(Vec<Polygon>, Vec<Polygon>)> {
    let tol = tolerances();
    let bounds = polygons_bounding_box(polygons)?;
    if !plane.intersects_aabb(&bounds, tol.classify) {
        return None;
    }

    let mut front: Vec<Polygon> = Vec::new();
    let mut back: Vec<Polygon> = Vec::new();
    let mut seam: Vec<Point3<Real>> = Vec::new();

    for polygon in polygons {
        match plane.classify_polygon(polygon) {
            PolygonSide::Spanning => {
                let split = split_polygon(polygon, plane);
                seam.extend(split.seam.iter().map(|v| v.pos));
                match (split.front, split.back) {
                    (Some(f), Some(b)) => {
                        front.push(f);
                        back.push(b);
                    },
                    (Some(_), None) => front.push(polygon.clone()),
                    (None, Some(_)) => back.push(polygon.clone()),
                    (None, None) => {
                        log::trace!("split_polygons_by_plane: both halves degenerate");
                        if plane.signed_distance(&polygon.centroid()) > 0.0 {
                            front.push(polygon.clone());
                        } else {
                            back.push(polygon.clone());
                        }
                    },
                }
            },
            PolygonSide::Coplanar => {
                seam.extend(polygon.vertices().iter().map(|v| v.pos));
                // a face on the plane bounds the solid lying behind its normal
                if polygon.plane().normal().dot(&plane.normal()) > 0.0 {
                    back.push(polygon.clone());
                } else {
                    front.push(polygon.clone());
                }
            },
            side => {
                seam.extend(
                    polygon
                        .vertices()
                        .iter()
                        .filter(|v| plane.orient_point(&v.pos) == PointSide::On)
                        .map(|v| v.pos),
                );
                if side == PolygonSide::Front {
                    front.push(polygon.clone());
                } else {
                    back.push(polygon.clone());
                }
            },
        }
    }

    if !seam.is_empty() && front.len() >= 3 && back.len() >= 3 {
        match polygon_from_points(&seam, true) {
            Some(mut cap) => {
                cap.exclude_from_final = true;
                // the front piece is closed by a face looking back across the plane
                if cap.plane().normal().dot(&plane.normal()) > 0.0 {
                    cap.flip();
                }
                back.push(cap.flipped());
                front.push(cap);
            },
            None => log::warn!(
                "split_polygons_by_plane: {} seam points did not form a cap",
                seam.len()
            ),
        }
    }

    if front.len() >= 3 && back.len() >= 3 {
        Some((front, back))
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;

    fn quad() -> Polygon {
        Polygon::new(
            vec![
                Vertex::new(Point3::new(-1.0, -1.0, 0.0), Vector3::z()),
                Vertex::new(Point3::new(1.0, -1.0, 0.0), Vector3::z()),
                Vertex::new(Point3::new(1.0, 1.0, 0.0), Vector3::z()),
                Vertex::new(Point3::new(-1.0, 1.0, 0.0), Vector3::z()),
            ],
            None,
        )
        .expect("quad")
    }

    #[test]
    fn split_through_vertices_keeps_both_triangles() {
        // the diagonal passes through two vertices, which land on both sides
        let plane = Plane::from_normal(Vector3::new(1.0, -1.0, 0.0), 0.0);
        let split = split_polygon(&quad(), &plane);
        assert!(split.succeeded());
        assert_eq!(split.front.as_ref().map(|p| p.vertices().len()), Some(3));
        assert_eq!(split.back.as_ref().map(|p| p.vertices().len()), Some(3));
        assert_eq!(split.seam.len(), 2);
    }

    #[test]
    fn sliver_side_is_discarded() {
        // crosses the quad 1e-4 away from its edge: that side classifies as On
        let plane = Plane::from_normal(Vector3::x(), 0.9999);
        let split = split_polygon(&quad(), &plane);
        assert!(!split.succeeded());
        assert!(split.back.is_some());
    }

    #[test]
    fn clip_to_unit_square_region() {
        let planes = [
            Plane::from_normal(Vector3::x(), 0.5),
            Plane::from_normal(-Vector3::x(), 0.0),
            Plane::from_normal(Vector3::y(), 0.5),
        ];
        let piece = clip_polygon_to_planes(&quad(), &planes).expect("clipped");
        approx::assert_relative_eq!(piece.area(), 0.75, epsilon = 1e-9);

        let outside = [Plane::from_normal(-Vector3::x(), -2.0)];
        assert!(clip_polygon_to_planes(&quad(), &outside).is_none());
    }

    #[test]
    fn bounds_union() {
        let mut other = quad();
        other.translate(Vector3::new(0.0, 0.0, 5.0));
        let bb = polygons_bounding_box(&[quad(), other]).expect("bounds");
        assert_eq!(bb.mins, Point3::new(-1.0, -1.0, 0.0));
        assert_eq!(bb.maxs, Point3::new(1.0, 1.0, 5.0));
        assert!(polygons_bounding_box(&[]).is_none());
    }
}
