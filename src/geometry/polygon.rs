//! Struct and functions for working with planar `Polygon`s.

use crate::float_types::{Real, parry3d::bounding_volume::Aabb, tolerances};
use crate::geometry::edge::Edge;
use crate::geometry::plane::Plane;
use crate::geometry::vertex::Vertex;
use geo::{Area, LineString, Polygon as GeoPolygon, coord};
use nalgebra::{Isometry3, Point3, Vector3};
use std::sync::OnceLock;

/// Opaque material handle supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

/// A convex planar polygon. Vertex order is winding order and defines the
/// orientation of [`Polygon::plane`].
#[derive(Debug, Clone)]
pub struct Polygon {
    vertices: Vec<Vertex>,

    /// Recomputed whenever the vertices are replaced
    plane: Plane,

    /// Lazily‑computed axis‑aligned bounding box of the Polygon
    bounding_box: OnceLock<Aabb>,

    pub material: Option<MaterialId>,

    /// Provenance key, inherited by split halves and copies
    pub unique_index: Option<usize>,

    /// Internal artifact (seam/cap) or superseded surface
    pub exclude_from_final: bool,

    /// Host override hiding an otherwise renderable face
    pub user_exclude_from_final: bool,
}

impl PartialEq for Polygon {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
            && self.plane == other.plane
            && self.material == other.material
            && self.unique_index == other.unique_index
            && self.exclude_from_final == other.exclude_from_final
            && self.user_exclude_from_final == other.user_exclude_from_final
    }
}

/// First plane found from a consecutive, non-collinear vertex triple.
fn plane_from_vertices(vertices: &[Vertex]) -> Option<Plane> {
    let n = vertices.len();
    if n < 3 {
        return None;
    }
    (0..n).find_map(|i| {
        Plane::from_points(
            &vertices[i].pos,
            &vertices[(i + 1) % n].pos,
            &vertices[(i + 2) % n].pos,
        )
    })
}

impl Polygon {
    /// Create a polygon; `None` when fewer than 3 vertices are given or every
    /// vertex triple is collinear.
    pub fn new(vertices: Vec<Vertex>, material: Option<MaterialId>) -> Option<Self> {
        let plane = plane_from_vertices(&vertices)?;
        Some(Polygon {
            vertices,
            plane,
            bounding_box: OnceLock::new(),
            material,
            unique_index: None,
            exclude_from_final: false,
            user_exclude_from_final: false,
        })
    }

    /// Create a polygon that inherits material, provenance and exclusion flags
    /// from `parent`.
    pub fn derived_from(vertices: Vec<Vertex>, parent: &Polygon) -> Option<Self> {
        let mut polygon = Polygon::new(vertices, parent.material)?;
        polygon.unique_index = parent.unique_index;
        polygon.exclude_from_final = parent.exclude_from_final;
        polygon.user_exclude_from_final = parent.user_exclude_from_final;
        Some(polygon)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub const fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Replace the vertex ring. The plane and bounds are recomputed here and
    /// nowhere else. Returns `false`, leaving the polygon untouched, if the new
    /// ring is degenerate.
    pub fn set_vertices(&mut self, vertices: Vec<Vertex>) -> bool {
        match plane_from_vertices(&vertices) {
            Some(plane) => {
                self.vertices = vertices;
                self.plane = plane;
                self.bounding_box = OnceLock::new();
                true
            },
            None => false,
        }
    }

    /// Reverse winding, negate the plane and every vertex normal.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.vertices.iter_mut().for_each(Vertex::flip);
        self.plane.flip();
    }

    pub fn flipped(&self) -> Self {
        let mut copy = self.clone();
        copy.flip();
        copy
    }

    /// Whether the host should render this polygon.
    pub const fn is_renderable(&self) -> bool {
        !self.exclude_from_final && !self.user_exclude_from_final
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge<'_>> + '_ {
        self.vertices
            .iter()
            .zip(self.vertices.iter().cycle().skip(1))
            .map(|(a, b)| Edge::new(a, b))
    }

    /// Average of the vertex positions.
    pub fn centroid(&self) -> Point3<Real> {
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.pos.coords);
        Point3::from(sum / self.vertices.len() as Real)
    }

    /// Area of the polygon, measured in its own plane.
    pub fn area(&self) -> Real {
        let (u, v) = build_orthonormal_basis(self.plane.normal());
        let origin = self.vertices[0].pos;
        let ring: Vec<_> = self
            .vertices
            .iter()
            .map(|vertex| {
                let offset = vertex.pos - origin;
                coord! { x: offset.dot(&u), y: offset.dot(&v) }
            })
            .collect();
        GeoPolygon::new(LineString::new(ring), Vec::new()).unsigned_area()
    }

    /// Axis aligned bounding box of this Polygon (cached after first call)
    pub fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
            let mut maxs = Point3::new(-Real::MAX, -Real::MAX, -Real::MAX);
            for v in &self.vertices {
                mins = mins.inf(&v.pos);
                maxs = maxs.sup(&v.pos);
            }
            Aabb::new(mins, maxs)
        })
    }

    /// Tolerant vertex-by-vertex comparison (same ring start, same order).
    pub fn approx_eq(&self, other: &Polygon, epsilon: Real) -> bool {
        self.vertices.len() == other.vertices.len()
            && self
                .vertices
                .iter()
                .zip(&other.vertices)
                .all(|(a, b)| a.approx_eq(b, epsilon))
    }

    /// Bake a translation into the vertices.
    pub fn translate(&mut self, offset: Vector3<Real>) {
        let mut vertices = self.vertices.clone();
        vertices.iter_mut().for_each(|v| v.translate(offset));
        let updated = self.set_vertices(vertices);
        debug_assert!(updated, "a translation cannot make a polygon degenerate");
    }

    /// Bake a rigid transform into the vertices.
    pub fn transform(&mut self, iso: &Isometry3<Real>) {
        let mut vertices = self.vertices.clone();
        vertices.iter_mut().for_each(|v| v.transform(iso));
        let updated = self.set_vertices(vertices);
        debug_assert!(updated, "a rigid transform cannot make a polygon degenerate");
    }

    /// Whether `point` lies on this polygon's plane and inside its (convex) ring.
    pub fn contains_point(&self, point: &Point3<Real>) -> bool {
        let eps = tolerances().point;
        if self.plane.signed_distance(point).abs() > tolerances().classify {
            return false;
        }
        let n = self.plane.normal();
        self.edges()
            .all(|edge| edge.direction().cross(&(point - edge.start.pos)).dot(&n) >= -eps)
    }
}

/// Build an orthonormal basis `(u, v)` spanning the plane with normal `n`.
pub fn build_orthonormal_basis(n: Vector3<Real>) -> (Vector3<Real>, Vector3<Real>) {
    let n = n.normalize();

    let other = if n.x.abs() < n.y.abs() && n.x.abs() < n.z.abs() {
        Vector3::x()
    } else if n.y.abs() < n.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };

    let v = n.cross(&other).normalize();
    let u = v.cross(&n).normalize();

    (u, v)
}

#[cfg(test)]
mod test {
    use super::*;

    fn square(z: Real) -> Polygon {
        Polygon::new(
            vec![
                Vertex::new(Point3::new(0.0, 0.0, z), Vector3::z()),
                Vertex::new(Point3::new(1.0, 0.0, z), Vector3::z()),
                Vertex::new(Point3::new(1.0, 1.0, z), Vector3::z()),
                Vertex::new(Point3::new(0.0, 1.0, z), Vector3::z()),
            ],
            Some(MaterialId(7)),
        )
        .expect("square")
    }

    #[test]
    fn construction_retries_collinear_prefix() {
        let poly = Polygon::new(
            vec![
                Vertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::z()),
                Vertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::z()),
                Vertex::new(Point3::new(2.0, 0.0, 0.0), Vector3::z()),
                Vertex::new(Point3::new(2.0, 2.0, 0.0), Vector3::z()),
            ],
            None,
        )
        .expect("non-degenerate");
        approx::assert_relative_eq!(poly.plane().normal(), Vector3::z());
    }

    #[test]
    fn degenerate_input_is_rejected() {
        assert!(Polygon::new(vec![Vertex::new(Point3::origin(), Vector3::z()); 2], None).is_none());
        let line = (0..4)
            .map(|i| Vertex::new(Point3::new(i as Real, 0.0, 0.0), Vector3::z()))
            .collect();
        assert!(Polygon::new(line, None).is_none());
    }

    #[test]
    fn set_vertices_recomputes_plane() {
        let mut poly = square(0.0);
        let mut lifted = poly.vertices().to_vec();
        lifted.iter_mut().for_each(|v| v.pos.z = 3.0);
        assert!(poly.set_vertices(lifted));
        approx::assert_relative_eq!(poly.plane().offset(), 3.0);
        approx::assert_relative_eq!(poly.bounding_box().mins.z, 3.0);

        let bad = vec![Vertex::new(Point3::origin(), Vector3::z()); 3];
        assert!(!poly.set_vertices(bad));
        approx::assert_relative_eq!(poly.plane().offset(), 3.0);
    }

    #[test]
    fn area_and_centroid() {
        let poly = square(2.0);
        approx::assert_relative_eq!(poly.area(), 1.0, epsilon = 1e-9);
        approx::assert_relative_eq!(poly.centroid(), Point3::new(0.5, 0.5, 2.0));
        assert!(poly.contains_point(&Point3::new(0.25, 0.75, 2.0)));
        assert!(!poly.contains_point(&Point3::new(1.25, 0.75, 2.0)));
    }

    #[test]
    fn flip_twice_restores() {
        let poly = square(0.0);
        let twice = poly.flipped().flipped();
        assert_eq!(twice, poly);
        assert_eq!(poly.flipped().plane().normal(), -Vector3::z());
        assert_eq!(poly.flipped().material, Some(MaterialId(7)));
    }
}
