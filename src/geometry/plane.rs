//! Oriented planes and the point/polygon classification built on them.

use crate::float_types::{Real, parry3d::bounding_volume::Aabb, tolerances};
use crate::geometry::polygon::Polygon;
use nalgebra::{Point3, Vector3};

/// Side of a plane a single point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSide {
    /// Signed distance above `+epsilon` (the side the normal points to).
    Front,
    /// Signed distance below `-epsilon`.
    Back,
    /// Within `±epsilon` of the plane.
    On,
}

/// Aggregate relation of a polygon to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonSide {
    Coplanar,
    Front,
    Back,
    Spanning,
}

/// A plane `n·p = w` with unit normal `n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<Real>,
    pub w: Real,
}

impl Plane {
    /// Create a plane from a (not necessarily unit) normal and offset.
    /// Both are rescaled so the stored normal has unit length.
    pub fn from_normal(normal: Vector3<Real>, w: Real) -> Self {
        let len = normal.norm();
        if len <= Real::EPSILON {
            return Plane { normal, w };
        }
        Plane {
            normal: normal / len,
            w: w / len,
        }
    }

    /// Plane through `point` facing `normal`.
    pub fn from_point_and_normal(point: &Point3<Real>, normal: Vector3<Real>) -> Self {
        let n = normal.normalize();
        Plane {
            normal: n,
            w: n.dot(&point.coords),
        }
    }

    /// Plane through three points, normal following the right-hand rule
    /// `(b - a) × (c - a)`. Returns `None` for collinear points.
    pub fn from_points(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Option<Self> {
        let normal = (b - a).cross(&(c - a));
        let eps = tolerances().point;
        if normal.norm() <= eps * eps {
            return None;
        }
        let normal = normal.normalize();
        Some(Plane {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    pub const fn offset(&self) -> Real {
        self.w
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    pub fn flipped(&self) -> Self {
        Plane {
            normal: -self.normal,
            w: -self.w,
        }
    }

    #[inline]
    pub fn signed_distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    /// Classify a point with an explicit tolerance.
    pub fn orient_point_with(&self, point: &Point3<Real>, epsilon: Real) -> PointSide {
        let d = self.signed_distance(point);
        if d > epsilon {
            PointSide::Front
        } else if d < -epsilon {
            PointSide::Back
        } else {
            PointSide::On
        }
    }

    /// Classify a point with the clipping tolerance.
    pub fn orient_point(&self, point: &Point3<Real>) -> PointSide {
        self.orient_point_with(point, tolerances().classify)
    }

    /// Classify every vertex of `polygon` and aggregate.
    pub fn classify_polygon(&self, polygon: &Polygon) -> PolygonSide {
        let (mut front, mut back) = (false, false);
        for v in polygon.vertices() {
            match self.orient_point(&v.pos) {
                PointSide::Front => front = true,
                PointSide::Back => back = true,
                PointSide::On => {},
            }
        }
        match (front, back) {
            (false, false) => PolygonSide::Coplanar,
            (true, false) => PolygonSide::Front,
            (false, true) => PolygonSide::Back,
            (true, true) => PolygonSide::Spanning,
        }
    }

    /// Tight identity: normals and offsets equal within `epsilon`.
    pub fn approx_eq(&self, other: &Plane, epsilon: Real) -> bool {
        (self.normal - other.normal).norm() <= epsilon && (self.w - other.w).abs() <= epsilon
    }

    /// Component-wise comparison of normal and offset with a loose tolerance.
    pub fn loosely_eq(&self, other: &Plane, epsilon: Real) -> bool {
        (self.normal - other.normal).amax() <= epsilon && (self.w - other.w).abs() <= epsilon
    }

    /// [`Plane::loosely_eq`] that also accepts the negated plane.
    pub fn loosely_eq_with_flip(&self, other: &Plane, epsilon: Real) -> bool {
        self.loosely_eq(other, epsilon) || self.loosely_eq(&other.flipped(), epsilon)
    }

    /// Whether the plane passes strictly through the box (corners on both sides
    /// by more than `epsilon`).
    pub fn intersects_aabb(&self, aabb: &Aabb, epsilon: Real) -> bool {
        let center = aabb.center();
        let half = aabb.half_extents();
        let radius = self.normal.x.abs() * half.x
            + self.normal.y.abs() * half.y
            + self.normal.z.abs() * half.z;
        let d = self.signed_distance(&center);
        d - radius < -epsilon && d + radius > epsilon
    }

    /// Parameter `t` along `a → b` at which the segment meets the plane.
    pub fn edge_intersection_t(&self, a: &Point3<Real>, b: &Point3<Real>) -> Option<Real> {
        let denom = self.normal.dot(&(b - a));
        if denom.abs() <= Real::EPSILON {
            return None;
        }
        Some((self.w - self.normal.dot(&a.coords)) / denom)
    }
}
