//! Polygon edges as borrowed vertex pairs.

use crate::float_types::Real;
use crate::geometry::vertex::Vertex;
use nalgebra::{Point3, Vector3};

/// An ordered pair of vertices borrowed from the polygon that owns them.
#[derive(Debug, Clone, Copy)]
pub struct Edge<'a> {
    pub start: &'a Vertex,
    pub end: &'a Vertex,
}

impl<'a> Edge<'a> {
    pub const fn new(start: &'a Vertex, end: &'a Vertex) -> Self {
        Edge { start, end }
    }

    /// Unnormalised `end - start`.
    pub fn direction(&self) -> Vector3<Real> {
        self.end.pos - self.start.pos
    }

    pub fn length(&self) -> Real {
        self.direction().norm()
    }

    /// Same endpoints within `epsilon`, in either direction.
    pub fn matches(&self, other: &Edge<'_>, epsilon: Real) -> bool {
        (self.start.same_position(other.start, epsilon)
            && self.end.same_position(other.end, epsilon))
            || (self.start.same_position(other.end, epsilon)
                && self.end.same_position(other.start, epsilon))
    }

    fn distance_to_line(&self, point: &Point3<Real>) -> Real {
        let dir = self.direction();
        let len = dir.norm();
        if len <= Real::EPSILON {
            return (point - self.start.pos).norm();
        }
        (point - self.start.pos).cross(&dir).norm() / len
    }

    /// Both endpoints of `other` lie on the infinite line through `self`.
    pub fn is_collinear_with(&self, other: &Edge<'_>, epsilon: Real) -> bool {
        self.distance_to_line(&other.start.pos) <= epsilon
            && self.distance_to_line(&other.end.pos) <= epsilon
    }

    /// Collinear and sharing an interval longer than `epsilon`.
    pub fn overlaps(&self, other: &Edge<'_>, epsilon: Real) -> bool {
        if !self.is_collinear_with(other, epsilon) {
            return false;
        }
        let dir = self.direction();
        let len = dir.norm();
        if len <= epsilon {
            return false;
        }
        let axis = dir / len;
        let project = |p: &Point3<Real>| (p - self.start.pos).dot(&axis);
        let (a0, a1): (Real, Real) = (0.0, len);
        let (b0, b1) = {
            let s = project(&other.start.pos);
            let e = project(&other.end.pos);
            (s.min(e), s.max(e))
        };
        a1.min(b1) - a0.max(b0) > epsilon
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn v(x: Real, y: Real, z: Real) -> Vertex {
        Vertex::new(Point3::new(x, y, z), Vector3::z())
    }

    #[test]
    fn matches_either_direction() {
        let (a, b) = (v(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0));
        let (c, d) = (v(1.0, 0.0, 0.0), v(0.0, 0.0, 0.0));
        assert!(Edge::new(&a, &b).matches(&Edge::new(&c, &d), 1e-5));
        assert!(Edge::new(&a, &b).matches(&Edge::new(&a, &b), 1e-5));
    }

    #[test]
    fn overlap_needs_shared_interval() {
        let (a, b) = (v(0.0, 0.0, 0.0), v(2.0, 0.0, 0.0));
        let (c, d) = (v(1.0, 0.0, 0.0), v(3.0, 0.0, 0.0));
        let (e, f) = (v(2.0, 0.0, 0.0), v(3.0, 0.0, 0.0));
        let (g, h) = (v(0.0, 1.0, 0.0), v(2.0, 1.0, 0.0));
        let ab = Edge::new(&a, &b);
        assert!(ab.overlaps(&Edge::new(&c, &d), 1e-5));
        // touching at a single point only
        assert!(!ab.overlaps(&Edge::new(&e, &f), 1e-5));
        // parallel but offset
        assert!(!ab.is_collinear_with(&Edge::new(&g, &h), 1e-5));
    }
}
