//! Struct and functions for working with `Vertex`s from which `Polygon`s are composed.

use crate::float_types::{Real, tolerances};
use nalgebra::{Isometry3, Point3, Vector2, Vector3, Vector4};

/// A point sample on a polygon boundary: position, normal, texture coordinate and color.
#[derive(Debug, Clone, PartialEq, Copy)]
pub struct Vertex {
    pub pos: Point3<Real>,
    pub normal: Vector3<Real>,
    pub uv: Vector2<Real>,
    pub color: Vector4<Real>,
}

impl Vertex {
    /// Create a new [`Vertex`] with a zero uv and opaque white color.
    ///
    /// * `pos`    – the position in the shared (world) space
    /// * `normal` – copied verbatim; non-finite components are zeroed
    #[inline]
    pub fn new(pos: Point3<Real>, normal: Vector3<Real>) -> Self {
        Self::with_attributes(pos, normal, Vector2::zeros(), Vector4::repeat(1.0))
    }

    /// Create a vertex carrying every attribute.
    pub fn with_attributes(
        mut pos: Point3<Real>,
        mut normal: Vector3<Real>,
        uv: Vector2<Real>,
        color: Vector4<Real>,
    ) -> Self {
        for c in pos.coords.iter_mut() {
            if !c.is_finite() {
                *c = 0.0;
            }
        }
        for c in normal.iter_mut() {
            if !c.is_finite() {
                *c = 0.0;
            }
        }

        Vertex {
            pos,
            normal,
            uv,
            color,
        }
    }

    /// Flip vertex normal in place.
    pub fn flip(&mut self) {
        self.normal = -self.normal;
    }

    /// Linear interpolation of every attribute, `t = 0` yields `a`.
    pub fn lerp(a: &Vertex, b: &Vertex, t: Real) -> Vertex {
        Vertex {
            pos: a.pos + (b.pos - a.pos) * t,
            normal: a.normal + (b.normal - a.normal) * t,
            uv: a.uv + (b.uv - a.uv) * t,
            color: a.color + (b.color - a.color) * t,
        }
    }

    /// Tolerant equality on position, uv, normal and color.
    ///
    /// Vertices intentionally do not implement `Hash`: near-equal points can
    /// straddle any bucket boundary, so callers deduplicate by scanning with
    /// this comparator.
    pub fn approx_eq(&self, other: &Vertex, epsilon: Real) -> bool {
        (self.pos - other.pos).norm_squared() <= epsilon * epsilon
            && (self.uv - other.uv).norm_squared() <= epsilon * epsilon
            && (self.normal - other.normal).norm_squared() <= epsilon * epsilon
            && (self.color - other.color).norm_squared() <= epsilon * epsilon
    }

    /// Position-only tolerant comparison.
    pub fn same_position(&self, other: &Vertex, epsilon: Real) -> bool {
        (self.pos - other.pos).norm_squared() <= epsilon * epsilon
    }

    /// Bake a translation into the position.
    pub fn translate(&mut self, offset: Vector3<Real>) {
        self.pos += offset;
    }

    /// Bake a rigid transform into position and normal.
    pub fn transform(&mut self, iso: &Isometry3<Real>) {
        self.pos = iso.transform_point(&self.pos);
        self.normal = iso.transform_vector(&self.normal);
    }
}

/// Per-attribute tolerances for the `approx` comparisons of [`Vertex`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct VertexEpsilon {
    pub position: Real,
    pub normal: Real,
    pub uv: Real,
    pub color: Real,
}

impl approx::AbsDiffEq for Vertex {
    type Epsilon = VertexEpsilon;

    fn default_epsilon() -> Self::Epsilon {
        let point = tolerances().point;
        Self::Epsilon {
            position: point,
            normal: point,
            uv: point,
            color: point,
        }
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        approx::AbsDiffEq::abs_diff_eq(&self.pos, &other.pos, epsilon.position)
            && approx::AbsDiffEq::abs_diff_eq(&self.normal, &other.normal, epsilon.normal)
            && approx::AbsDiffEq::abs_diff_eq(&self.uv, &other.uv, epsilon.uv)
            && approx::AbsDiffEq::abs_diff_eq(&self.color, &other.color, epsilon.color)
    }
}

impl approx::RelativeEq for Vertex {
    fn default_max_relative() -> Self::Epsilon {
        Self::Epsilon {
            position: <Point3<Real> as approx::RelativeEq>::default_max_relative(),
            normal: <Vector3<Real> as approx::RelativeEq>::default_max_relative(),
            uv: <Vector2<Real> as approx::RelativeEq>::default_max_relative(),
            color: <Vector4<Real> as approx::RelativeEq>::default_max_relative(),
        }
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        approx::RelativeEq::relative_eq(
            &self.pos,
            &other.pos,
            epsilon.position,
            max_relative.position,
        ) && approx::RelativeEq::relative_eq(
            &self.normal,
            &other.normal,
            epsilon.normal,
            max_relative.normal,
        ) && approx::RelativeEq::relative_eq(&self.uv, &other.uv, epsilon.uv, max_relative.uv)
            && approx::RelativeEq::relative_eq(
                &self.color,
                &other.color,
                epsilon.color,
                max_relative.color,
            )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_sanitises_non_finite() {
        let v = Vertex::new(
            Point3::new(Real::NAN, 2.0, 3.0),
            Vector3::new(0.0, Real::INFINITY, 1.0),
        );
        assert_eq!(v.pos, Point3::new(0.0, 2.0, 3.0));
        assert_eq!(v.normal, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn lerp_interpolates_every_attribute() {
        let a = Vertex::with_attributes(
            Point3::origin(),
            Vector3::x(),
            Vector2::new(0.0, 0.0),
            Vector4::new(0.0, 0.0, 0.0, 1.0),
        );
        let b = Vertex::with_attributes(
            Point3::new(2.0, 2.0, 2.0),
            Vector3::y(),
            Vector2::new(1.0, 2.0),
            Vector4::new(1.0, 1.0, 1.0, 1.0),
        );
        let mid = Vertex::lerp(&a, &b, 0.5);

        approx::assert_relative_eq!(
            mid,
            Vertex::with_attributes(
                Point3::new(1.0, 1.0, 1.0),
                Vector3::new(0.5, 0.5, 0.0),
                Vector2::new(0.5, 1.0),
                Vector4::new(0.5, 0.5, 0.5, 1.0),
            )
        );
    }

    #[test]
    fn approx_eq_is_tolerant() {
        let a = Vertex::new(Point3::new(1.0, 1.0, 1.0), Vector3::z());
        let mut b = a;
        b.pos.x += 1e-7;
        assert!(a.approx_eq(&b, 1e-5));
        b.pos.x += 1e-3;
        assert!(!a.approx_eq(&b, 1e-5));
        assert!(a.same_position(&b, 1e-2));
    }

    #[test]
    fn flip_negates_normal_only() {
        let mut v = Vertex::new(Point3::new(1.0, 2.0, 3.0), Vector3::x());
        v.flip();
        assert_eq!(v.pos, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(v.normal, -Vector3::x());
    }
}
