//! Generated convex brush shapes with outward-facing polygons.

use crate::float_types::{Real, TAU};
use crate::geometry::polygon::build_orthonormal_basis;
use crate::geometry::{MaterialId, Plane, Polygon, Vertex};
use nalgebra::{Point3, Vector2, Vector3, Vector4};

/// A parametric convex solid.
#[derive(Debug, Clone, PartialEq)]
pub enum BrushShape {
    /// Axis-aligned box.
    Cuboid {
        center: Point3<Real>,
        size: Vector3<Real>,
    },
    /// Box whose top slopes from the front-bottom edge (-y) up to the back (+y).
    Wedge {
        center: Point3<Real>,
        size: Vector3<Real>,
    },
    /// Regular `sides`-gon extruded along +z.
    Prism {
        center: Point3<Real>,
        radius: Real,
        height: Real,
        sides: usize,
    },
}

/// Polygon for a ring of corners wound counter-clockwise seen from outside.
/// Vertex normals are the face normal and uvs the planar projection.
fn face(corners: &[Point3<Real>], material: Option<MaterialId>) -> Option<Polygon> {
    let plane = Plane::from_points(&corners[0], &corners[1], &corners[2])?;
    let (u, v) = build_orthonormal_basis(plane.normal());
    let vertices = corners
        .iter()
        .map(|p| {
            Vertex::with_attributes(
                *p,
                plane.normal(),
                Vector2::new(p.coords.dot(&u), p.coords.dot(&v)),
                Vector4::repeat(1.0),
            )
        })
        .collect();
    Polygon::new(vertices, material)
}

/// The six faces of the box spanning `mins..maxs`.
pub fn cuboid(mins: Point3<Real>, maxs: Point3<Real>, material: Option<MaterialId>) -> Vec<Polygon> {
    let (x0, y0, z0) = (mins.x, mins.y, mins.z);
    let (x1, y1, z1) = (maxs.x, maxs.y, maxs.z);
    let p = Point3::new;
    [
        [p(x0, y0, z0), p(x0, y0, z1), p(x0, y1, z1), p(x0, y1, z0)],
        [p(x1, y0, z0), p(x1, y1, z0), p(x1, y1, z1), p(x1, y0, z1)],
        [p(x0, y0, z0), p(x1, y0, z0), p(x1, y0, z1), p(x0, y0, z1)],
        [p(x0, y1, z0), p(x0, y1, z1), p(x1, y1, z1), p(x1, y1, z0)],
        [p(x0, y0, z0), p(x0, y1, z0), p(x1, y1, z0), p(x1, y0, z0)],
        [p(x0, y0, z1), p(x1, y0, z1), p(x1, y1, z1), p(x0, y1, z1)],
    ]
    .iter()
    .filter_map(|corners| face(corners, material))
    .collect()
}

/// Wedge spanning `mins..maxs` (five faces).
pub fn wedge(mins: Point3<Real>, maxs: Point3<Real>, material: Option<MaterialId>) -> Vec<Polygon> {
    let (x0, y0, z0) = (mins.x, mins.y, mins.z);
    let (x1, y1, z1) = (maxs.x, maxs.y, maxs.z);
    let p = Point3::new;
    let quads = [
        [p(x0, y0, z0), p(x0, y1, z0), p(x1, y1, z0), p(x1, y0, z0)],
        [p(x0, y1, z0), p(x0, y1, z1), p(x1, y1, z1), p(x1, y1, z0)],
        [p(x0, y0, z0), p(x1, y0, z0), p(x1, y1, z1), p(x0, y1, z1)],
    ];
    let triangles = [
        [p(x0, y0, z0), p(x0, y1, z1), p(x0, y1, z0)],
        [p(x1, y0, z0), p(x1, y1, z0), p(x1, y1, z1)],
    ];
    quads
        .iter()
        .filter_map(|c| face(c, material))
        .chain(triangles.iter().filter_map(|c| face(c, material)))
        .collect()
}

/// Regular prism with `sides >= 3` around `center`.
pub fn prism(
    center: Point3<Real>,
    radius: Real,
    height: Real,
    sides: usize,
    material: Option<MaterialId>,
) -> Vec<Polygon> {
    if sides < 3 {
        return Vec::new();
    }
    let z0 = center.z - height * 0.5;
    let z1 = center.z + height * 0.5;
    let ring: Vec<(Real, Real)> = (0..sides)
        .map(|i| {
            let a = TAU * i as Real / sides as Real;
            (center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect();

    let top: Vec<Point3<Real>> = ring.iter().map(|&(x, y)| Point3::new(x, y, z1)).collect();
    let bottom: Vec<Point3<Real>> = ring.iter().rev().map(|&(x, y)| Point3::new(x, y, z0)).collect();

    let mut polygons: Vec<Polygon> = (0..sides)
        .filter_map(|i| {
            let (ax, ay) = ring[i];
            let (bx, by) = ring[(i + 1) % sides];
            face(
                &[
                    Point3::new(ax, ay, z0),
                    Point3::new(bx, by, z0),
                    Point3::new(bx, by, z1),
                    Point3::new(ax, ay, z1),
                ],
                material,
            )
        })
        .collect();
    polygons.extend(face(&top, material));
    polygons.extend(face(&bottom, material));
    polygons
}

impl BrushShape {
    /// Generate the faces of this shape.
    pub fn polygons(&self, material: Option<MaterialId>) -> Vec<Polygon> {
        match *self {
            BrushShape::Cuboid { center, size } => {
                cuboid(center - size * 0.5, center + size * 0.5, material)
            },
            BrushShape::Wedge { center, size } => {
                wedge(center - size * 0.5, center + size * 0.5, material)
            },
            BrushShape::Prism {
                center,
                radius,
                height,
                sides,
            } => prism(center, radius, height, sides, material),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_outward(polygons: &[Polygon], inside: Point3<Real>) {
        for poly in polygons {
            assert!(
                poly.plane().signed_distance(&inside) < 0.0,
                "face {:?} does not face away from {inside}",
                poly.plane()
            );
        }
    }

    #[test]
    fn cuboid_faces_point_outward() {
        let polys = cuboid(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 2.0, 3.0), None);
        assert_eq!(polys.len(), 6);
        assert_outward(&polys, Point3::new(0.0, 0.5, 1.0));
        let area: Real = polys.iter().map(Polygon::area).sum();
        approx::assert_relative_eq!(area, 2.0 * (2.0 * 3.0 + 2.0 * 4.0 + 3.0 * 4.0), epsilon = 1e-9);
    }

    #[test]
    fn wedge_and_prism_faces_point_outward() {
        let wedge = BrushShape::Wedge {
            center: Point3::origin(),
            size: Vector3::new(2.0, 2.0, 2.0),
        }
        .polygons(None);
        assert_eq!(wedge.len(), 5);
        assert_outward(&wedge, Point3::new(0.0, 0.5, -0.5));

        let prism = BrushShape::Prism {
            center: Point3::new(0.0, 0.0, 1.0),
            radius: 1.0,
            height: 2.0,
            sides: 6,
        }
        .polygons(Some(MaterialId(3)));
        assert_eq!(prism.len(), 8);
        assert_outward(&prism, Point3::new(0.0, 0.0, 1.0));
        assert!(prism.iter().all(|p| p.material == Some(MaterialId(3))));
    }
}
