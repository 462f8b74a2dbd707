//! Brushes: convex solids tagged with a CSG operation, and the per-brush
//! algorithms (intersection scans, chunk splitting, subtraction) run on them.

pub mod chunk;
pub mod intersect;
pub mod order;
pub mod shapes;

use crate::factory::polygons_bounding_box;
use crate::float_types::{Real, parry3d::bounding_volume::Aabb, tolerances};
use crate::geometry::{MaterialId, Plane, Polygon};
use crate::session::hierarchy::NodeId;
use nalgebra::Point3;

pub use chunk::{
    BrushChunk, ChunkIdAllocator, ChunkSplit, SignedChunk, provide_subtract_chunks, split_chunk,
};
pub use intersect::{
    find_intersections, polyhedra_intersect, polyhedron_contains, predecessor_intersections,
    successor_intersections,
};
pub use order::BrushOrder;
pub use shapes::BrushShape;

/// How a brush's volume combines with everything evaluated before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CsgMode {
    #[default]
    Add,
    Subtract,
    /// Trigger/marker volume: never part of the solid, never renders
    Volume,
}

/// Per-brush switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrushFlags {
    /// Opt out of CSG entirely; the polygons pass through untouched
    pub no_csg: bool,
    pub has_collision: bool,
    pub is_visible: bool,
}

impl Default for BrushFlags {
    fn default() -> Self {
        BrushFlags {
            no_csg: false,
            has_collision: true,
            is_visible: true,
        }
    }
}

/// The two independent CSG evaluations run for every brush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Visual,
    Collision,
}

impl Pass {
    pub const ALL: [Pass; 2] = [Pass::Visual, Pass::Collision];
}

/// Anything that can describe a closed convex solid as outward-facing polygons.
pub trait BrushGeometry {
    fn polygons(&self) -> Vec<Polygon>;
}

/// Where a brush's faces come from.
#[derive(Debug, Clone, PartialEq)]
pub enum BrushSource {
    /// Host-supplied faces, already oriented outward
    Polygons(Vec<Polygon>),
    Generated {
        shape: BrushShape,
        material: Option<MaterialId>,
    },
}

impl BrushGeometry for BrushSource {
    fn polygons(&self) -> Vec<Polygon> {
        match self {
            BrushSource::Polygons(polygons) => polygons.clone(),
            BrushSource::Generated { shape, material } => shape.polygons(*material),
        }
    }
}

/// A brush as supplied by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub source: BrushSource,
    pub mode: CsgMode,
    pub flags: BrushFlags,
}

impl Brush {
    pub fn new(source: BrushSource, mode: CsgMode) -> Self {
        Brush {
            source,
            mode,
            flags: BrushFlags::default(),
        }
    }

    /// A generated brush.
    pub fn from_shape(shape: BrushShape, mode: CsgMode) -> Self {
        Brush::new(BrushSource::Generated { shape, material: None }, mode)
    }

    pub const fn with_flags(mut self, flags: BrushFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Whether this brush takes part in the CSG evaluation of `pass`.
    pub const fn participates_in(&self, pass: Pass) -> bool {
        participates(self.mode, self.flags, pass)
    }
}

impl BrushGeometry for Brush {
    fn polygons(&self) -> Vec<Polygon> {
        self.source.polygons()
    }
}

pub(crate) const fn participates(mode: CsgMode, flags: BrushFlags, pass: Pass) -> bool {
    if flags.no_csg || matches!(mode, CsgMode::Volume) {
        return false;
    }
    match pass {
        Pass::Visual => flags.is_visible,
        Pass::Collision => flags.has_collision,
    }
}

/// Distinct face planes of a polygon set, compared with the tight tolerance.
pub fn distinct_planes(polygons: &[Polygon]) -> Vec<Plane> {
    let eps = tolerances().point;
    let mut planes: Vec<Plane> = Vec::with_capacity(polygons.len());
    for polygon in polygons {
        let plane = *polygon.plane();
        if !planes.iter().any(|p| p.approx_eq(&plane, eps)) {
            planes.push(plane);
        }
    }
    planes
}

/// Strictly inside the convex solid bounded by `planes` (all planes face out).
pub fn planes_contain_point(planes: &[Plane], point: &Point3<Real>, epsilon: Real) -> bool {
    !planes.is_empty() && planes.iter().all(|p| p.signed_distance(point) < -epsilon)
}

/// Read-only view of one brush as the CSG algorithms see it.
#[derive(Debug, Clone, Copy)]
pub struct BrushSnapshot<'a> {
    pub id: NodeId,
    pub mode: CsgMode,
    pub flags: BrushFlags,
    pub polygons: &'a [Polygon],
    pub planes: &'a [Plane],
    pub bounds: Aabb,
}

impl<'a> BrushSnapshot<'a> {
    /// View over `polygons`; `None` when there are none.
    pub fn new(
        id: NodeId,
        mode: CsgMode,
        flags: BrushFlags,
        polygons: &'a [Polygon],
        planes: &'a [Plane],
    ) -> Option<Self> {
        Some(BrushSnapshot {
            id,
            mode,
            flags,
            polygons,
            planes,
            bounds: polygons_bounding_box(polygons)?,
        })
    }

    pub const fn participates_in(&self, pass: Pass) -> bool {
        participates(self.mode, self.flags, pass)
    }

    pub fn contains_point(&self, point: &Point3<Real>) -> bool {
        planes_contain_point(self.planes, point, tolerances().point)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn participation_rules() {
        let brush = Brush::from_shape(
            BrushShape::Cuboid {
                center: Point3::origin(),
                size: Vector3::repeat(2.0),
            },
            CsgMode::Add,
        );
        assert!(brush.participates_in(Pass::Visual));
        assert!(brush.participates_in(Pass::Collision));

        let hidden = brush.clone().with_flags(BrushFlags {
            is_visible: false,
            ..BrushFlags::default()
        });
        assert!(!hidden.participates_in(Pass::Visual));
        assert!(hidden.participates_in(Pass::Collision));

        let volume = Brush { mode: CsgMode::Volume, ..brush.clone() };
        assert!(!volume.participates_in(Pass::Collision));

        let passthrough = brush.with_flags(BrushFlags {
            no_csg: true,
            ..BrushFlags::default()
        });
        assert!(!passthrough.participates_in(Pass::Visual));
    }

    #[test]
    fn cube_planes_and_containment() {
        let polygons = shapes::cuboid(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0), None);
        let planes = distinct_planes(&polygons);
        assert_eq!(planes.len(), 6);
        assert!(planes_contain_point(&planes, &Point3::origin(), 1e-5));
        assert!(!planes_contain_point(&planes, &Point3::new(1.0, 0.0, 0.0), 1e-5));
        assert!(!planes_contain_point(&[], &Point3::origin(), 1e-5));
    }
}
