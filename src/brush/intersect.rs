//! Overlap tests between convex brushes and the ordered scans that decide
//! which brushes influence each other's result.

use crate::brush::{BrushSnapshot, CsgMode, Pass};
use crate::float_types::{Real, parry3d::bounding_volume::{Aabb, BoundingVolume}, tolerances};
use crate::geometry::Polygon;
use crate::session::hierarchy::NodeId;
use nalgebra::Vector3;

/// Loosened box overlap, the cheap rejection before the exact test.
pub fn bounds_overlap(a: &Aabb, b: &Aabb) -> bool {
    a.loosened(tolerances().bounds_expand).intersects(b)
}

fn push_axis(axes: &mut Vec<Vector3<Real>>, axis: Vector3<Real>) {
    let len = axis.norm();
    if len <= Real::EPSILON {
        return;
    }
    let axis = axis / len;
    // parallel axes give identical projections
    if !axes.iter().any(|a| a.cross(&axis).norm() <= tolerances().point) {
        axes.push(axis);
    }
}

fn edge_directions(polygons: &[Polygon]) -> Vec<Vector3<Real>> {
    let mut dirs = Vec::new();
    for polygon in polygons {
        for edge in polygon.edges() {
            push_axis(&mut dirs, edge.direction());
        }
    }
    dirs
}

fn project(polygons: &[Polygon], axis: &Vector3<Real>) -> (Real, Real) {
    polygons
        .iter()
        .flat_map(|p| p.vertices())
        .map(|v| v.pos.coords.dot(axis))
        .fold((Real::MAX, Real::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)))
}

/// Separating-axis test for two convex polyhedra.
///
/// Candidate axes are the face normals of both solids and the cross products
/// of their edge directions. Touching solids (overlap within the point
/// tolerance on some axis) do not intersect.
pub fn polyhedra_intersect(a: &[Polygon], b: &[Polygon]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let eps = tolerances().point;

    let mut axes = Vec::new();
    for polygon in a.iter().chain(b) {
        push_axis(&mut axes, polygon.plane().normal());
    }
    let a_edges = edge_directions(a);
    let b_edges = edge_directions(b);
    for ea in &a_edges {
        for eb in &b_edges {
            push_axis(&mut axes, ea.cross(eb));
        }
    }

    axes.iter().all(|axis| {
        let (a_min, a_max) = project(a, axis);
        let (b_min, b_max) = project(b, axis);
        a_max.min(b_max) - a_min.max(b_min) > eps
    })
}

/// Whether every vertex of `inner` lies inside or on the convex solid `outer`.
pub fn polyhedron_contains(outer: &[Polygon], inner: &[Polygon]) -> bool {
    let eps = tolerances().point;
    !outer.is_empty()
        && inner.iter().flat_map(|p| p.vertices()).all(|v| {
            outer
                .iter()
                .all(|face| face.plane().signed_distance(&v.pos) <= eps)
        })
}

fn brushes_intersect(a: &BrushSnapshot<'_>, b: &BrushSnapshot<'_>) -> bool {
    bounds_overlap(&a.bounds, &b.bounds) && polyhedra_intersect(a.polygons, b.polygons)
}

/// Earlier brushes (in evaluation order) intersecting `ordered[target]`.
///
/// The backward scan stops at the first subtractive brush that swallows the
/// target whole: nothing evaluated before it can survive inside the target.
/// The result is in evaluation order.
pub fn predecessor_intersections(
    ordered: &[BrushSnapshot<'_>],
    target: usize,
    pass: Pass,
) -> Vec<NodeId> {
    let this = &ordered[target];
    let mut found = Vec::new();
    for candidate in ordered[..target].iter().rev() {
        if !candidate.participates_in(pass) || !brushes_intersect(this, candidate) {
            continue;
        }
        found.push(candidate.id);
        if candidate.mode == CsgMode::Subtract && polyhedron_contains(candidate.polygons, this.polygons) {
            log::trace!("{:?} is carved away entirely by {:?}", this.id, candidate.id);
            break;
        }
    }
    found.reverse();
    found
}

/// Later brushes intersecting `ordered[target]`, in evaluation order.
///
/// Subtractive successors stay active for the rest of the scan. A candidate
/// lying wholly inside an active subtraction that it intersects is redundant
/// and skipped: it neither joins the result nor becomes active.
pub fn successor_intersections(
    ordered: &[BrushSnapshot<'_>],
    target: usize,
    pass: Pass,
) -> Vec<NodeId> {
    let this = &ordered[target];
    let mut found = Vec::new();
    let mut active: Vec<&BrushSnapshot<'_>> = Vec::new();
    for candidate in &ordered[target + 1..] {
        if !candidate.participates_in(pass) || !brushes_intersect(this, candidate) {
            continue;
        }
        let redundant = active.iter().any(|sub| {
            brushes_intersect(candidate, sub) && polyhedron_contains(sub.polygons, candidate.polygons)
        });
        if redundant {
            log::trace!("{:?} skipped for {:?}: inside an active subtraction", candidate.id, this.id);
            continue;
        }
        found.push(candidate.id);
        if candidate.mode == CsgMode::Subtract {
            active.push(candidate);
        }
    }
    found
}

/// Predecessors followed by successors. Empty when the target itself does not
/// take part in `pass`.
pub fn find_intersections(ordered: &[BrushSnapshot<'_>], target: usize, pass: Pass) -> Vec<NodeId> {
    if !ordered[target].participates_in(pass) {
        return Vec::new();
    }
    let mut list = predecessor_intersections(ordered, target, pass);
    list.extend(successor_intersections(ordered, target, pass));
    list
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::brush::shapes::cuboid;
    use crate::brush::{BrushFlags, distinct_planes};
    use nalgebra::Point3;

    fn cube(min: Real, max: Real) -> Vec<Polygon> {
        cuboid(Point3::new(min, min, min), Point3::new(max, max, max), None)
    }

    #[test]
    fn separating_axis_cases() {
        let a = cube(0.0, 1.0);
        assert!(polyhedra_intersect(&a, &cube(0.5, 1.5)));
        // face contact only
        let mut touching = cube(0.0, 1.0);
        touching.iter_mut().for_each(|p| p.translate(Vector3::new(1.0, 0.0, 0.0)));
        assert!(!polyhedra_intersect(&a, &touching));
        assert!(!polyhedra_intersect(&a, &cube(2.0, 3.0)));
    }

    #[test]
    fn rotated_box_separated_despite_overlapping_bounds() {
        let a = cube(0.0, 1.0);
        let mut b = cube(0.0, 1.0);
        let iso = nalgebra::Isometry3::new(
            Vector3::new(1.2, 0.9, 0.5),
            Vector3::z() * (crate::float_types::PI / 4.0),
        );
        b.iter_mut().for_each(|p| p.transform(&iso));
        let bounds_a = crate::factory::polygons_bounding_box(&a).expect("bounds");
        let bounds_b = crate::factory::polygons_bounding_box(&b).expect("bounds");
        assert!(bounds_overlap(&bounds_a, &bounds_b));
        assert!(!polyhedra_intersect(&a, &b));
    }

    #[test]
    fn containment() {
        assert!(polyhedron_contains(&cube(0.0, 4.0), &cube(1.0, 2.0)));
        assert!(polyhedron_contains(&cube(0.0, 4.0), &cube(0.0, 4.0)));
        assert!(!polyhedron_contains(&cube(1.0, 2.0), &cube(0.0, 4.0)));
    }

    #[test]
    fn scans_respect_order_and_modes() {
        let polys = [cube(0.0, 4.0), cube(1.0, 3.0), cube(2.0, 5.0), cube(10.0, 11.0)];
        let planes: Vec<_> = polys.iter().map(|p| distinct_planes(p)).collect();
        let modes = [CsgMode::Add, CsgMode::Subtract, CsgMode::Add, CsgMode::Add];
        let ordered: Vec<BrushSnapshot<'_>> = (0..4)
            .filter_map(|i| {
                BrushSnapshot::new(NodeId(i), modes[i], BrushFlags::default(), &polys[i], &planes[i])
            })
            .collect();

        assert_eq!(find_intersections(&ordered, 0, Pass::Visual), vec![NodeId(1), NodeId(2)]);
        assert_eq!(find_intersections(&ordered, 2, Pass::Visual), vec![NodeId(0), NodeId(1)]);
        assert!(find_intersections(&ordered, 3, Pass::Visual).is_empty());
    }
}
