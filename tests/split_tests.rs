mod support;

use csgbrush::factory::{convex_polygon_from_points, split_polygon, split_polygons_by_plane};
use csgbrush::geometry::{Plane, Polygon};
use nalgebra::{Point3, Vector3};
use support::{cube_polygons, make_polygon_3d, total_area};

#[test]
fn cube_split_through_center_is_closed_on_both_sides() {
    let cube = cube_polygons(-1.0, 1.0);
    let plane = Plane::from_normal(Vector3::x(), 0.0);
    let (front, back) = split_polygons_by_plane(&cube, &plane).expect("plane crosses the cube");

    assert_eq!(front.len(), 6);
    assert_eq!(back.len(), 6);
    for poly in &front {
        assert!(poly.vertices().iter().all(|v| v.pos.x >= -1e-9));
    }
    for poly in &back {
        assert!(poly.vertices().iter().all(|v| v.pos.x <= 1e-9));
    }

    let front_caps: Vec<&Polygon> = front.iter().filter(|p| p.exclude_from_final).collect();
    let back_caps: Vec<&Polygon> = back.iter().filter(|p| p.exclude_from_final).collect();
    assert_eq!(front_caps.len(), 1);
    assert_eq!(back_caps.len(), 1);
    // each cap faces out of the piece it closes
    approx::assert_relative_eq!(front_caps[0].plane().normal(), -Vector3::x(), epsilon = 1e-9);
    approx::assert_relative_eq!(back_caps[0].plane().normal(), Vector3::x(), epsilon = 1e-9);
    approx::assert_relative_eq!(front_caps[0].area(), 4.0, epsilon = 1e-9);
}

#[test]
fn split_pieces_cover_the_original_surface() {
    let cube = cube_polygons(-1.0, 1.0);
    let plane = Plane::from_normal(Vector3::new(1.0, 0.4, -0.3), 0.2);
    let (front, back) = split_polygons_by_plane(&cube, &plane).expect("plane crosses the cube");

    let surface = total_area(front.iter().chain(&back).filter(|p| !p.exclude_from_final));
    approx::assert_relative_eq!(surface, total_area(&cube), epsilon = 1e-6);

    let front_cap = front.iter().find(|p| p.exclude_from_final).expect("cap");
    let back_cap = back.iter().find(|p| p.exclude_from_final).expect("cap");
    approx::assert_relative_eq!(front_cap.area(), back_cap.area(), epsilon = 1e-9);
}

#[test]
fn splitting_a_piece_again_by_the_same_plane_is_a_no_op() {
    let cube = cube_polygons(-1.0, 1.0);
    let plane = Plane::from_normal(Vector3::y(), 0.25);
    let (front, back) = split_polygons_by_plane(&cube, &plane).expect("first split");
    assert!(split_polygons_by_plane(&front, &plane).is_none());
    assert!(split_polygons_by_plane(&back, &plane).is_none());
}

#[test]
fn plane_missing_the_solid_does_not_split() {
    let cube = cube_polygons(-1.0, 1.0);
    assert!(split_polygons_by_plane(&cube, &Plane::from_normal(Vector3::z(), 5.0)).is_none());
    // touching a face is not a split either
    assert!(split_polygons_by_plane(&cube, &Plane::from_normal(Vector3::z(), 1.0)).is_none());
}

#[test]
fn equator_slice_with_no_spanning_polygon_still_caps_both_sides() {
    let mut octahedron = Vec::new();
    for sx in [-1.0, 1.0] {
        for sy in [-1.0, 1.0] {
            for sz in [-1.0, 1.0] {
                let mut corners = vec![[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, sz]];
                // keep the winding facing out of the solid
                if sx * sy * sz < 0.0 {
                    corners.reverse();
                }
                octahedron.push(make_polygon_3d(&corners));
            }
        }
    }

    let plane = Plane::from_normal(Vector3::z(), 0.0);
    let (front, back) = split_polygons_by_plane(&octahedron, &plane).expect("equator split");
    assert_eq!(front.len(), 5);
    assert_eq!(back.len(), 5);

    let front_caps: Vec<&Polygon> = front.iter().filter(|p| p.exclude_from_final).collect();
    let back_caps: Vec<&Polygon> = back.iter().filter(|p| p.exclude_from_final).collect();
    assert_eq!(front_caps.len(), 1);
    assert_eq!(back_caps.len(), 1);
    approx::assert_relative_eq!(front_caps[0].area(), 2.0, epsilon = 1e-9);
    approx::assert_relative_eq!(front_caps[0].plane().normal(), -Vector3::z(), epsilon = 1e-9);
    approx::assert_relative_eq!(back_caps[0].plane().normal(), Vector3::z(), epsilon = 1e-9);
}

#[test]
fn flipping_a_split_half_round_trips() {
    let poly = make_polygon_3d(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 2.0, 0.0], [0.0, 2.0, 0.0]]);
    let split = split_polygon(&poly, &Plane::from_normal(Vector3::x(), 1.0));
    let front = split.front.expect("front half");
    assert_eq!(front.flipped().flipped(), front);
    assert_eq!(split.seam.len(), 2);
}

#[test]
fn hull_of_cap_points() {
    let points = [
        Point3::new(0.0, -1.0, -1.0),
        Point3::new(0.0, 1.0, -1.0),
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 1.0),
        Point3::new(0.0, -1.0, 1.0),
        Point3::new(0.0, 1.0, 1.00001),
    ];
    let poly = convex_polygon_from_points(&points).expect("hull");
    assert_eq!(poly.vertices().len(), 4);
    approx::assert_relative_eq!(poly.area(), 4.0, epsilon = 1e-4);
}
