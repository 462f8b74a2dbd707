//! Polygon factory: plane clipping of single polygons and closed polygon sets,
//! and reconstruction of convex polygons from unordered coplanar points.

pub mod construct;
pub mod split;

pub use construct::{
    convex_polygon_from_points, dedupe_points, polygon_from_points, remove_collinear_vertices,
};
pub use split::{
    PolygonSplit, clip_polygon_to_planes, polygons_bounding_box, split_polygon,
    split_polygons_by_plane,
};
