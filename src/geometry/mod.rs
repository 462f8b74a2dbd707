//! Geometric primitives: vertices, borrowed edges, oriented planes and convex polygons.

pub mod edge;
pub mod plane;
pub mod polygon;
pub mod vertex;

pub use edge::Edge;
pub use plane::{Plane, PointSide, PolygonSide};
pub use polygon::{MaterialId, Polygon};
pub use vertex::Vertex;
