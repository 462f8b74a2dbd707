//! A brush-based **Constructive Solid Geometry (CSG)** kernel for level
//! editors.
//!
//! A scene is an ordered hierarchy of convex *brushes*, each adding solid,
//! carving it away, or marking a volume. Evaluation order is hierarchy order.
//! Every brush is cut into convex chunks by the brushes it intersects; chunks
//! taken over by a later brush are marked internal, faces of carved-out space
//! are spliced in from subtractive brushes, and the surviving polygons become
//! the renderable surface. Nothing is ever deleted: superseded polygons stay in
//! the output flagged `exclude_from_final`.
//!
//! Results are cached per brush. Edits recompute intersection lists of the
//! edited brush and its immediate neighbours and only those brushes rebuild.
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **parallel**: use rayon to recompute every brush's intersections at once
//!
//! # Example
//! ```
//! use csgbrush::brush::{Brush, BrushShape, CsgMode};
//! use csgbrush::session::BuildSession;
//! use nalgebra::{Point3, Vector3};
//!
//! let mut session = BuildSession::new();
//! let room = session
//!     .add_brush(None, Brush::from_shape(
//!         BrushShape::Cuboid { center: Point3::origin(), size: Vector3::repeat(4.0) },
//!         CsgMode::Add,
//!     ))
//!     .unwrap();
//! session
//!     .add_brush(None, Brush::from_shape(
//!         BrushShape::Cuboid { center: Point3::origin(), size: Vector3::repeat(2.0) },
//!         CsgMode::Subtract,
//!     ))
//!     .unwrap();
//! session.build_all().unwrap();
//! let output = session.output(room).unwrap();
//! assert!(output.visual.damaged.is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod brush;
pub mod errors;
pub mod factory;
pub mod float_types;
pub mod geometry;
pub mod session;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use brush::{Brush, BrushFlags, BrushShape, BrushSource, CsgMode, Pass};
pub use errors::CsgError;
pub use geometry::{Plane, Polygon, Vertex};
pub use session::{BuildOutput, BuildSession, BuildState, NodeId};
