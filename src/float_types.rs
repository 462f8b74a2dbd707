// Re-export parry for the appropriate float size
#[cfg(feature = "f64")]
pub use parry3d_f64 as parry3d;

#[cfg(feature = "f32")]
pub use parry3d;

// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

use core::str::FromStr;
use std::sync::OnceLock;

/// Archimedes' constant (π)
#[cfg(feature = "f32")]
pub const PI: Real = core::f32::consts::PI;
/// Archimedes' constant (π)
#[cfg(feature = "f64")]
pub const PI: Real = core::f64::consts::PI;

/// The full circle constant (τ)
#[cfg(feature = "f32")]
pub const TAU: Real = core::f32::consts::TAU;
/// The full circle constant (τ)
#[cfg(feature = "f64")]
pub const TAU: Real = core::f64::consts::TAU;

/// Default for [`Tolerances::point`].
pub const POINT_EPSILON: Real = 1e-5;
/// Default for [`Tolerances::dedupe`].
pub const DEDUPE_EPSILON: Real = 1e-4;
/// Default for [`Tolerances::classify`].
pub const CLASSIFY_EPSILON: Real = 1e-3;
/// Default for [`Tolerances::plane_loose`].
pub const PLANE_LOOSE_EPSILON: Real = 0.006;
/// Default for [`Tolerances::plane_loose_flip`].
pub const PLANE_LOOSE_FLIP_EPSILON: Real = 0.08;
/// Default for [`Tolerances::bounds_expand`].
pub const BOUNDS_EXPAND_EPSILON: Real = 1e-3;
/// Default for [`Tolerances::probe`].
pub const PROBE_OFFSET: Real = 2e-3;

/// The epsilon tiers used by the kernel.
///
/// The tiers are deliberately independent. Tightening `classify` makes clipping
/// produce more slivers; loosening `plane_loose_flip` makes subtraction merge
/// faces that are merely close to each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Point/point and point/plane identity, containment and degenerate normals.
    pub point: Real,
    /// Deduplication of seam points when a polygon is built from a point cloud.
    pub dedupe: Real,
    /// Vertex classification against a clip plane.
    pub classify: Real,
    /// "Same cutting plane" while chunking a brush.
    pub plane_loose: Real,
    /// Same plane, also matching the negated plane, while subtracting.
    pub plane_loose_flip: Real,
    /// Inflation of bounding boxes for the approximate overlap test.
    pub bounds_expand: Real,
    /// Distance along a face normal at which the solid is sampled on either side.
    pub probe: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            point: POINT_EPSILON,
            dedupe: DEDUPE_EPSILON,
            classify: CLASSIFY_EPSILON,
            plane_loose: PLANE_LOOSE_EPSILON,
            plane_loose_flip: PLANE_LOOSE_FLIP_EPSILON,
            bounds_expand: BOUNDS_EXPAND_EPSILON,
            probe: PROBE_OFFSET,
        }
    }
}

impl Tolerances {
    /// Defaults, with any tier overridden by its build-time environment variable
    /// (`CSGBRUSH_POINT_EPSILON`, `CSGBRUSH_CLASSIFY_EPSILON`, ...).
    fn from_build_env() -> Self {
        fn parse(value: Option<&'static str>, fallback: Real) -> Real {
            value
                .and_then(|v| Real::from_str(v).ok())
                .map(|v| v.max(Real::EPSILON))
                .unwrap_or(fallback)
        }

        let defaults = Self::default();
        Self {
            point: parse(option_env!("CSGBRUSH_POINT_EPSILON"), defaults.point),
            dedupe: parse(option_env!("CSGBRUSH_DEDUPE_EPSILON"), defaults.dedupe),
            classify: parse(option_env!("CSGBRUSH_CLASSIFY_EPSILON"), defaults.classify),
            plane_loose: parse(
                option_env!("CSGBRUSH_PLANE_LOOSE_EPSILON"),
                defaults.plane_loose,
            ),
            plane_loose_flip: parse(
                option_env!("CSGBRUSH_PLANE_LOOSE_FLIP_EPSILON"),
                defaults.plane_loose_flip,
            ),
            bounds_expand: parse(
                option_env!("CSGBRUSH_BOUNDS_EXPAND_EPSILON"),
                defaults.bounds_expand,
            ),
            probe: parse(option_env!("CSGBRUSH_PROBE_OFFSET"), defaults.probe),
        }
    }
}

/// Lazily-initialized tolerances used across the crate.
///  1) **Build-time**: set e.g. `CSGBRUSH_CLASSIFY_EPSILON=5e-4 cargo build`
///  2) **Runtime**: call [`set_tolerances`] once before using the library
static TOLERANCE_CELL: OnceLock<Tolerances> = OnceLock::new();

/// Returns the active tolerances.
pub fn tolerances() -> &'static Tolerances {
    TOLERANCE_CELL.get_or_init(Tolerances::from_build_env)
}

/// Set the tolerances programmatically once; returns `false` if they were
/// already initialised (by an earlier call or by first use).
pub fn set_tolerances(value: Tolerances) -> bool {
    TOLERANCE_CELL.set(value).is_ok()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tiers_are_ordered() {
        let t = Tolerances::default();
        assert!(t.point < t.dedupe);
        assert!(t.dedupe < t.classify);
        assert!(t.classify < t.plane_loose);
        assert!(t.plane_loose < t.plane_loose_flip);
    }

    #[test]
    fn global_cell_is_initialised_once() {
        let first = *tolerances();
        assert!(!set_tolerances(Tolerances {
            point: 1.0,
            ..first
        }));
        assert_eq!(*tolerances(), first);
    }
}
