//! Per-brush CSG evaluation: chunk splitting, face visibility, subtraction
//! splicing and assembly of the final polygon lists.

use crate::brush::chunk::{BrushChunk, ChunkIdAllocator, provide_subtract_chunks, split_chunk};
use crate::brush::{BrushSnapshot, CsgMode, Pass};
use crate::errors::CsgError;
use crate::float_types::{Real, tolerances};
use crate::geometry::Polygon;
use crate::session::BuildSettings;
use crate::session::hierarchy::NodeId;
use nalgebra::Point3;

/// Lifecycle of a brush's cached result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuildState {
    #[default]
    Unbuilt,
    IntersectionsKnown,
    ChunksSplit,
    Subtracted,
    Built,
}

/// Result of one pass for one brush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassOutput {
    /// Every polygon, with internal ones flagged `exclude_from_final`
    pub polygons: Vec<Polygon>,
    /// Subtractive faces that should have produced surface but found no seam
    pub damaged: Vec<Polygon>,
}

impl PassOutput {
    pub fn renderable(&self) -> impl Iterator<Item = &Polygon> + '_ {
        self.polygons.iter().filter(|p| p.is_renderable())
    }

    pub fn internal(&self) -> impl Iterator<Item = &Polygon> + '_ {
        self.polygons.iter().filter(|p| !p.is_renderable())
    }

    /// Total area of the renderable polygons.
    pub fn renderable_area(&self) -> Real {
        self.renderable().map(Polygon::area).sum()
    }
}

/// Visual and collision results of one brush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildOutput {
    pub visual: PassOutput,
    pub collision: PassOutput,
}

impl BuildOutput {
    pub fn pass(&self, pass: Pass) -> &PassOutput {
        match pass {
            Pass::Visual => &self.visual,
            Pass::Collision => &self.collision,
        }
    }
}

/// The target brush and the brushes it intersects, in evaluation order.
#[derive(Debug, Clone)]
pub struct PassContext<'s, 'a> {
    pub sequence: Vec<&'s BrushSnapshot<'a>>,
    pub target: usize,
}

impl<'s, 'a> PassContext<'s, 'a> {
    /// Select `target` and the members of `intersections` from the globally
    /// ordered snapshots.
    pub fn new(ordered: &'s [BrushSnapshot<'a>], target: NodeId, intersections: &[NodeId]) -> Option<Self> {
        let sequence: Vec<&BrushSnapshot<'a>> = ordered
            .iter()
            .filter(|s| s.id == target || intersections.contains(&s.id))
            .collect();
        let target = sequence.iter().position(|s| s.id == target)?;
        Some(PassContext { sequence, target })
    }

    pub fn target(&self) -> &BrushSnapshot<'a> {
        self.sequence[self.target]
    }

    /// Index of the last brush strictly containing `point`.
    fn last_containing(&self, point: &Point3<Real>) -> Option<usize> {
        self.sequence.iter().rposition(|b| b.contains_point(point))
    }

    /// Whether `point` is solid once the whole sequence is evaluated.
    pub fn solid_at(&self, point: &Point3<Real>) -> bool {
        self.last_containing(point)
            .is_some_and(|i| self.sequence[i].mode == CsgMode::Add)
    }

    /// Whether the target's own material is what fills `point` at the end.
    pub fn owned_by_target(&self, point: &Point3<Real>) -> bool {
        self.last_containing(point) == Some(self.target)
    }
}

/// A chunk of the target and whether the target's material survives in it.
#[derive(Debug, Clone)]
pub struct EvaluatedChunk {
    pub chunk: BrushChunk,
    pub owned: bool,
}

/// Work in progress for one pass.
#[derive(Debug, Clone)]
pub enum PassWork {
    /// The pass needs no CSG; polygons are final
    Fixed(Vec<Polygon>),
    Chunked {
        chunks: Vec<EvaluatedChunk>,
        damaged: Vec<Polygon>,
    },
}

/// Polygons of a brush that does not go through chunking in `pass`.
fn fixed_output(target: &BrushSnapshot<'_>, pass: Pass) -> Option<Vec<Polygon>> {
    let shown = match pass {
        Pass::Visual => target.flags.is_visible,
        Pass::Collision => target.flags.has_collision,
    };
    if !shown {
        return Some(Vec::new());
    }
    if target.flags.no_csg {
        return Some(target.polygons.to_vec());
    }
    match target.mode {
        CsgMode::Add => None,
        CsgMode::Subtract | CsgMode::Volume => Some(
            target
                .polygons
                .iter()
                .map(|p| {
                    let mut p = p.clone();
                    p.exclude_from_final = true;
                    p
                })
                .collect(),
        ),
    }
}

fn probe_point(polygon: &Polygon, distance: Real) -> Point3<Real> {
    polygon.centroid() + polygon.plane().normal() * distance
}

/// Cut the target into chunks and decide which chunks and faces survive.
///
/// A chunk belongs to the last brush (target included) that contains it. If
/// that is a later brush the chunk's polygons are all excluded. In chunks the
/// target keeps, a face is excluded when the point just outside it ends up
/// solid.
pub fn split_pass(
    ctx: &PassContext<'_, '_>,
    pass: Pass,
    ids: &mut ChunkIdAllocator,
    settings: &BuildSettings,
) -> Result<PassWork, CsgError> {
    let target = ctx.target();
    if let Some(polygons) = fixed_output(target, pass) {
        return Ok(PassWork::Fixed(polygons));
    }

    let others: Vec<usize> = (0..ctx.sequence.len()).filter(|&i| i != ctx.target).collect();
    let splitters: Vec<&BrushSnapshot<'_>> = others.iter().map(|&i| ctx.sequence[i]).collect();
    let base = BrushChunk::new(ids.next_id(), target.polygons.to_vec());
    let signed = split_chunk(base, &splitters, ids, settings.max_chunks)?;
    log::debug!("{:?} ({pass:?}): {} chunks from {} splitters", target.id, signed.len(), splitters.len());

    let probe = tolerances().probe;
    let chunks = signed
        .into_iter()
        .map(|signed| {
            let superseded = others
                .iter()
                .zip(&signed.inside)
                .any(|(&i, &inside)| i > ctx.target && inside);
            let mut chunk = signed.chunk;
            if superseded {
                chunk.exclude_all();
            } else {
                chunk.exclude_where(|p| !p.exclude_from_final && ctx.solid_at(&probe_point(p, probe)));
            }
            EvaluatedChunk {
                chunk,
                owned: !superseded,
            }
        })
        .collect();

    Ok(PassWork::Chunked {
        chunks,
        damaged: Vec::new(),
    })
}

/// Splice the faces of every later subtractive brush into the chunks the
/// target keeps.
pub fn subtract_pass(ctx: &PassContext<'_, '_>, work: &mut PassWork) {
    let PassWork::Chunked { chunks, damaged } = work else {
        return;
    };
    let probe = tolerances().probe;
    let subtractors = ctx.sequence[ctx.target + 1..]
        .iter()
        .filter(|b| b.mode == CsgMode::Subtract);

    for subtractor in subtractors {
        for evaluated in chunks.iter_mut().filter(|c| c.owned) {
            let lost = provide_subtract_chunks(&mut evaluated.chunk, subtractor.polygons, |piece| {
                // material on the near side, nothing on the far side
                ctx.owned_by_target(&probe_point(piece, probe)) && !ctx.solid_at(&probe_point(piece, -probe))
            });
            damaged.extend(lost);
        }
    }
    if !damaged.is_empty() {
        log::warn!("{:?}: {} subtractive faces could not be spliced", ctx.target().id, damaged.len());
    }
}

/// Flatten the pass into its output.
pub fn finish_pass(work: PassWork) -> PassOutput {
    match work {
        PassWork::Fixed(polygons) => PassOutput {
            polygons,
            damaged: Vec::new(),
        },
        PassWork::Chunked { chunks, damaged } => PassOutput {
            polygons: chunks
                .into_iter()
                .flat_map(|c| c.chunk.into_polygons())
                .collect(),
            damaged,
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::brush::shapes::cuboid;
    use crate::brush::{BrushFlags, distinct_planes};

    fn cube(min: Real, max: Real) -> Vec<Polygon> {
        cuboid(Point3::new(min, min, min), Point3::new(max, max, max), None)
    }

    #[test]
    fn union_hides_faces_inside_the_other_brush() {
        let polys = [cube(0.0, 2.0), cube(1.0, 3.0)];
        let planes: Vec<_> = polys.iter().map(|p| distinct_planes(p)).collect();
        let ordered: Vec<_> = (0..2)
            .filter_map(|i| {
                BrushSnapshot::new(NodeId(i), CsgMode::Add, BrushFlags::default(), &polys[i], &planes[i])
            })
            .collect();

        let mut ids = ChunkIdAllocator::new();
        let settings = BuildSettings::default();
        let ctx = PassContext::new(&ordered, NodeId(0), &[NodeId(1)]).expect("context");
        let mut work = split_pass(&ctx, Pass::Visual, &mut ids, &settings).expect("split");
        subtract_pass(&ctx, &mut work);
        let first = finish_pass(work);

        // 6 faces of area 4 minus the three unit squares buried in the other cube
        approx::assert_relative_eq!(first.renderable_area(), 24.0 - 3.0, epsilon = 1e-6);
        assert!(first.damaged.is_empty());
    }

    #[test]
    fn subtractive_brush_is_consumed() {
        let polys = [cube(0.0, 2.0)];
        let planes = [distinct_planes(&polys[0])];
        let ordered: Vec<_> =
            BrushSnapshot::new(NodeId(0), CsgMode::Subtract, BrushFlags::default(), &polys[0], &planes[0])
                .into_iter()
                .collect();
        let ctx = PassContext::new(&ordered, NodeId(0), &[]).expect("context");
        let work = split_pass(&ctx, Pass::Visual, &mut ChunkIdAllocator::new(), &BuildSettings::default())
            .expect("fixed");
        let out = finish_pass(work);
        assert_eq!(out.polygons.len(), 6);
        assert_eq!(out.renderable().count(), 0);
    }
}
