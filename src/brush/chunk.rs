//! Convex pieces of a brush ("chunks") produced by cutting it with the planes
//! of the brushes it intersects, and the splicing of subtractive faces into
//! those pieces.

use crate::brush::{BrushSnapshot, distinct_planes, intersect::bounds_overlap};
use crate::errors::CsgError;
use crate::factory::{clip_polygon_to_planes, polygons_bounding_box, split_polygons_by_plane};
use crate::float_types::{Real, parry3d::bounding_volume::Aabb, tolerances};
use crate::geometry::{Plane, PointSide, Polygon};
use nalgebra::{Point3, Vector3};
use std::sync::OnceLock;

/// Hands out chunk ids. Owned by a build session; ids only need to be unique
/// within one session.
#[derive(Debug, Clone, Default)]
pub struct ChunkIdAllocator {
    next: usize,
}

impl ChunkIdAllocator {
    pub const fn new() -> Self {
        ChunkIdAllocator { next: 0 }
    }

    pub fn next_id(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// A convex, closed piece of a brush.
#[derive(Debug, Clone)]
pub struct BrushChunk {
    id: usize,
    polygons: Vec<Polygon>,

    /// Planes that produced this chunk as their back piece
    split_planes: Vec<Plane>,

    bounds: OnceLock<Option<Aabb>>,
    centroid: OnceLock<Point3<Real>>,
}

/// Outcome of [`BrushChunk::split`].
#[derive(Debug, Clone)]
pub enum ChunkSplit {
    /// `(front, back)` pieces
    Split(BrushChunk, BrushChunk),
    /// The plane does not cut the chunk; it lies wholly on this side
    Whole(PointSide),
}

impl BrushChunk {
    pub const fn new(id: usize, polygons: Vec<Polygon>) -> Self {
        BrushChunk {
            id,
            polygons,
            split_planes: Vec::new(),
            bounds: OnceLock::new(),
            centroid: OnceLock::new(),
        }
    }

    pub const fn id(&self) -> usize {
        self.id
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn into_polygons(self) -> Vec<Polygon> {
        self.polygons
    }

    pub fn split_planes(&self) -> &[Plane] {
        &self.split_planes
    }

    pub fn bounds(&self) -> Option<Aabb> {
        *self.bounds.get_or_init(|| polygons_bounding_box(&self.polygons))
    }

    /// Vertex average, always strictly inside a non-degenerate convex chunk.
    pub fn centroid(&self) -> Point3<Real> {
        *self.centroid.get_or_init(|| {
            let (sum, count) = self
                .polygons
                .iter()
                .flat_map(|p| p.vertices())
                .fold((Vector3::zeros(), 0usize), |(sum, n), v| (sum + v.pos.coords, n + 1));
            Point3::from(sum / count.max(1) as Real)
        })
    }

    /// Bounding planes of the chunk, facing out.
    pub fn planes(&self) -> Vec<Plane> {
        distinct_planes(&self.polygons)
    }

    /// Inside or on the boundary (within `epsilon`).
    pub fn contains_point(&self, point: &Point3<Real>, epsilon: Real) -> bool {
        !self.polygons.is_empty()
            && self
                .polygons
                .iter()
                .all(|p| p.plane().signed_distance(point) <= epsilon)
    }

    /// Side of `plane` an uncut chunk lies on: `Front` as soon as any vertex is.
    pub fn side_of(&self, plane: &Plane) -> PointSide {
        let front = self
            .polygons
            .iter()
            .flat_map(|p| p.vertices())
            .any(|v| plane.orient_point(&v.pos) == PointSide::Front);
        if front { PointSide::Front } else { PointSide::Back }
    }

    /// Cut the chunk by `plane`. Both pieces get fresh ids; only the back piece
    /// records the plane. A plane loosely equal to one that already produced
    /// this chunk is not applied again.
    pub fn split(&self, plane: &Plane, ids: &mut ChunkIdAllocator) -> ChunkSplit {
        let loose = tolerances().plane_loose;
        if let Some(previous) = self
            .split_planes
            .iter()
            .find(|p| p.loosely_eq_with_flip(plane, loose))
        {
            // this chunk is behind `previous`
            return if previous.normal().dot(&plane.normal()) > 0.0 {
                ChunkSplit::Whole(PointSide::Back)
            } else {
                ChunkSplit::Whole(PointSide::Front)
            };
        }

        match split_polygons_by_plane(&self.polygons, plane) {
            Some((front, back)) => {
                let mut front = BrushChunk::new(ids.next_id(), front);
                front.split_planes = self.split_planes.clone();
                let mut back = BrushChunk::new(ids.next_id(), back);
                back.split_planes = self.split_planes.clone();
                back.split_planes.push(*plane);
                ChunkSplit::Split(front, back)
            },
            None => ChunkSplit::Whole(self.side_of(plane)),
        }
    }

    /// Mark every polygon as superseded.
    pub fn exclude_all(&mut self) {
        self.polygons.iter_mut().for_each(|p| p.exclude_from_final = true);
    }

    /// Mark the polygons matching `predicate` as superseded.
    pub fn exclude_where(&mut self, mut predicate: impl FnMut(&Polygon) -> bool) {
        for polygon in &mut self.polygons {
            if predicate(polygon) {
                polygon.exclude_from_final = true;
            }
        }
    }

    /// Whether an internal seam of this chunk lies on `plane` (either facing).
    pub fn has_seam_on(&self, plane: &Plane, epsilon: Real) -> bool {
        self.polygons
            .iter()
            .any(|p| p.exclude_from_final && p.plane().loosely_eq_with_flip(plane, epsilon))
    }
}

/// A chunk together with, for each splitting brush in turn, whether the chunk
/// lies inside that brush.
#[derive(Debug, Clone)]
pub struct SignedChunk {
    pub chunk: BrushChunk,
    pub inside: Vec<bool>,
}

/// Cut `base` by the planes of each splitter brush in order.
///
/// For each splitter only the pieces whose bounds reach it are cut, and only
/// the remainder behind every plane applied so far keeps being cut. Pieces
/// falling in front of a plane are outside that splitter and pass on untouched.
/// After each splitter every piece is either wholly inside or wholly outside
/// it, recorded in [`SignedChunk::inside`] at the splitter's index. Fails once
/// more than `max_chunks` pieces exist.
pub fn split_chunk(
    base: BrushChunk,
    splitters: &[&BrushSnapshot<'_>],
    ids: &mut ChunkIdAllocator,
    max_chunks: usize,
) -> Result<Vec<SignedChunk>, CsgError> {
    let mut chunks = vec![SignedChunk {
        chunk: base,
        inside: Vec::with_capacity(splitters.len()),
    }];

    for (k, splitter) in splitters.iter().enumerate() {
        let mut next = Vec::with_capacity(chunks.len() + splitter.planes.len());
        for mut signed in chunks {
            let reaches = signed
                .chunk
                .bounds()
                .is_some_and(|b| bounds_overlap(&b, &splitter.bounds));
            signed.inside.push(reaches);
            if !reaches {
                next.push(signed);
                continue;
            }

            for plane in splitter.planes {
                match signed.chunk.split(plane, ids) {
                    ChunkSplit::Split(front, back) => {
                        let mut outside = signed.inside.clone();
                        outside[k] = false;
                        next.push(SignedChunk { chunk: front, inside: outside });
                        signed.chunk = back;
                    },
                    ChunkSplit::Whole(PointSide::Front) => {
                        signed.inside[k] = false;
                        break;
                    },
                    ChunkSplit::Whole(_) => {},
                }
                if next.len() >= max_chunks {
                    log::warn!("split_chunk: more than {max_chunks} chunks");
                    return Err(CsgError::ChunkLimitExceeded { limit: max_chunks });
                }
            }
            next.push(signed);
        }
        chunks = next;
    }
    Ok(chunks)
}

/// Splice the faces of a subtractive brush into `chunk`.
///
/// Each face is clipped to the chunk. Pieces for which `expects_surface`
/// returns `false` are ignored. The others are inserted flipped (facing into
/// the carved-out space) when the chunk has a seam on the face's plane and
/// contains the piece; renderable chunk faces on that plane covered by the new
/// face are marked excluded. Expected pieces that do not fit are returned as
/// damaged.
pub fn provide_subtract_chunks(
    chunk: &mut BrushChunk,
    subtractor: &[Polygon],
    mut expects_surface: impl FnMut(&Polygon) -> bool,
) -> Vec<Polygon> {
    let tol = tolerances();
    let planes = chunk.planes();
    let mut damaged = Vec::new();

    for face in subtractor.iter().filter(|p| !p.exclude_from_final) {
        let Some(piece) = clip_polygon_to_planes(face, &planes) else {
            continue;
        };
        if piece.area() <= tol.point || !expects_surface(&piece) {
            continue;
        }

        let fits = chunk.has_seam_on(face.plane(), tol.plane_loose_flip)
            && chunk.contains_point(&piece.centroid(), tol.point);
        if !fits {
            log::debug!(
                "provide_subtract_chunks: face {:?} has no seam in chunk {}",
                face.unique_index,
                chunk.id
            );
            damaged.push(piece);
            continue;
        }

        let inner = piece.flipped();
        chunk.exclude_where(|existing| {
            !existing.exclude_from_final
                && existing.plane().loosely_eq_with_flip(face.plane(), tol.plane_loose_flip)
                && inner.contains_point(&existing.centroid())
        });
        chunk.polygons.push(inner);
        chunk.bounds = OnceLock::new();
        chunk.centroid = OnceLock::new();
    }
    damaged
}
