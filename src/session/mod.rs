//! Build session: owns the brush hierarchy, cached intersection lists and
//! per-brush results, and keeps them consistent as the host edits the scene.
//!
//! Edits never rebuild eagerly. They recompute the intersection lists of the
//! edited brush and its neighbours and reset whatever is affected to
//! [`BuildState::Unbuilt`]; [`BuildSession::build_all`] then rebuilds exactly
//! those brushes.

pub mod build;
pub mod hierarchy;

use crate::brush::{
    Brush, BrushFlags, BrushGeometry, BrushOrder, BrushSnapshot, CsgMode, Pass, distinct_planes,
    predecessor_intersections, successor_intersections,
};
use crate::brush::chunk::ChunkIdAllocator;
use crate::errors::CsgError;
use crate::float_types::Real;
use crate::geometry::{Plane, Polygon};
use hashbrown::{HashMap, HashSet};
use nalgebra::Isometry3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub use build::{BuildOutput, BuildState, PassContext, PassOutput};
pub use hierarchy::{Hierarchy, NodeId};

/// Default cap on the number of chunks one brush may be cut into.
pub const DEFAULT_MAX_CHUNKS: usize = 4096;

/// Resource limits of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSettings {
    pub max_chunks: usize,
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings {
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }
}

/// Outcome of [`BuildSession::build_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub rebuilt: Vec<NodeId>,
    pub failed: Vec<(NodeId, CsgError)>,
}

/// Intersecting brushes of one pass in evaluation order; the first
/// `predecessors` come before the brush itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PassIntersections {
    ids: Vec<NodeId>,
    predecessors: usize,
}

impl PassIntersections {
    fn scan(ordered: &[BrushSnapshot<'_>], index: usize, pass: Pass) -> Self {
        if !ordered[index].participates_in(pass) {
            return Self::default();
        }
        let mut ids = predecessor_intersections(ordered, index, pass);
        let predecessors = ids.len();
        ids.extend(successor_intersections(ordered, index, pass));
        PassIntersections { ids, predecessors }
    }
}

#[derive(Debug, Clone)]
struct BrushRecord {
    brush: Brush,
    polygons: Vec<Polygon>,
    planes: Vec<Plane>,
    order: Option<BrushOrder>,
    visual: PassIntersections,
    collision: PassIntersections,
    state: BuildState,
    output: Option<BuildOutput>,
}

impl BrushRecord {
    fn intersections(&self, pass: Pass) -> &[NodeId] {
        match pass {
            Pass::Visual => &self.visual.ids,
            Pass::Collision => &self.collision.ids,
        }
    }

    fn neighbours(&self) -> HashSet<NodeId> {
        self.visual.ids.iter().chain(&self.collision.ids).copied().collect()
    }
}

type IntersectionLists = (PassIntersections, PassIntersections);

/// Snapshots of the brushes in `sorted` order.
fn snapshots<'a>(sorted: &[NodeId], brushes: &'a HashMap<NodeId, BrushRecord>) -> Vec<BrushSnapshot<'a>> {
    sorted
        .iter()
        .filter_map(|id| {
            let record = brushes.get(id)?;
            BrushSnapshot::new(*id, record.brush.mode, record.brush.flags, &record.polygons, &record.planes)
        })
        .collect()
}

/// Run the chunk and subtraction stages for both passes of one brush.
fn evaluate(
    sorted: &[NodeId],
    brushes: &HashMap<NodeId, BrushRecord>,
    id: NodeId,
    chunk_ids: &mut ChunkIdAllocator,
    settings: &BuildSettings,
) -> Result<BuildOutput, CsgError> {
    let ordered = snapshots(sorted, brushes);
    let record = brushes.get(&id).ok_or(CsgError::UnknownNode(id))?;
    let visual_ctx = PassContext::new(&ordered, id, &record.visual.ids).ok_or(CsgError::UnknownNode(id))?;
    let collision_ctx =
        PassContext::new(&ordered, id, &record.collision.ids).ok_or(CsgError::UnknownNode(id))?;

    let mut visual = build::split_pass(&visual_ctx, Pass::Visual, chunk_ids, settings)?;
    let mut collision = build::split_pass(&collision_ctx, Pass::Collision, chunk_ids, settings)?;
    log::trace!("{id:?}: {:?}", BuildState::ChunksSplit);

    build::subtract_pass(&visual_ctx, &mut visual);
    build::subtract_pass(&collision_ctx, &mut collision);
    log::trace!("{id:?}: {:?}", BuildState::Subtracted);

    Ok(BuildOutput {
        visual: build::finish_pass(visual),
        collision: build::finish_pass(collision),
    })
}

fn lists_at(ordered: &[BrushSnapshot<'_>], index: usize) -> IntersectionLists {
    (
        PassIntersections::scan(ordered, index, Pass::Visual),
        PassIntersections::scan(ordered, index, Pass::Collision),
    )
}

/// A CSG scene being edited and built.
#[derive(Debug, Clone, Default)]
pub struct BuildSession {
    hierarchy: Hierarchy,
    brushes: HashMap<NodeId, BrushRecord>,
    sorted: Option<Vec<NodeId>>,
    chunk_ids: ChunkIdAllocator,
    next_unique_index: usize,
    settings: BuildSettings,
}

impl BuildSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: BuildSettings) -> Self {
        BuildSession {
            settings,
            ..Self::default()
        }
    }

    pub const fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    pub const fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    fn record(&self, id: NodeId) -> Result<&BrushRecord, CsgError> {
        match self.brushes.get(&id) {
            Some(record) => Ok(record),
            None if self.hierarchy.contains(id) => Err(CsgError::NotABrush(id)),
            None => Err(CsgError::UnknownNode(id)),
        }
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut BrushRecord, CsgError> {
        if !self.brushes.contains_key(&id) {
            self.record(id)?;
        }
        self.brushes.get_mut(&id).ok_or(CsgError::UnknownNode(id))
    }

    /// Give every polygon without provenance a fresh unique index.
    fn register_polygons(&mut self, mut polygons: Vec<Polygon>) -> Vec<Polygon> {
        for polygon in &mut polygons {
            if polygon.unique_index.is_none() {
                polygon.unique_index = Some(self.next_unique_index);
                self.next_unique_index += 1;
            }
        }
        polygons
    }

    /// Current faces of a brush after validation and registration.
    fn ingest(&mut self, id: NodeId, polygons: Vec<Polygon>) -> Result<(Vec<Polygon>, Vec<Plane>), CsgError> {
        let planes = distinct_planes(&polygons);
        if polygons.len() < 4 || planes.len() < 4 {
            log::warn!("brush {id:?} has {} polygons on {} planes", polygons.len(), planes.len());
            return Err(CsgError::DegenerateBrush(id));
        }
        Ok((self.register_polygons(polygons), planes))
    }

    fn invalidate_order(&mut self) {
        self.sorted = None;
        self.brushes.values_mut().for_each(|r| r.order = None);
    }

    fn ensure_sorted(&mut self) -> Result<(), CsgError> {
        if self.sorted.is_some() {
            return Ok(());
        }
        let mut keyed = Vec::with_capacity(self.brushes.len());
        for (id, record) in &mut self.brushes {
            let order = match &record.order {
                Some(order) => order.clone(),
                None => {
                    let order = self.hierarchy.order_of(*id)?;
                    record.order = Some(order.clone());
                    order
                },
            };
            keyed.push((order, *id));
        }
        keyed.sort();
        self.sorted = Some(keyed.into_iter().map(|(_, id)| id).collect());
        Ok(())
    }

    /// Brushes in evaluation order.
    pub fn sorted_brushes(&mut self) -> Result<Vec<NodeId>, CsgError> {
        self.ensure_sorted()?;
        Ok(self.sorted.clone().unwrap_or_default())
    }

    /// Evaluation-order key of a brush or group.
    pub fn brush_order(&mut self, id: NodeId) -> Result<BrushOrder, CsgError> {
        if let Some(order) = self.brushes.get(&id).and_then(|r| r.order.clone()) {
            return Ok(order);
        }
        let order = self.hierarchy.order_of(id)?;
        if let Some(record) = self.brushes.get_mut(&id) {
            record.order = Some(order.clone());
        }
        Ok(order)
    }

    pub fn add_group(&mut self, parent: Option<NodeId>) -> Result<NodeId, CsgError> {
        let id = self.hierarchy.insert(parent)?;
        self.invalidate_order();
        Ok(id)
    }

    /// Append a brush under `parent`. Returns its id; the brush and everything
    /// it intersects need a rebuild afterwards.
    pub fn add_brush(&mut self, parent: Option<NodeId>, brush: Brush) -> Result<NodeId, CsgError> {
        let id = self.hierarchy.insert(parent)?;
        let (polygons, planes) = match self.ingest(id, brush.polygons()) {
            Ok(ingested) => ingested,
            Err(err) => {
                self.hierarchy.remove(id)?;
                return Err(err);
            },
        };
        self.brushes.insert(
            id,
            BrushRecord {
                brush,
                polygons,
                planes,
                order: None,
                visual: PassIntersections::default(),
                collision: PassIntersections::default(),
                state: BuildState::Unbuilt,
                output: None,
            },
        );
        self.invalidate_order();
        self.geometry_changed(id)?;
        log::debug!("added brush {id:?}");
        Ok(id)
    }

    /// Remove a node and its subtree. Returns the surviving brushes that were
    /// marked for rebuild.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Vec<NodeId>, CsgError> {
        let removed = self.hierarchy.remove(id)?;
        let mut neighbours: HashSet<NodeId> = HashSet::new();
        for gone in &removed {
            neighbours.extend(self.listing(*gone));
            if let Some(record) = self.brushes.remove(gone) {
                neighbours.extend(record.neighbours());
            }
        }
        self.invalidate_order();
        self.ensure_sorted()?;

        let mut marked = Vec::new();
        let mut neighbours: Vec<NodeId> = neighbours.into_iter().filter(|n| self.brushes.contains_key(n)).collect();
        neighbours.sort();
        for neighbour in neighbours {
            self.refresh_lists(neighbour)?;
            self.mark_unbuilt(neighbour)?;
            marked.push(neighbour);
        }
        Ok(marked)
    }

    /// Move a node under `parent` at sibling position `index`.
    pub fn move_node(&mut self, id: NodeId, parent: Option<NodeId>, index: usize) -> Result<Vec<NodeId>, CsgError> {
        self.hierarchy.move_node(id, parent, index)?;
        self.invalidate_order();
        let moved: Vec<NodeId> = self
            .hierarchy
            .subtree(id)?
            .into_iter()
            .filter(|n| self.brushes.contains_key(n))
            .collect();
        let mut marked: Vec<NodeId> = Vec::new();
        for brush in moved {
            for n in self.recalculate_intersections(brush)? {
                if !marked.contains(&n) {
                    marked.push(n);
                }
            }
        }
        Ok(marked)
    }

    pub fn brush(&self, id: NodeId) -> Result<&Brush, CsgError> {
        Ok(&self.record(id)?.brush)
    }

    /// The faces used for CSG, with transforms baked in and unique indices set.
    pub fn brush_polygons(&self, id: NodeId) -> Result<&[Polygon], CsgError> {
        Ok(&self.record(id)?.polygons)
    }

    /// Replace a brush's definition.
    pub fn set_brush(&mut self, id: NodeId, brush: Brush) -> Result<Vec<NodeId>, CsgError> {
        self.record(id)?;
        let (polygons, planes) = self.ingest(id, brush.polygons())?;
        let record = self.record_mut(id)?;
        record.brush = brush;
        record.polygons = polygons;
        record.planes = planes;
        self.geometry_changed(id)
    }

    pub fn set_mode(&mut self, id: NodeId, mode: CsgMode) -> Result<Vec<NodeId>, CsgError> {
        self.record_mut(id)?.brush.mode = mode;
        self.geometry_changed(id)
    }

    pub fn set_flags(&mut self, id: NodeId, flags: BrushFlags) -> Result<Vec<NodeId>, CsgError> {
        self.record_mut(id)?.brush.flags = flags;
        self.geometry_changed(id)
    }

    /// Apply a rigid transform to a brush's faces. Unique indices survive.
    pub fn transform_brush(&mut self, id: NodeId, iso: &Isometry3<Real>) -> Result<Vec<NodeId>, CsgError> {
        let record = self.record_mut(id)?;
        record.polygons.iter_mut().for_each(|p| p.transform(iso));
        record.planes = distinct_planes(&record.polygons);
        self.geometry_changed(id)
    }

    pub fn build_state(&self, id: NodeId) -> Result<BuildState, CsgError> {
        Ok(self.record(id)?.state)
    }

    /// Cached result; may be stale unless the state is [`BuildState::Built`].
    pub fn output(&self, id: NodeId) -> Option<&BuildOutput> {
        self.brushes.get(&id)?.output.as_ref()
    }

    /// Cached intersection list of a brush for one pass, in evaluation order.
    pub fn intersections(&self, id: NodeId, pass: Pass) -> Result<&[NodeId], CsgError> {
        Ok(self.record(id)?.intersections(pass))
    }

    pub fn brushes_needing_rebuild(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .brushes
            .iter()
            .filter(|(_, r)| r.state != BuildState::Built)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Brushes whose cached lists mention `id`.
    fn listing(&self, id: NodeId) -> HashSet<NodeId> {
        self.brushes
            .iter()
            .filter(|(other, r)| **other != id && r.neighbours().contains(&id))
            .map(|(other, _)| *other)
            .collect()
    }

    fn mark_unbuilt(&mut self, id: NodeId) -> Result<(), CsgError> {
        self.record_mut(id)?.state = BuildState::Unbuilt;
        Ok(())
    }

    fn compute_lists(&self, id: NodeId) -> Result<IntersectionLists, CsgError> {
        let sorted = self.sorted.as_deref().unwrap_or_default();
        let ordered = snapshots(sorted, &self.brushes);
        let index = ordered
            .iter()
            .position(|s| s.id == id)
            .ok_or(CsgError::UnknownNode(id))?;
        Ok(lists_at(&ordered, index))
    }

    /// Recompute one brush's lists. Returns whether they changed.
    fn refresh_lists(&mut self, id: NodeId) -> Result<bool, CsgError> {
        let (visual, collision) = self.compute_lists(id)?;
        let record = self.record_mut(id)?;
        let changed = record.visual != visual || record.collision != collision;
        record.visual = visual;
        record.collision = collision;
        Ok(changed)
    }

    /// Recompute the lists of a brush that changed and propagate one level.
    ///
    /// The brush itself is marked for rebuild. Every brush that it intersected
    /// before or intersects now recomputes its own lists; those that gained or
    /// lost the brush, or whose lists changed, are marked for rebuild too. The
    /// cascade stops there. Returns every brush marked.
    pub fn recalculate_intersections(&mut self, id: NodeId) -> Result<Vec<NodeId>, CsgError> {
        self.ensure_sorted()?;
        let mut before = self.record(id)?.neighbours();
        before.extend(self.listing(id));
        self.refresh_lists(id)?;
        self.mark_unbuilt(id)?;
        let after = self.record(id)?.neighbours();

        let mut marked = vec![id];
        let mut affected: Vec<NodeId> = before.union(&after).copied().filter(|n| *n != id).collect();
        affected.sort();
        for neighbour in affected {
            if !self.brushes.contains_key(&neighbour) {
                continue;
            }
            let changed = self.refresh_lists(neighbour)?;
            let membership_changed = before.contains(&neighbour) != after.contains(&neighbour);
            if changed || membership_changed {
                self.mark_unbuilt(neighbour)?;
                marked.push(neighbour);
            } else {
                log::trace!("{neighbour:?} unaffected by {id:?}");
            }
        }
        Ok(marked)
    }

    /// A brush's shape, mode or flags changed. Besides the propagation of
    /// [`BuildSession::recalculate_intersections`], every brush it intersected
    /// before or intersects now depends on the new shape and is marked too.
    fn geometry_changed(&mut self, id: NodeId) -> Result<Vec<NodeId>, CsgError> {
        let mut dependents = self.record(id)?.neighbours();
        dependents.extend(self.listing(id));
        let mut marked = self.recalculate_intersections(id)?;
        dependents.extend(self.record(id)?.neighbours());

        let mut dependents: Vec<NodeId> = dependents
            .into_iter()
            .filter(|n| *n != id && self.brushes.contains_key(n) && !marked.contains(n))
            .collect();
        dependents.sort();
        for dependent in dependents {
            self.mark_unbuilt(dependent)?;
            marked.push(dependent);
        }
        Ok(marked)
    }

    /// Recompute every brush's lists; brushes whose lists changed are marked
    /// for rebuild. Returns those brushes.
    pub fn recalculate_all_intersections(&mut self) -> Result<Vec<NodeId>, CsgError> {
        self.ensure_sorted()?;
        let sorted = self.sorted.clone().unwrap_or_default();
        let lists: Vec<IntersectionLists> = {
            let ordered = snapshots(&sorted, &self.brushes);

            #[cfg(feature = "parallel")]
            let lists: Vec<IntersectionLists> = (0..ordered.len())
                .into_par_iter()
                .map(|i| lists_at(&ordered, i))
                .collect();

            #[cfg(not(feature = "parallel"))]
            let lists: Vec<IntersectionLists> = (0..ordered.len()).map(|i| lists_at(&ordered, i)).collect();

            lists
        };

        let mut marked = Vec::new();
        for (id, (visual, collision)) in sorted.into_iter().zip(lists) {
            let record = self.record_mut(id)?;
            if record.visual != visual || record.collision != collision {
                record.visual = visual;
                record.collision = collision;
                record.state = BuildState::Unbuilt;
                marked.push(id);
            }
        }
        Ok(marked)
    }

    /// Reset every brush to [`BuildState::Unbuilt`].
    pub fn invalidate_all(&mut self) {
        self.brushes.values_mut().for_each(|r| r.state = BuildState::Unbuilt);
    }

    /// Bring one brush to [`BuildState::Built`] and return its result.
    pub fn build_brush(&mut self, id: NodeId) -> Result<&BuildOutput, CsgError> {
        self.ensure_sorted()?;
        if self.record(id)?.state == BuildState::Unbuilt {
            self.refresh_lists(id)?;
            self.record_mut(id)?.state = BuildState::IntersectionsKnown;
        }

        if self.record(id)?.state != BuildState::Built {
            let sorted = self.sorted.as_deref().unwrap_or_default();
            let evaluated = evaluate(sorted, &self.brushes, id, &mut self.chunk_ids, &self.settings);
            let record = self.record_mut(id)?;
            match evaluated {
                Ok(output) => {
                    record.output = Some(output);
                    record.state = BuildState::Built;
                    log::debug!("built brush {id:?}");
                },
                Err(err) => {
                    record.output = None;
                    return Err(err);
                },
            }
        }

        self.record(id)?
            .output
            .as_ref()
            .ok_or(CsgError::UnknownNode(id))
    }

    /// Build every brush not in [`BuildState::Built`], in evaluation order.
    /// A brush that fails is reported and left unbuilt; the rest still build.
    pub fn build_all(&mut self) -> Result<BuildReport, CsgError> {
        let mut report = BuildReport::default();
        for id in self.sorted_brushes()? {
            if self.record(id)?.state == BuildState::Built {
                continue;
            }
            match self.build_brush(id) {
                Ok(_) => report.rebuilt.push(id),
                Err(err) => {
                    log::warn!("brush {id:?} failed to build: {err}");
                    report.failed.push((id, err));
                },
            }
        }
        Ok(report)
    }
}
