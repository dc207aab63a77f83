//! Canonical record of center and corner points.

use std::collections::BTreeMap;

use stoon_core::{
    geometry::{ground_slot, TriangleLayout},
    CenterPoint, Corner, CornerPoint, GridCoord, GroundType, MapError, PositionKey, RecordField,
    Triangle, WorldPos,
};
use tracing::{error, trace};

use crate::{config::MapConfig, spatial::SpatialIndex};

/// Identity of a point mirrored into the spatial index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointKey {
    /// Center of the triangle at the coordinate.
    Center(GridCoord),
    /// Corner vertex at the quantized position.
    Corner(PositionKey),
}

/// Result of recording a corner point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CornerWrite {
    /// No corner existed at the position; the point was created.
    Created(CornerPoint),
    /// A corner with the same ground type already existed.
    Unchanged(CornerPoint),
}

/// Owns the center and corner collections plus the index mirroring them.
///
/// Corner ground types are write-once: a corner keeps the ground type it was
/// created with until [`PointStore::clear`].
#[derive(Clone, Debug)]
pub struct PointStore {
    config: MapConfig,
    layout: TriangleLayout,
    centers: BTreeMap<GridCoord, CenterPoint>,
    corners: BTreeMap<PositionKey, CornerPoint>,
    index: SpatialIndex<PointKey, WorldPos>,
}

impl Default for PointStore {
    fn default() -> Self {
        Self::new(MapConfig::default())
    }
}

impl PointStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(config: MapConfig) -> Self {
        Self {
            layout: config.layout(),
            centers: BTreeMap::new(),
            corners: BTreeMap::new(),
            index: SpatialIndex::new(config.index),
            config,
        }
    }

    /// Configuration the store was built with.
    #[must_use]
    pub const fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Geometry used to place points.
    #[must_use]
    pub const fn layout(&self) -> &TriangleLayout {
        &self.layout
    }

    /// Inserts or overwrites the center of the triangle at `coord`.
    ///
    /// Fails with [`MapError::DuplicatePosition`] when some other point already
    /// sits at the center position.
    pub fn add_center_point(
        &mut self,
        coord: GridCoord,
        ground_type: GroundType,
    ) -> Result<(), MapError> {
        if let Some(center) = self.centers.get_mut(&coord) {
            center.ground_type = ground_type;
            if self.config.trace_writes {
                trace!(%coord, %ground_type, "overwrote center point");
            }
            return Ok(());
        }

        let world_pos = self.layout.center_of(coord);
        if !self.points_near(world_pos, self.config.index.duplicate_epsilon).is_empty() {
            return Err(MapError::DuplicatePosition);
        }

        self.insert_center(CenterPoint {
            world_pos,
            grid_pos: coord,
            ground_type,
        });
        Ok(())
    }

    /// Records a corner at `world_pos`, created on behalf of `coord`.
    ///
    /// An existing corner at the same position is left untouched; the call
    /// only succeeds when its ground type agrees.
    pub fn add_corner_point(
        &mut self,
        world_pos: WorldPos,
        coord: GridCoord,
        ground_type: GroundType,
    ) -> Result<CornerWrite, MapError> {
        if !world_pos.x.is_finite() {
            return Err(MapError::MalformedRecord {
                field: RecordField::X,
            });
        }
        if !world_pos.z.is_finite() {
            return Err(MapError::MalformedRecord {
                field: RecordField::Z,
            });
        }

        if let Some(existing) = self.corner_at(world_pos).copied() {
            return if existing.ground_type == ground_type {
                Ok(CornerWrite::Unchanged(existing))
            } else {
                Err(MapError::TerrainMismatch {
                    existing: existing.ground_type,
                    proposed: ground_type,
                })
            };
        }

        if !self.points_near(world_pos, self.config.index.duplicate_epsilon).is_empty() {
            return Err(MapError::DuplicatePosition);
        }

        let point = CornerPoint {
            world_pos,
            grid_pos: coord,
            ground_type,
        };
        self.insert_corner(point);
        Ok(CornerWrite::Created(point))
    }

    /// Center recorded for `coord`, if any.
    #[must_use]
    pub fn center(&self, coord: GridCoord) -> Option<&CenterPoint> {
        self.centers.get(&coord)
    }

    /// Reports whether a triangle occupies `coord`.
    #[must_use]
    pub fn has_center(&self, coord: GridCoord) -> bool {
        self.centers.contains_key(&coord)
    }

    /// Center recorded at `world_pos`, within the duplicate epsilon.
    #[must_use]
    pub fn center_at(&self, world_pos: WorldPos) -> Option<&CenterPoint> {
        self.index
            .find_nearby(world_pos, self.config.index.duplicate_epsilon)
            .into_iter()
            .find_map(|(key, _)| match key {
                PointKey::Center(coord) => self.centers.get(coord),
                PointKey::Corner(_) => None,
            })
    }

    /// Corner recorded at `world_pos`.
    ///
    /// Looks up the quantized key first and falls back to the index so that
    /// positions rounding to a neighbouring key still resolve.
    #[must_use]
    pub fn corner_at(&self, world_pos: WorldPos) -> Option<&CornerPoint> {
        if !world_pos.is_finite() {
            return None;
        }

        let key = world_pos.key(self.config.key_precision);
        if let Some(corner) = self.corners.get(&key) {
            return Some(corner);
        }

        self.index
            .find_nearby(world_pos, self.config.index.duplicate_epsilon)
            .into_iter()
            .find_map(|(key, _)| match key {
                PointKey::Corner(key) => self.corners.get(key),
                PointKey::Center(_) => None,
            })
    }

    /// Ground types of the triangle at `coord` in `[center, left, right, apex]` order.
    ///
    /// Slots without a recorded point are `None`.
    #[must_use]
    pub fn ground_types_for_triangle(&self, coord: GridCoord) -> [Option<GroundType>; 4] {
        let mut ground_types = [None; 4];
        ground_types[0] = self.center(coord).map(|center| center.ground_type);

        let orientation = coord.orientation();
        let positions = self.layout.corners_of(coord);
        for corner in Corner::ALL {
            let slot = ground_slot(corner, orientation);
            ground_types[slot.index()] = self
                .corner_at(positions[corner.index()])
                .map(|point| point.ground_type);
        }
        ground_types
    }

    /// Derived view of the triangle at `coord`, if it was placed.
    #[must_use]
    pub fn triangle(&self, coord: GridCoord) -> Option<Triangle> {
        self.has_center(coord).then(|| Triangle {
            coord,
            orientation: coord.orientation(),
            ground_types: self.ground_types_for_triangle(coord),
        })
    }

    /// Recorded center position for `coord`.
    #[must_use]
    pub fn world_position(&self, coord: GridCoord) -> Option<WorldPos> {
        self.center(coord).map(|center| center.world_pos)
    }

    /// Ground type at an arbitrary world position.
    ///
    /// A recorded corner at the position answers directly. Otherwise the first
    /// placed triangle containing the position answers with the nearest of its
    /// recorded points, so vertices and edges shared with empty slots still
    /// resolve. Positions outside every placed triangle yield `None`.
    #[must_use]
    pub fn ground_type_at_world_position(&self, world_pos: WorldPos) -> Option<GroundType> {
        if !world_pos.is_finite() {
            return None;
        }
        if let Some(corner) = self.corner_at(world_pos) {
            return Some(corner.ground_type);
        }

        let (coord, center) = self
            .layout
            .slots_containing(world_pos)
            .into_iter()
            .find_map(|coord| self.center(coord).map(|center| (coord, center)))?;
        let corners = self
            .layout
            .corners_of(coord)
            .into_iter()
            .filter_map(|position| self.corner_at(position))
            .map(|corner| (corner.world_pos, corner.ground_type));

        std::iter::once((center.world_pos, center.ground_type))
            .chain(corners)
            .min_by(|(a, _), (b, _)| a.distance(world_pos).total_cmp(&b.distance(world_pos)))
            .map(|(_, ground_type)| ground_type)
    }

    /// Reports whether an agent may stand at `world_pos`.
    #[must_use]
    pub fn is_walkable(&self, world_pos: WorldPos) -> bool {
        self.ground_type_at_world_position(world_pos)
            .map_or(false, GroundType::is_passable)
    }

    /// Keys and positions of every point within `radius` of `world_pos`.
    #[must_use]
    pub fn points_near(&self, world_pos: WorldPos, radius: f64) -> Vec<(PointKey, WorldPos)> {
        self.index
            .find_nearby(world_pos, radius)
            .into_iter()
            .map(|(key, pos)| (*key, *pos))
            .collect()
    }

    /// Number of placed triangles.
    #[must_use]
    pub fn center_count(&self) -> usize {
        self.centers.len()
    }

    /// Number of distinct corner vertices.
    #[must_use]
    pub fn corner_count(&self) -> usize {
        self.corners.len()
    }

    /// Number of points mirrored into the spatial index.
    #[must_use]
    pub fn indexed_count(&self) -> usize {
        self.index.len()
    }

    /// Iterates centers ordered by grid coordinate.
    pub fn centers(&self) -> impl Iterator<Item = &CenterPoint> {
        self.centers.values()
    }

    /// Iterates corners ordered by quantized position.
    pub fn corners(&self) -> impl Iterator<Item = (&PositionKey, &CornerPoint)> {
        self.corners.iter()
    }

    /// Discards every point and rebuilds an empty index.
    pub fn clear(&mut self) {
        self.centers.clear();
        self.corners.clear();
        self.index.clear();
    }

    /// Writes a center whose position was already checked against the index.
    pub(crate) fn insert_center(&mut self, center: CenterPoint) {
        let coord = center.grid_pos;
        if !self.index.insert(PointKey::Center(coord), center.world_pos) {
            error!(%coord, "center position collided after validation");
        }
        if self.config.trace_writes {
            trace!(%coord, ground_type = %center.ground_type, "recorded center point");
        }
        let _ = self.centers.insert(coord, center);
    }

    /// Writes a corner whose position was already checked against the index.
    pub(crate) fn insert_corner(&mut self, corner: CornerPoint) {
        let key = corner.world_pos.key(self.config.key_precision);
        if !self.index.insert(PointKey::Corner(key), corner.world_pos) {
            error!(%key, "corner position collided after validation");
        }
        if self.config.trace_writes {
            trace!(%key, ground_type = %corner.ground_type, "recorded corner point");
        }
        let _ = self.corners.insert(key, corner);
    }
}
