#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative map store for the Stoon triangular world.
//!
//! The world owns every recorded center and corner point. It mutates only in
//! response to [`Command`] values passed to [`apply`], and reports the outcome
//! of each command as [`Event`] values. Read access goes through [`query`].

use stoon_core::{Command, Event, GridCoord, PointUpdate, TriangleTerrain};
use tracing::{debug, info, warn};

pub mod config;
pub mod corners;
pub mod placement;
pub mod points;
pub mod spatial;

use config::MapConfig;
use points::{CornerWrite, PointStore};

/// Represents the authoritative world map.
#[derive(Clone, Debug, Default)]
pub struct World {
    store: PointStore,
}

impl World {
    /// Creates an empty world using the reference configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty world using the provided configuration.
    #[must_use]
    pub fn with_config(config: MapConfig) -> Self {
        Self {
            store: PointStore::new(config),
        }
    }

    fn place(&mut self, coord: GridCoord, terrain: TriangleTerrain, out_events: &mut Vec<Event>) {
        let rule = self.store.config().adjacency;
        match placement::place_triangle(&mut self.store, coord, &terrain, rule) {
            Ok(outcome) => {
                debug!(
                    %coord,
                    created = outcome.created_corners.len(),
                    "placed triangle"
                );
                out_events.push(Event::TrianglePlaced {
                    center: outcome.center,
                    created_corners: outcome.created_corners,
                });
            }
            Err(reason) => {
                debug!(%coord, %reason, "rejected triangle placement");
                out_events.push(Event::PlacementRejected { coord, reason });
            }
        }
    }

    fn ingest(&mut self, update: PointUpdate, out_events: &mut Vec<Event>) {
        let result = match update {
            PointUpdate::Center(center) => self
                .store
                .add_center_point(center.grid_pos, center.ground_type),
            PointUpdate::Corner(corner) => self
                .store
                .add_corner_point(corner.world_pos, corner.grid_pos, corner.ground_type)
                .map(|write| {
                    if let CornerWrite::Unchanged(existing) = write {
                        debug!(
                            key = %existing.world_pos.key(self.store.config().key_precision),
                            "corner already recorded"
                        );
                    }
                }),
        };

        match result {
            Ok(()) => out_events.push(Event::PointIngested { update }),
            Err(reason) => {
                warn!(
                    coord = %update.grid_pos(),
                    ground_type = %update.ground_type(),
                    %reason,
                    "rejected point update"
                );
                out_events.push(Event::PointRejected { update, reason });
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceTriangle { coord, terrain } => world.place(coord, terrain, out_events),
        Command::IngestPoint { update } => world.ingest(update, out_events),
        Command::ClearWorld => {
            let centers = world.store.center_count();
            let corners = world.store.corner_count();
            world.store.clear();
            info!(centers, corners, "cleared world");
            out_events.push(Event::WorldCleared);
        }
    }
}

/// Read-only queries over the world map.
pub mod query {
    use stoon_core::{
        FrontierSlot, GridCoord, GroundType, MapError, Triangle, TriangleTerrain, WorldPos,
        WorldSnapshot,
    };

    use super::World;
    use crate::{config::MapConfig, placement, points::PointKey};

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &MapConfig {
        world.store.config()
    }

    /// Recorded center position of the triangle at `coord`.
    #[must_use]
    pub fn world_position(world: &World, coord: GridCoord) -> Option<WorldPos> {
        world.store.world_position(coord)
    }

    /// Ground type at an arbitrary position; `None` outside every placed triangle.
    #[must_use]
    pub fn ground_type_at(world: &World, position: WorldPos) -> Option<GroundType> {
        world.store.ground_type_at_world_position(position)
    }

    /// Ground types of the triangle at `coord` in `[center, left, right, apex]` order.
    #[must_use]
    pub fn triangle_ground_types(world: &World, coord: GridCoord) -> [Option<GroundType>; 4] {
        world.store.ground_types_for_triangle(coord)
    }

    /// Derived view of the triangle at `coord`, if one was placed.
    #[must_use]
    pub fn triangle(world: &World, coord: GridCoord) -> Option<Triangle> {
        world.store.triangle(coord)
    }

    /// Reports whether an agent may stand at `position`.
    #[must_use]
    pub fn is_walkable(world: &World, position: WorldPos) -> bool {
        world.store.is_walkable(position)
    }

    /// Runs placement validation without committing anything.
    pub fn can_place(
        world: &World,
        coord: GridCoord,
        terrain: &TriangleTerrain,
    ) -> Result<(), MapError> {
        let rule = world.store.config().adjacency;
        placement::check_placement(&world.store, coord, terrain, rule).map(|_| ())
    }

    /// Empty slots a placement could fill, with the ground types they are forced to take.
    #[must_use]
    pub fn frontier(world: &World) -> Vec<FrontierSlot> {
        placement::frontier(&world.store, world.store.config().adjacency)
    }

    /// Keys and positions of every recorded point within `radius` of `position`.
    #[must_use]
    pub fn points_near(
        world: &World,
        position: WorldPos,
        radius: f64,
    ) -> Vec<(PointKey, WorldPos)> {
        world.store.points_near(position, radius)
    }

    /// Number of placed triangles.
    #[must_use]
    pub fn triangle_count(world: &World) -> usize {
        world.store.center_count()
    }

    /// Number of distinct corner vertices.
    #[must_use]
    pub fn corner_count(world: &World) -> usize {
        world.store.corner_count()
    }

    /// Copies every recorded point into a serializable snapshot.
    #[must_use]
    pub fn snapshot(world: &World) -> WorldSnapshot {
        let mut snapshot = WorldSnapshot::default();
        for center in world.store.centers() {
            let _ = snapshot
                .centers
                .insert(center.grid_pos.to_string(), *center);
        }
        for (key, corner) in world.store.corners() {
            let _ = snapshot.corners.insert(key.to_string(), *corner);
        }
        snapshot
    }
}
