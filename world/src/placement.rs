//! Validation and atomic commit of triangle placements.

use std::collections::BTreeSet;

use stoon_core::{
    CenterPoint, Corner, CornerPoint, FrontierSlot, GridCoord, MapError, TriangleTerrain, WorldPos,
};

use crate::{
    config::AdjacencyRule,
    corners::{corner_neighbors, required_ground_types, validate_ground_types},
    points::PointStore,
};

/// Decision taken for one corner of a planned triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlannedCorner {
    /// The vertex already exists and is reused unchanged.
    Existing(CornerPoint),
    /// The vertex is new and will be created by this placement.
    Create(CornerPoint),
}

/// Fully validated set of writes for a single placement.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementPlan {
    center: CenterPoint,
    corners: [PlannedCorner; 3],
}

impl PlacementPlan {
    /// Center point the placement will record.
    #[must_use]
    pub const fn center(&self) -> &CenterPoint {
        &self.center
    }

    /// Corner decisions in `[Left, Right, Apex]` order.
    #[must_use]
    pub const fn corners(&self) -> &[PlannedCorner; 3] {
        &self.corners
    }

    /// Number of corners that reuse an existing vertex.
    #[must_use]
    pub fn shared_corners(&self) -> u8 {
        self.corners
            .iter()
            .filter(|planned| matches!(planned, PlannedCorner::Existing(_)))
            .count() as u8
    }
}

/// Points written by a successful placement.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementOutcome {
    /// Center point recorded for the triangle.
    pub center: CenterPoint,
    /// Corners created by the placement, in local corner order.
    pub created_corners: Vec<CornerPoint>,
}

/// Number of corners of `coord` that coincide with recorded vertices.
#[must_use]
pub fn shared_corner_count(store: &PointStore, coord: GridCoord) -> u8 {
    store
        .layout()
        .corners_of(coord)
        .into_iter()
        .filter(|position| store.corner_at(*position).is_some())
        .count() as u8
}

fn is_empty_world(store: &PointStore) -> bool {
    store.center_count() == 0 && store.corner_count() == 0
}

fn check_adjacency(store: &PointStore, shared: u8, rule: AdjacencyRule) -> Result<(), MapError> {
    if is_empty_world(store) {
        return Ok(());
    }
    let connected = match rule {
        AdjacencyRule::ExactlyTwoCorners => shared == 2,
        AdjacencyRule::AnyMatchingCorner => shared > 0,
    };
    if connected {
        Ok(())
    } else {
        Err(MapError::InsufficientAdjacency { shared })
    }
}

/// Validates a placement without touching the store.
///
/// Checks run in order: occupancy, adjacency, terrain agreement, then
/// position collisions for every point the placement would create.
pub fn check_placement(
    store: &PointStore,
    coord: GridCoord,
    terrain: &TriangleTerrain,
    rule: AdjacencyRule,
) -> Result<PlacementPlan, MapError> {
    if store.has_center(coord) {
        return Err(MapError::AlreadyOccupied);
    }

    let layout = store.layout();
    let orientation = coord.orientation();
    let positions = layout.corners_of(coord);
    let existing = positions.map(|position| store.corner_at(position).copied());
    let shared = existing.iter().flatten().count() as u8;
    check_adjacency(store, shared, rule)?;

    for (corner, point) in Corner::ALL.into_iter().zip(existing) {
        let proposed = terrain.for_corner(corner, orientation);
        if let Some(point) = point.filter(|point| point.ground_type != proposed) {
            return Err(MapError::TerrainMismatch {
                existing: point.ground_type,
                proposed,
            });
        }
    }
    validate_ground_types(store, coord, terrain)?;

    let epsilon = store.config().index.duplicate_epsilon;
    let center = CenterPoint {
        world_pos: layout.center_of(coord),
        grid_pos: coord,
        ground_type: terrain.center,
    };
    let mut fresh: Vec<WorldPos> = vec![center.world_pos];
    let corners = Corner::ALL.map(|corner| match existing[corner.index()] {
        Some(point) => PlannedCorner::Existing(point),
        None => PlannedCorner::Create(CornerPoint {
            world_pos: positions[corner.index()],
            grid_pos: coord,
            ground_type: terrain.for_corner(corner, orientation),
        }),
    });
    for planned in &corners {
        if let PlannedCorner::Create(point) = planned {
            fresh.push(point.world_pos);
        }
    }

    for (index, position) in fresh.iter().enumerate() {
        if !store.points_near(*position, epsilon).is_empty() {
            return Err(MapError::DuplicatePosition);
        }
        if fresh[..index]
            .iter()
            .any(|earlier| earlier.distance(*position) <= epsilon)
        {
            return Err(MapError::DuplicatePosition);
        }
    }

    Ok(PlacementPlan { center, corners })
}

/// Writes a validated plan. Cannot fail once the plan exists.
pub fn commit(store: &mut PointStore, plan: PlacementPlan) -> PlacementOutcome {
    store.insert_center(plan.center);
    let mut created_corners = Vec::new();
    for planned in plan.corners {
        if let PlannedCorner::Create(point) = planned {
            store.insert_corner(point);
            created_corners.push(point);
        }
    }
    PlacementOutcome {
        center: plan.center,
        created_corners,
    }
}

/// Validates and records a triangle. A rejected placement writes nothing.
pub fn place_triangle(
    store: &mut PointStore,
    coord: GridCoord,
    terrain: &TriangleTerrain,
    rule: AdjacencyRule,
) -> Result<PlacementOutcome, MapError> {
    let plan = check_placement(store, coord, terrain, rule)?;
    Ok(commit(store, plan))
}

/// Empty slots that a placement could fill right now, ordered by coordinate.
///
/// An empty world offers only the origin. Otherwise candidates are the slots
/// touching a recorded vertex that pass the adjacency rule.
#[must_use]
pub fn frontier(store: &PointStore, rule: AdjacencyRule) -> Vec<FrontierSlot> {
    if is_empty_world(store) {
        return vec![FrontierSlot {
            coord: GridCoord::default(),
            required: [None; 4],
        }];
    }

    let mut candidates = BTreeSet::new();
    for center in store.centers() {
        for corner in Corner::ALL {
            for neighbor in corner_neighbors(center.grid_pos, corner) {
                if !store.has_center(neighbor.coord) {
                    let _ = candidates.insert(neighbor.coord);
                }
            }
        }
    }
    for (_, corner) in store.corners() {
        let _ = candidates.insert(store.layout().coord_at(corner.world_pos));
    }

    candidates
        .into_iter()
        .filter(|coord| !store.has_center(*coord))
        .filter(|coord| check_adjacency(store, shared_corner_count(store, *coord), rule).is_ok())
        .map(|coord| FrontierSlot {
            coord,
            required: required_ground_types(store, coord),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use stoon_core::GroundType;

    use super::*;
    use crate::config::MapConfig;

    fn grass() -> TriangleTerrain {
        TriangleTerrain::uniform(GroundType::Grass)
    }

    #[test]
    fn first_triangle_creates_all_corners() {
        let mut store = PointStore::default();
        let outcome = place_triangle(
            &mut store,
            GridCoord::new(0, 0),
            &grass(),
            AdjacencyRule::default(),
        )
        .expect("empty world accepts any slot");
        assert_eq!(outcome.created_corners.len(), 3);
        assert_eq!(store.center_count(), 1);
        assert_eq!(store.corner_count(), 3);
    }

    #[test]
    fn plan_reports_shared_corners() {
        let mut store = PointStore::default();
        let _ = place_triangle(&mut store, GridCoord::new(0, 0), &grass(), AdjacencyRule::default())
            .expect("first");
        let plan = check_placement(&store, GridCoord::new(1, 0), &grass(), AdjacencyRule::default())
            .expect("neighbour shares an edge");
        assert_eq!(plan.shared_corners(), 2);
        assert!(matches!(plan.corners()[Corner::Right.index()], PlannedCorner::Create(_)));
        assert_eq!(plan.center().grid_pos, GridCoord::new(1, 0));
        assert_eq!(store.center_count(), 1);
    }

    #[test]
    fn exactly_two_rule_rejects_vertex_only_contact() {
        let mut store = PointStore::default();
        let _ = place_triangle(&mut store, GridCoord::new(0, 0), &grass(), AdjacencyRule::default())
            .expect("first");
        // (2,0) only touches (0,0) at its right base corner.
        assert_eq!(
            check_placement(
                &store,
                GridCoord::new(2, 0),
                &grass(),
                AdjacencyRule::ExactlyTwoCorners
            ),
            Err(MapError::InsufficientAdjacency { shared: 1 })
        );
        assert!(check_placement(
            &store,
            GridCoord::new(2, 0),
            &grass(),
            AdjacencyRule::AnyMatchingCorner
        )
        .is_ok());
        assert_eq!(
            check_placement(
                &store,
                GridCoord::new(9, 9),
                &grass(),
                AdjacencyRule::AnyMatchingCorner
            ),
            Err(MapError::InsufficientAdjacency { shared: 0 })
        );
    }

    #[test]
    fn colliding_points_are_rejected_before_writing() {
        let config = MapConfig {
            triangle_size: 0.0001,
            ..MapConfig::default()
        };
        let mut store = PointStore::new(config);
        assert_eq!(
            place_triangle(&mut store, GridCoord::new(0, 0), &grass(), AdjacencyRule::default()),
            Err(MapError::DuplicatePosition)
        );
        assert_eq!(store.center_count(), 0);
        assert_eq!(store.corner_count(), 0);
    }

    #[test]
    fn frontier_of_empty_world_is_the_origin() {
        let store = PointStore::default();
        assert_eq!(
            frontier(&store, AdjacencyRule::default()),
            vec![FrontierSlot {
                coord: GridCoord::new(0, 0),
                required: [None; 4],
            }]
        );
    }

    #[test]
    fn frontier_lists_edge_neighbours_with_forced_terrain() {
        let mut store = PointStore::default();
        let terrain = TriangleTerrain::new(
            GroundType::Grass,
            GroundType::Sand,
            GroundType::Rock,
            GroundType::Woods,
        );
        let _ = place_triangle(&mut store, GridCoord::new(0, 0), &terrain, AdjacencyRule::default())
            .expect("first");

        let slots = frontier(&store, AdjacencyRule::ExactlyTwoCorners);
        let coords: Vec<GridCoord> = slots.iter().map(|slot| slot.coord).collect();
        assert_eq!(
            coords,
            vec![GridCoord::new(-1, 0), GridCoord::new(0, -1), GridCoord::new(1, 0)]
        );
        let below = slots
            .iter()
            .find(|slot| slot.coord == GridCoord::new(0, -1))
            .expect("edge neighbour below");
        assert_eq!(
            below.required,
            [None, Some(GroundType::Sand), Some(GroundType::Rock), None]
        );

        let loose = frontier(&store, AdjacencyRule::AnyMatchingCorner);
        assert_eq!(loose.len(), 12);
    }
}
