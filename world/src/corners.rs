//! Shared-vertex consistency between neighbouring triangles.
//!
//! Six triangles meet at every lattice vertex. For each orientation and local
//! corner the tables list the five other slots touching that vertex and which
//! of their corners it is.

use stoon_core::{
    geometry::ground_slot, Corner, GridCoord, GroundType, MapError, Orientation, TriangleTerrain,
};

use crate::points::PointStore;

/// Another triangle slot that shares a vertex with the queried corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CornerNeighbor {
    /// Slot of the neighbouring triangle.
    pub coord: GridCoord,
    /// Local corner of the neighbour that coincides with the queried corner.
    pub corner: Corner,
}

/// Proposed corner ground type that disagrees with a placed neighbour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CornerConflict {
    /// Local corner of the proposed triangle.
    pub corner: Corner,
    /// Neighbour holding the conflicting ground type.
    pub neighbor: GridCoord,
    /// Ground type the neighbour records at the shared vertex.
    pub existing: GroundType,
    /// Ground type that was proposed.
    pub proposed: GroundType,
}

impl From<CornerConflict> for MapError {
    fn from(conflict: CornerConflict) -> Self {
        MapError::TerrainMismatch {
            existing: conflict.existing,
            proposed: conflict.proposed,
        }
    }
}

type Offsets = [(i32, i32, Corner); 5];

const UPWARD: [Offsets; 3] = [
    [
        (-1, 0, Corner::Apex),
        (-2, 0, Corner::Right),
        (-1, -1, Corner::Apex),
        (0, -1, Corner::Left),
        (-2, -1, Corner::Right),
    ],
    [
        (1, 0, Corner::Apex),
        (2, 0, Corner::Left),
        (1, -1, Corner::Apex),
        (0, -1, Corner::Right),
        (2, -1, Corner::Left),
    ],
    [
        (0, 1, Corner::Apex),
        (1, 0, Corner::Left),
        (-1, 0, Corner::Right),
        (1, 1, Corner::Left),
        (-1, 1, Corner::Right),
    ],
];

const DOWNWARD: [Offsets; 3] = [
    [
        (-1, 0, Corner::Apex),
        (-2, 0, Corner::Right),
        (0, 1, Corner::Left),
        (-2, 1, Corner::Right),
        (-1, 1, Corner::Apex),
    ],
    [
        (1, 0, Corner::Apex),
        (2, 0, Corner::Left),
        (0, 1, Corner::Right),
        (2, 1, Corner::Left),
        (1, 1, Corner::Apex),
    ],
    [
        (0, -1, Corner::Apex),
        (1, -1, Corner::Left),
        (-1, -1, Corner::Right),
        (1, 0, Corner::Left),
        (-1, 0, Corner::Right),
    ],
];

/// Lists the five other slots whose triangles touch `corner` of `coord`.
#[must_use]
pub fn corner_neighbors(coord: GridCoord, corner: Corner) -> [CornerNeighbor; 5] {
    let table = match coord.orientation() {
        Orientation::Upward => &UPWARD,
        Orientation::Downward => &DOWNWARD,
    };
    table[corner.index()].map(|(dq, dr, their)| CornerNeighbor {
        coord: coord.offset(dq, dr),
        corner: their,
    })
}

/// Ground type the placed triangle at `neighbor.coord` records at the shared vertex.
fn neighbor_ground(store: &PointStore, neighbor: CornerNeighbor) -> Option<GroundType> {
    if !store.has_center(neighbor.coord) {
        return None;
    }
    let slot = ground_slot(neighbor.corner, neighbor.coord.orientation());
    store.ground_types_for_triangle(neighbor.coord)[slot.index()]
}

fn first_conflict(
    store: &PointStore,
    coord: GridCoord,
    corner: Corner,
    proposed: GroundType,
) -> Option<CornerConflict> {
    corner_neighbors(coord, corner)
        .into_iter()
        .find_map(|neighbor| {
            neighbor_ground(store, neighbor)
                .filter(|existing| *existing != proposed)
                .map(|existing| CornerConflict {
                    corner,
                    neighbor: neighbor.coord,
                    existing,
                    proposed,
                })
        })
}

/// Reports whether every placed neighbour agrees with `ground_type` at the vertex.
///
/// Slots without a triangle are ignored.
#[must_use]
pub fn corner_matches(
    store: &PointStore,
    coord: GridCoord,
    corner: Corner,
    ground_type: GroundType,
) -> bool {
    first_conflict(store, coord, corner, ground_type).is_none()
}

/// Checks all three corners of a proposed triangle against its neighbours.
pub fn validate_ground_types(
    store: &PointStore,
    coord: GridCoord,
    terrain: &TriangleTerrain,
) -> Result<(), CornerConflict> {
    let orientation = coord.orientation();
    for corner in Corner::ALL {
        let proposed = terrain.for_corner(corner, orientation);
        if let Some(conflict) = first_conflict(store, coord, corner, proposed) {
            return Err(conflict);
        }
    }
    Ok(())
}

/// Ground types that existing vertices force on the slot at `coord`.
///
/// The center slot is never forced. A corner is forced when a vertex already
/// exists at its position or a placed neighbour records a ground type there.
#[must_use]
pub fn required_ground_types(store: &PointStore, coord: GridCoord) -> [Option<GroundType>; 4] {
    let mut required = [None; 4];
    let orientation = coord.orientation();
    let positions = store.layout().corners_of(coord);

    for corner in Corner::ALL {
        let forced = store
            .corner_at(positions[corner.index()])
            .map(|point| point.ground_type)
            .or_else(|| {
                corner_neighbors(coord, corner)
                    .into_iter()
                    .find_map(|neighbor| neighbor_ground(store, neighbor))
            });
        let slot = ground_slot(corner, orientation);
        required[slot.index()] = forced;
    }
    required
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use stoon_core::{geometry::TriangleLayout, CenterPoint, CornerPoint};

    use super::*;
    use crate::config::MapConfig;

    fn place(store: &mut PointStore, coord: GridCoord, terrain: TriangleTerrain) {
        let layout = *store.layout();
        store.insert_center(CenterPoint {
            world_pos: layout.center_of(coord),
            grid_pos: coord,
            ground_type: terrain.center,
        });
        for corner in Corner::ALL {
            let world_pos = layout.corner_of(coord, corner);
            if store.corner_at(world_pos).is_none() {
                store.insert_corner(CornerPoint {
                    world_pos,
                    grid_pos: coord,
                    ground_type: terrain.for_corner(corner, coord.orientation()),
                });
            }
        }
    }

    #[test]
    fn neighbours_share_the_vertex_position() {
        let layout = TriangleLayout::new(1.25);
        for q in -3..3 {
            for r in -3..3 {
                let coord = GridCoord::new(q, r);
                for corner in Corner::ALL {
                    let vertex = layout.corner_of(coord, corner);
                    for neighbor in corner_neighbors(coord, corner) {
                        let theirs = layout.corner_of(neighbor.coord, neighbor.corner);
                        assert!(
                            vertex.distance(theirs) < 1e-9,
                            "{coord} {corner} -> {} {}",
                            neighbor.coord,
                            neighbor.corner
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn neighbours_are_the_only_other_slots_at_the_vertex() {
        let layout = TriangleLayout::default();
        let coord = GridCoord::new(0, 0);
        for corner in Corner::ALL {
            let vertex = layout.corner_of(coord, corner);
            let mut touching = BTreeSet::new();
            for q in -4..=4 {
                for r in -3..=3 {
                    let other = GridCoord::new(q, r);
                    if other == coord {
                        continue;
                    }
                    for theirs in Corner::ALL {
                        if layout.corner_of(other, theirs).distance(vertex) < 1e-9 {
                            let _ = touching.insert(CornerNeighbor {
                                coord: other,
                                corner: theirs,
                            });
                        }
                    }
                }
            }
            let listed: BTreeSet<CornerNeighbor> =
                corner_neighbors(coord, corner).into_iter().collect();
            assert_eq!(listed, touching, "{corner}");
        }
    }

    #[test]
    fn neighbour_relation_is_symmetric() {
        for coord in [GridCoord::new(0, 0), GridCoord::new(1, 0), GridCoord::new(-2, 3)] {
            for corner in Corner::ALL {
                for neighbor in corner_neighbors(coord, corner) {
                    let back = corner_neighbors(neighbor.coord, neighbor.corner);
                    assert!(back.contains(&CornerNeighbor { coord, corner }));
                }
            }
        }
    }

    #[test]
    fn matching_neighbours_accept_and_conflicts_report_the_corner() {
        let mut store = PointStore::new(MapConfig::default());
        place(&mut store, GridCoord::new(0, 0), TriangleTerrain::uniform(GroundType::Grass));

        // (1,0) shares its left corner and apex with (0,0).
        let proposal = TriangleTerrain::new(
            GroundType::Water,
            GroundType::Grass,
            GroundType::Sand,
            GroundType::Grass,
        );
        assert_eq!(validate_ground_types(&store, GridCoord::new(1, 0), &proposal), Ok(()));

        let clash = TriangleTerrain::new(
            GroundType::Grass,
            GroundType::Rock,
            GroundType::Grass,
            GroundType::Grass,
        );
        let conflict = validate_ground_types(&store, GridCoord::new(1, 0), &clash)
            .expect_err("left corner clashes");
        assert_eq!(conflict.corner, Corner::Left);
        assert_eq!(conflict.neighbor, GridCoord::new(0, 0));
        assert_eq!(conflict.existing, GroundType::Grass);
        assert_eq!(conflict.proposed, GroundType::Rock);
        assert!(!corner_matches(&store, GridCoord::new(1, 0), Corner::Left, GroundType::Rock));
        assert!(corner_matches(&store, GridCoord::new(1, 0), Corner::Right, GroundType::Rock));
    }

    #[test]
    fn required_ground_types_follow_existing_vertices() {
        let mut store = PointStore::new(MapConfig::default());
        place(
            &mut store,
            GridCoord::new(0, 0),
            TriangleTerrain::new(
                GroundType::Grass,
                GroundType::Sand,
                GroundType::Rock,
                GroundType::Woods,
            ),
        );
        // (1,0): its left corner is (0,0)'s apex and its apex is (0,0)'s right corner.
        assert_eq!(
            required_ground_types(&store, GridCoord::new(1, 0)),
            [None, Some(GroundType::Woods), None, Some(GroundType::Rock)]
        );
        assert_eq!(required_ground_types(&store, GridCoord::new(5, 5)), [None; 4]);
    }
}
