use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stoon_core::{Command, Corner, Event, GroundType, TriangleTerrain, WorldSnapshot};
use stoon_world::{apply, config::MapConfig, corners::corner_neighbors, query, World};

fn roll(rng: &mut ChaCha8Rng, required: [Option<GroundType>; 4]) -> TriangleTerrain {
    let mut slots = [GroundType::Grass; 4];
    for (slot, forced) in slots.iter_mut().zip(required) {
        *slot = forced.unwrap_or_else(|| GroundType::ALL[rng.gen_range(0..GroundType::ALL.len())]);
    }
    TriangleTerrain::from_array(slots)
}

/// Grows a world by repeatedly filling random frontier slots.
fn grow(seed: u64, placements: usize) -> World {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut world = World::new();
    let mut events = Vec::new();
    for _ in 0..placements {
        let frontier = query::frontier(&world);
        let slot = frontier.choose(&mut rng).copied().expect("frontier never empties");
        let terrain = roll(&mut rng, slot.required);
        apply(
            &mut world,
            Command::PlaceTriangle {
                coord: slot.coord,
                terrain,
            },
            &mut events,
        );
    }
    assert!(events
        .iter()
        .all(|event| matches!(event, Event::TrianglePlaced { .. })));
    world
}

fn restore(snapshot: &WorldSnapshot) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    for update in snapshot.updates() {
        apply(&mut world, Command::IngestPoint { update }, &mut events);
    }
    assert!(events
        .iter()
        .all(|event| matches!(event, Event::PointIngested { .. })));
    world
}

#[test]
fn corners_are_unique_and_well_separated() {
    let world = grow(7, 150);
    let snapshot = query::snapshot(&world);
    let epsilon = query::config(&world).index.duplicate_epsilon;
    let corners: Vec<_> = snapshot.corners.values().collect();
    for (index, corner) in corners.iter().enumerate() {
        for other in &corners[index + 1..] {
            assert!(corner.world_pos.distance(other.world_pos) > epsilon);
        }
    }
    assert_eq!(snapshot.centers.len(), 150);
}

#[test]
fn shared_vertices_agree_between_neighbours() {
    let world = grow(11, 120);
    for center in query::snapshot(&world).centers.values() {
        let coord = center.grid_pos;
        let ground = query::triangle_ground_types(&world, coord);
        assert!(ground.iter().all(Option::is_some), "{coord} has every point");
        for corner in Corner::ALL {
            let slot = stoon_core::geometry::ground_slot(corner, coord.orientation());
            for neighbor in corner_neighbors(coord, corner) {
                let Some(triangle) = query::triangle(&world, neighbor.coord) else {
                    continue;
                };
                let theirs = stoon_core::geometry::ground_slot(
                    neighbor.corner,
                    neighbor.coord.orientation(),
                );
                assert_eq!(
                    triangle.ground_types[theirs.index()],
                    ground[slot.index()],
                    "{coord} {corner} vs {}",
                    neighbor.coord
                );
            }
        }
    }
}

#[test]
fn centers_round_trip_through_geometry() {
    let world = grow(3, 80);
    let layout = query::config(&world).layout();
    for center in query::snapshot(&world).centers.values() {
        assert_eq!(layout.coord_at(center.world_pos), center.grid_pos);
        assert_eq!(
            query::world_position(&world, center.grid_pos),
            Some(layout.center_of(center.grid_pos))
        );
        assert_eq!(
            query::ground_type_at(&world, center.world_pos),
            Some(center.ground_type)
        );
    }
}

#[test]
fn every_vertex_and_edge_of_a_grown_world_resolves() {
    let world = grow(5, 100);
    let layout = query::config(&world).layout();
    let snapshot = query::snapshot(&world);
    for center in snapshot.centers.values() {
        let coord = center.grid_pos;
        let triangle = query::triangle(&world, coord).expect("placed");
        let [left, right, apex] = layout.corners_of(coord);
        for corner in Corner::ALL {
            let slot = stoon_core::geometry::ground_slot(corner, coord.orientation());
            let vertex = layout.corner_of(coord, corner);
            assert_eq!(
                query::ground_type_at(&world, vertex),
                triangle.ground_types[slot.index()],
                "{coord} {corner:?}"
            );
        }
        for (a, b) in [(left, right), (left, apex), (right, apex)] {
            let edge = stoon_core::WorldPos::new((a.x + b.x) / 2.0, (a.z + b.z) / 2.0);
            assert!(query::ground_type_at(&world, edge).is_some(), "{coord} {edge:?}");
        }
    }
}

#[test]
fn reads_are_idempotent() {
    let world = grow(19, 60);
    let first = query::snapshot(&world);
    let frontier = query::frontier(&world);
    for center in first.centers.values() {
        let _ = query::triangle(&world, center.grid_pos);
        let _ = query::ground_type_at(&world, center.world_pos);
    }
    assert_eq!(query::snapshot(&world), first);
    assert_eq!(query::frontier(&world), frontier);
}

#[test]
fn snapshot_reingestion_rebuilds_the_same_world() {
    let world = grow(23, 90);
    let snapshot = query::snapshot(&world);
    let restored = restore(&snapshot);
    assert_eq!(query::snapshot(&restored), snapshot);
    assert_eq!(query::frontier(&restored), query::frontier(&world));

    let mut events = Vec::new();
    let mut again = restored;
    for update in snapshot.updates() {
        apply(&mut again, Command::IngestPoint { update }, &mut events);
    }
    assert_eq!(query::snapshot(&again), snapshot);
}

#[test]
fn rejected_commands_never_change_the_store() {
    let mut rng = ChaCha8Rng::seed_from_u64(31);
    let mut world = grow(31, 40);
    for _ in 0..200 {
        let coord = stoon_core::GridCoord::new(rng.gen_range(-8..8), rng.gen_range(-8..8));
        let terrain = roll(&mut rng, [None; 4]);
        let before = query::snapshot(&world);
        let mut events = Vec::new();
        apply(&mut world, Command::PlaceTriangle { coord, terrain }, &mut events);
        if matches!(events[..], [Event::PlacementRejected { .. }]) {
            assert_eq!(query::snapshot(&world), before);
        }
    }
    let config = MapConfig::default();
    assert_eq!(*query::config(&world), config);
}
