#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seeded terrain generator that grows the world one frontier slot at a time.

use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng, SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use stoon_core::{Command, Event, FrontierSlot, GroundType, TriangleTerrain};

const DEFAULT_SEED: u64 = 0x5700_2e3d_91b4_c6a1;

/// Configuration parameters required to construct the generator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed of the random stream; equal seeds grow equal worlds.
    pub seed: u64,
    /// Relative frequency of each ground type, in [`GroundType::ALL`] order.
    pub weights: [u32; 5],
    /// Probability that an unforced corner copies the triangle's center ground.
    pub cohesion: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            weights: [1; 5],
            cohesion: 0.5,
        }
    }
}

impl Config {
    /// Creates a configuration with uniform weights and the provided seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

/// Pure system that proposes terrain-consistent placements for frontier slots.
#[derive(Debug)]
pub struct Generator {
    rng: ChaCha8Rng,
    weights: Option<WeightedIndex<u32>>,
    cohesion: f64,
    placed: usize,
    rejected: usize,
}

impl Generator {
    /// Creates a new generator using the supplied configuration.
    ///
    /// Weights that are all zero fall back to a uniform choice.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let cohesion = if config.cohesion.is_finite() {
            config.cohesion.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            weights: WeightedIndex::new(config.weights).ok(),
            cohesion,
            placed: 0,
            rejected: 0,
        }
    }

    /// Tallies placement outcomes and proposes the next triangle.
    ///
    /// Emits at most one command per call since any placement changes the
    /// frontier it was chosen from.
    pub fn handle(&mut self, events: &[Event], frontier: &[FrontierSlot], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::TrianglePlaced { .. } => self.placed += 1,
                Event::PlacementRejected { .. } => self.rejected += 1,
                _ => {}
            }
        }

        if frontier.is_empty() {
            return;
        }

        let slot = frontier[self.rng.gen_range(0..frontier.len())];
        let terrain = self.roll(slot.required);
        out.push(Command::PlaceTriangle {
            coord: slot.coord,
            terrain,
        });
    }

    /// Rolls ground types for every slot that `required` leaves open.
    pub fn roll(&mut self, required: [Option<GroundType>; 4]) -> TriangleTerrain {
        let center = match required[0] {
            Some(ground) => ground,
            None => self.ground(),
        };
        let mut slots = [center; 4];
        for (slot, forced) in slots.iter_mut().zip(required).skip(1) {
            *slot = match forced {
                Some(ground) => ground,
                None if self.rng.gen_bool(self.cohesion) => center,
                None => self.ground(),
            };
        }
        TriangleTerrain::from_array(slots)
    }

    fn ground(&mut self) -> GroundType {
        let index = match &self.weights {
            Some(weights) => weights.sample(&mut self.rng),
            None => self.rng.gen_range(0..GroundType::ALL.len()),
        };
        GroundType::ALL[index]
    }

    /// Placements confirmed by the world so far.
    #[must_use]
    pub fn placed(&self) -> usize {
        self.placed
    }

    /// Placements the world refused so far.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}
