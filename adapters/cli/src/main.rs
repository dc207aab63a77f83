#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that grows, inspects and probes Stoon world maps.

mod config;
mod logging;
mod snapshot_transfer;

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use stoon_core::{Command, Event, GridCoord, GroundType, WorldPos, WorldSnapshot};
use stoon_system_generator::Generator;
use stoon_system_sync::Synchronizer;
use stoon_world::{apply, query, World};
use tracing::{info, warn};

use crate::config::CliConfig;

/// Triangular world map tool
#[derive(Parser, Debug)]
#[command(name = "stoon", version, about)]
struct Cli {
    /// TOML settings file with optional `[map]` and `[generator]` tables
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log map decisions at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Grow a new world from the generator and write its snapshot
    Generate {
        /// Number of triangles to place
        #[arg(long, default_value_t = 100)]
        count: usize,
        /// Seed overriding the configured generator seed
        #[arg(long)]
        seed: Option<u64>,
        /// Write to this file instead of stdout
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Emit a single-line transfer string instead of JSON
        #[arg(long)]
        transfer: bool,
    },
    /// Rebuild a world from a snapshot and summarise it
    Inspect {
        /// Snapshot file (JSON or transfer string), `-` for stdin
        input: PathBuf,
    },
    /// Answer position and triangle queries against a snapshot
    Probe {
        /// Snapshot file (JSON or transfer string), `-` for stdin
        input: PathBuf,
        /// World position to query, as `x,z`
        #[arg(long = "pos", value_name = "X,Z", value_parser = parse_pos)]
        positions: Vec<WorldPos>,
        /// Triangle slot to query, as `q,r`
        #[arg(long = "coord", value_name = "Q,R", value_parser = parse_coord)]
        coords: Vec<GridCoord>,
    },
    /// Apply JSON-lines map updates from peers on top of an optional snapshot
    Replay {
        /// File with one map update per line, `-` for stdin
        messages: PathBuf,
        /// Snapshot to start from instead of an empty world
        #[arg(long, value_name = "FILE")]
        base: Option<PathBuf>,
        /// Write the resulting snapshot to this file instead of stdout
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Entry point for the Stoon command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;
    let config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        CliCommand::Generate {
            count,
            seed,
            output,
            transfer,
        } => {
            let mut generator_config = config.generator;
            if let Some(seed) = seed {
                generator_config.seed = seed;
            }
            let world = generate(&config, Generator::new(generator_config), count)?;
            let snapshot = query::snapshot(&world);
            let text = if transfer {
                snapshot_transfer::encode(&snapshot)?
            } else {
                serde_json::to_string_pretty(&snapshot).context("failed to serialise snapshot")?
            };
            write_output(output.as_deref(), &text)
        }
        CliCommand::Inspect { input } => {
            let world = load_world(&config, &input)?;
            print_summary(&world)
        }
        CliCommand::Probe {
            input,
            positions,
            coords,
        } => {
            let world = load_world(&config, &input)?;
            print_probes(&world, &positions, &coords)
        }
        CliCommand::Replay {
            messages,
            base,
            output,
        } => {
            let mut world = match base {
                Some(path) => load_world(&config, &path)?,
                None => World::with_config(config.map),
            };
            replay(&mut world, &read_input(&messages)?);
            let text = serde_json::to_string_pretty(&query::snapshot(&world))
                .context("failed to serialise snapshot")?;
            write_output(output.as_deref(), &text)
        }
    }
}

fn generate(config: &CliConfig, mut generator: Generator, count: usize) -> Result<World> {
    let mut world = World::with_config(config.map);
    let mut events = Vec::new();
    let mut commands = Vec::new();
    let attempt_limit = count.saturating_mul(4).max(16);

    for _ in 0..attempt_limit {
        if query::triangle_count(&world) >= count {
            break;
        }
        commands.clear();
        generator.handle(&events, &query::frontier(&world), &mut commands);
        events.clear();
        for command in commands.drain(..) {
            apply(&mut world, command, &mut events);
        }
    }
    generator.handle(&events, &[], &mut commands);

    let placed = query::triangle_count(&world);
    if placed < count {
        bail!(
            "generator placed {placed} of {count} triangles ({} rejected)",
            generator.rejected()
        );
    }
    info!(
        triangles = placed,
        corners = query::corner_count(&world),
        rejected = generator.rejected(),
        "generated world"
    );
    Ok(world)
}

fn load_world(config: &CliConfig, path: &Path) -> Result<World> {
    let contents = read_input(path)?;
    let snapshot = parse_snapshot(&contents)
        .with_context(|| format!("failed to load snapshot {}", path.display()))?;

    let mut world = World::with_config(config.map);
    let mut events = Vec::new();
    for update in snapshot.updates() {
        apply(&mut world, Command::IngestPoint { update }, &mut events);
    }
    let rejected = events
        .iter()
        .filter(|event| matches!(event, Event::PointRejected { .. }))
        .count();
    if rejected > 0 {
        warn!(rejected, total = snapshot.len(), "snapshot contained conflicting points");
    }
    info!(
        triangles = query::triangle_count(&world),
        corners = query::corner_count(&world),
        "loaded snapshot"
    );
    Ok(world)
}

fn parse_snapshot(contents: &str) -> Result<WorldSnapshot> {
    if snapshot_transfer::is_transfer_string(contents) {
        Ok(snapshot_transfer::decode(contents)?)
    } else {
        serde_json::from_str(contents).context("snapshot is neither JSON nor a transfer string")
    }
}

fn replay(world: &mut World, messages: &str) {
    let lines: Vec<&str> = messages
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let mut sync = Synchronizer::new();
    let mut commands = Vec::new();
    sync.handle_inbound(&lines, &mut commands);

    let mut events = Vec::new();
    for command in commands {
        apply(world, command, &mut events);
    }
    let mut echoes = Vec::new();
    sync.handle_outbound(&events, &mut echoes);
    info!(
        accepted = sync.accepted(),
        dropped = sync.dropped(),
        rejected = sync.rejected(),
        "replayed map updates"
    );
}

fn print_summary(world: &World) -> Result<()> {
    let snapshot = query::snapshot(world);
    let mut centers: BTreeMap<GroundType, usize> = BTreeMap::new();
    for center in snapshot.centers.values() {
        *centers.entry(center.ground_type).or_default() += 1;
    }
    let mut corners: BTreeMap<GroundType, usize> = BTreeMap::new();
    for corner in snapshot.corners.values() {
        *corners.entry(corner.ground_type).or_default() += 1;
    }

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "triangles: {}", query::triangle_count(world))?;
    writeln!(stdout, "corners:   {}", query::corner_count(world))?;
    writeln!(stdout, "frontier:  {}", query::frontier(world).len())?;
    for ground in GroundType::ALL {
        writeln!(
            stdout,
            "{ground:<6} centers {:>5}  corners {:>5}",
            centers.get(&ground).copied().unwrap_or(0),
            corners.get(&ground).copied().unwrap_or(0)
        )?;
    }
    Ok(())
}

fn print_probes(world: &World, positions: &[WorldPos], coords: &[GridCoord]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    for position in positions {
        let ground = query::ground_type_at(world, *position)
            .map_or_else(|| "none".to_owned(), |ground| ground.to_string());
        writeln!(
            stdout,
            "pos {},{} ground {ground} walkable {}",
            position.x,
            position.z,
            query::is_walkable(world, *position)
        )?;
    }
    for coord in coords {
        match query::triangle(world, *coord) {
            Some(triangle) => {
                let slots: Vec<String> = triangle
                    .ground_types
                    .iter()
                    .map(|ground| ground.map_or_else(|| "-".to_owned(), |g| g.to_string()))
                    .collect();
                writeln!(
                    stdout,
                    "coord {coord} {:?} [{}]",
                    triangle.orientation,
                    slots.join(" ")
                )?;
            }
            None => writeln!(stdout, "coord {coord} empty")?,
        }
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut contents = String::new();
        let _ = io::stdin()
            .read_to_string(&mut contents)
            .context("failed to read stdin")?;
        return Ok(contents);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, format!("{text}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote snapshot");
            Ok(())
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{text}")?;
            Ok(())
        }
    }
}

fn parse_pair(value: &str) -> Result<(&str, &str), String> {
    value
        .split_once(',')
        .map(|(a, b)| (a.trim(), b.trim()))
        .ok_or_else(|| format!("expected two comma-separated values, got `{value}`"))
}

fn parse_pos(value: &str) -> Result<WorldPos, String> {
    let (x, z) = parse_pair(value)?;
    let x: f64 = x.parse().map_err(|_| format!("invalid x `{x}`"))?;
    let z: f64 = z.parse().map_err(|_| format!("invalid z `{z}`"))?;
    let position = WorldPos::new(x, z);
    if position.is_finite() {
        Ok(position)
    } else {
        Err(format!("position `{value}` is not finite"))
    }
}

fn parse_coord(value: &str) -> Result<GridCoord, String> {
    let (q, r) = parse_pair(value)?;
    let q: i32 = q.parse().map_err(|_| format!("invalid q `{q}`"))?;
    let r: i32 = r.parse().map_err(|_| format!("invalid r `{r}`"))?;
    Ok(GridCoord::new(q, r))
}
