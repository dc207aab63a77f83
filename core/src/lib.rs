#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Stoon world map.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative map store, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what actually changed. The data model describes triangle slots on
//! an axial grid, the center and corner points recorded for them, and the
//! closed set of ground types a point may carry.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub mod geometry;
pub mod wire;

/// Commands that express all permissible map mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests placement of a triangle at the provided slot.
    PlaceTriangle {
        /// Slot the triangle should occupy.
        coord: GridCoord,
        /// Proposed ground types for the center and the three corners.
        terrain: TriangleTerrain,
    },
    /// Requests ingestion of a point record received from another peer.
    IngestPoint {
        /// Validated point carried by the record.
        update: PointUpdate,
    },
    /// Requests that every recorded point be discarded.
    ClearWorld,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a triangle was placed into the world.
    TrianglePlaced {
        /// Center point recorded for the new triangle.
        center: CenterPoint,
        /// Corner points that did not exist before the placement.
        created_corners: Vec<CornerPoint>,
    },
    /// Reports that a triangle placement request was rejected.
    PlacementRejected {
        /// Slot provided in the placement request.
        coord: GridCoord,
        /// Specific reason the placement failed.
        reason: MapError,
    },
    /// Confirms that an externally supplied point was recorded or already matched.
    PointIngested {
        /// Point that was accepted.
        update: PointUpdate,
    },
    /// Reports that an externally supplied point was refused.
    PointRejected {
        /// Point that was refused.
        update: PointUpdate,
        /// Specific reason the point was refused.
        reason: MapError,
    },
    /// Announces that all points were discarded.
    WorldCleared,
}

/// Axial coordinate addressing a single triangle slot.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCoord {
    q: i32,
    r: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Column-like axial component.
    #[must_use]
    pub const fn q(&self) -> i32 {
        self.q
    }

    /// Row-like axial component.
    #[must_use]
    pub const fn r(&self) -> i32 {
        self.r
    }

    /// Orientation of the triangle occupying this slot.
    ///
    /// A slot is upward exactly when `q + r` is even. Every component that needs
    /// the orientation derives it here.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        if (self.q as i64 + self.r as i64).rem_euclid(2) == 0 {
            Orientation::Upward
        } else {
            Orientation::Downward
        }
    }

    /// Returns the coordinate displaced by the provided axial offsets.
    #[must_use]
    pub const fn offset(&self, dq: i32, dr: i32) -> Self {
        Self {
            q: self.q.wrapping_add(dq),
            r: self.r.wrapping_add(dr),
        }
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.q, self.r)
    }
}

/// Direction the apex of a triangle points towards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Apex points towards increasing `z`; the base lies below.
    Upward,
    /// Apex points towards decreasing `z`; the base lies above.
    Downward,
}

/// Floating-point position on the world plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    /// Horizontal plane coordinate.
    pub x: f64,
    /// Depth plane coordinate.
    pub z: f64,
}

impl WorldPos {
    /// Creates a new world position.
    #[must_use]
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Reports whether both components are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(&self, other: WorldPos) -> f64 {
        (self.x - other.x).hypot(self.z - other.z)
    }

    /// Quantizes the position to the provided number of fractional digits.
    #[must_use]
    pub fn key(&self, precision: u32) -> PositionKey {
        PositionKey::quantize(*self, precision)
    }
}

/// Largest supported number of fractional digits in a [`PositionKey`].
pub const MAX_KEY_PRECISION: u32 = 9;

/// Position rounded to a fixed decimal precision, used as corner identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionKey {
    x: i64,
    z: i64,
    precision: u32,
}

impl PositionKey {
    /// Rounds `pos` to `precision` fractional digits.
    ///
    /// Precision is clamped to [`MAX_KEY_PRECISION`]. Non-finite components
    /// saturate, so callers must reject them before relying on the key.
    #[must_use]
    pub fn quantize(pos: WorldPos, precision: u32) -> Self {
        let precision = precision.min(MAX_KEY_PRECISION);
        let scale = 10f64.powi(precision as i32);
        Self {
            x: (pos.x * scale).round() as i64,
            z: (pos.z * scale).round() as i64,
            precision,
        }
    }

    /// Number of fractional digits retained by the key.
    #[must_use]
    pub const fn precision(&self) -> u32 {
        self.precision
    }

    /// Position represented by the key.
    #[must_use]
    pub fn to_pos(&self) -> WorldPos {
        let scale = 10f64.powi(self.precision as i32);
        WorldPos::new(self.x as f64 / scale, self.z as f64 / scale)
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10u64.pow(self.precision);
        let digits = self.precision as usize;
        let component = |value: i64, f: &mut fmt::Formatter<'_>| {
            let sign = if value < 0 { "-" } else { "" };
            let magnitude = value.unsigned_abs();
            if digits == 0 {
                write!(f, "{sign}{magnitude}")
            } else {
                write!(
                    f,
                    "{sign}{}.{:0digits$}",
                    magnitude / scale,
                    magnitude % scale
                )
            }
        };
        component(self.x, f)?;
        write!(f, ",")?;
        component(self.z, f)
    }
}

/// Terrain classification assigned to a center or corner point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroundType {
    /// Open grassland.
    Grass,
    /// Open water; the only impassable ground.
    Water,
    /// Beach or desert sand.
    Sand,
    /// Bare rock.
    Rock,
    /// Dense forest.
    Woods,
}

impl GroundType {
    /// Every ground type in declaration order.
    pub const ALL: [GroundType; 5] = [
        GroundType::Grass,
        GroundType::Water,
        GroundType::Sand,
        GroundType::Rock,
        GroundType::Woods,
    ];

    /// Canonical upper-case name used on the wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Grass => "GRASS",
            Self::Water => "WATER",
            Self::Sand => "SAND",
            Self::Rock => "ROCK",
            Self::Woods => "WOODS",
        }
    }

    /// Reports whether agents may stand on this ground.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Water)
    }
}

impl fmt::Display for GroundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Error returned when a string names no known ground type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown ground type `{0}`")]
pub struct UnknownGroundType(pub String);

impl FromStr for GroundType {
    type Err = UnknownGroundType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ground| ground.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownGroundType(value.to_owned()))
    }
}

/// Local corner of a triangle.
///
/// Upward triangles order their corners bottom-left, bottom-right, top.
/// Downward triangles order them top-left, top-right, bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Corner {
    /// Base corner with the smaller `x`.
    Left,
    /// Base corner with the larger `x`.
    Right,
    /// Corner opposite the base.
    Apex,
}

impl Corner {
    /// All corners in local index order.
    pub const ALL: [Corner; 3] = [Corner::Left, Corner::Right, Corner::Apex];

    /// Local index of the corner in `0..3`.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::Apex => 2,
        }
    }

    /// Resolves a local index back into a corner.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Left),
            1 => Some(Self::Right),
            2 => Some(Self::Apex),
            _ => None,
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Apex => "apex",
        })
    }
}

/// Slot of the canonical four-entry ground type ordering of a triangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainSlot {
    /// Ground under the triangle's center point.
    Center,
    /// Ground at the left base corner.
    Left,
    /// Ground at the right base corner.
    Right,
    /// Ground at the apex corner.
    Apex,
}

impl TerrainSlot {
    /// All slots in canonical order.
    pub const ALL: [TerrainSlot; 4] = [
        TerrainSlot::Center,
        TerrainSlot::Left,
        TerrainSlot::Right,
        TerrainSlot::Apex,
    ];

    /// Position of the slot within the canonical ordering.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Center => 0,
            Self::Left => 1,
            Self::Right => 2,
            Self::Apex => 3,
        }
    }
}

/// Ground types proposed for the four slots of a triangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriangleTerrain {
    /// Ground under the center point.
    pub center: GroundType,
    /// Ground at the left base corner.
    pub left: GroundType,
    /// Ground at the right base corner.
    pub right: GroundType,
    /// Ground at the apex corner.
    pub apex: GroundType,
}

impl TriangleTerrain {
    /// Creates a terrain proposal from explicit slot values.
    #[must_use]
    pub const fn new(
        center: GroundType,
        left: GroundType,
        right: GroundType,
        apex: GroundType,
    ) -> Self {
        Self {
            center,
            left,
            right,
            apex,
        }
    }

    /// Uses the same ground type for every slot.
    #[must_use]
    pub const fn uniform(ground: GroundType) -> Self {
        Self::new(ground, ground, ground, ground)
    }

    /// Builds a proposal from the canonical `[center, left, right, apex]` order.
    #[must_use]
    pub const fn from_array(slots: [GroundType; 4]) -> Self {
        Self::new(slots[0], slots[1], slots[2], slots[3])
    }

    /// Ground type proposed for the provided slot.
    #[must_use]
    pub const fn get(&self, slot: TerrainSlot) -> GroundType {
        match slot {
            TerrainSlot::Center => self.center,
            TerrainSlot::Left => self.left,
            TerrainSlot::Right => self.right,
            TerrainSlot::Apex => self.apex,
        }
    }

    /// Ground type proposed for a local corner of a triangle with `orientation`.
    #[must_use]
    pub const fn for_corner(&self, corner: Corner, orientation: Orientation) -> GroundType {
        self.get(geometry::ground_slot(corner, orientation))
    }

    /// Returns the proposal in canonical `[center, left, right, apex]` order.
    #[must_use]
    pub const fn to_array(&self) -> [GroundType; 4] {
        [self.center, self.left, self.right, self.apex]
    }
}

/// Canonical record of a placed triangle's center.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterPoint {
    /// Position of the center on the world plane.
    pub world_pos: WorldPos,
    /// Slot the center belongs to.
    pub grid_pos: GridCoord,
    /// Ground type under the center.
    pub ground_type: GroundType,
}

/// Canonical record of a corner vertex shared by neighbouring triangles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CornerPoint {
    /// Position of the vertex on the world plane.
    pub world_pos: WorldPos,
    /// Slot of the triangle that first created the vertex.
    pub grid_pos: GridCoord,
    /// Ground type recorded for the vertex.
    pub ground_type: GroundType,
}

/// Validated point record arriving from outside the map store.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PointUpdate {
    /// Center point keyed by its grid coordinate.
    Center(CenterPoint),
    /// Corner point keyed by its quantized position.
    Corner(CornerPoint),
}

impl PointUpdate {
    /// Position carried by the update.
    #[must_use]
    pub const fn world_pos(&self) -> WorldPos {
        match self {
            Self::Center(point) => point.world_pos,
            Self::Corner(point) => point.world_pos,
        }
    }

    /// Grid coordinate carried by the update.
    #[must_use]
    pub const fn grid_pos(&self) -> GridCoord {
        match self {
            Self::Center(point) => point.grid_pos,
            Self::Corner(point) => point.grid_pos,
        }
    }

    /// Ground type carried by the update.
    #[must_use]
    pub const fn ground_type(&self) -> GroundType {
        match self {
            Self::Center(point) => point.ground_type,
            Self::Corner(point) => point.ground_type,
        }
    }
}

/// Serializable copy of every point recorded by a world.
///
/// Centers are keyed by `"q,r"` and corners by their quantized `"x,z"` key, so
/// the JSON form reads the same as the lookup tables it was taken from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Center points keyed by grid coordinate.
    pub centers: BTreeMap<String, CenterPoint>,
    /// Corner points keyed by quantized position.
    pub corners: BTreeMap<String, CornerPoint>,
}

impl WorldSnapshot {
    /// Total number of points in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.centers.len() + self.corners.len()
    }

    /// Reports whether the snapshot holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty() && self.corners.is_empty()
    }

    /// Every point as an ingestible update, centers first.
    pub fn updates(&self) -> impl Iterator<Item = PointUpdate> + '_ {
        self.centers
            .values()
            .copied()
            .map(PointUpdate::Center)
            .chain(self.corners.values().copied().map(PointUpdate::Corner))
    }
}

/// Derived view of a triangle reconstructed from its center and corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle {
    /// Slot occupied by the triangle.
    pub coord: GridCoord,
    /// Orientation derived from the slot.
    pub orientation: Orientation,
    /// Ground types in `[center, left, right, apex]` order; `None` where no point exists.
    pub ground_types: [Option<GroundType>; 4],
}

/// Empty slot that a placement could currently fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrontierSlot {
    /// Slot that can receive a triangle.
    pub coord: GridCoord,
    /// Ground types forced by existing corners in `[center, left, right, apex]` order.
    pub required: [Option<GroundType>; 4],
}

/// Field of an external point record that failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordField {
    /// The record could not be decoded at all.
    Shape,
    /// World-space `x` was missing or not finite.
    X,
    /// World-space `z` was missing or not finite.
    Z,
    /// Grid `q` was not a finite integer in range.
    Q,
    /// Grid `r` was not a finite integer in range.
    R,
    /// Ground type name was not recognised.
    GroundType,
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shape => "record shape",
            Self::X => "worldPos.x",
            Self::Z => "worldPos.z",
            Self::Q => "gridPos.q",
            Self::R => "gridPos.r",
            Self::GroundType => "groundType",
        })
    }
}

/// Reasons a placement or ingestion request may be rejected by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum MapError {
    /// A triangle already occupies the requested slot.
    #[error("slot is already occupied by a triangle")]
    AlreadyOccupied,
    /// The triangle would not connect to the existing world as required.
    #[error("placement shares {shared} existing corners")]
    InsufficientAdjacency {
        /// Number of corners that coincide with existing corner points.
        shared: u8,
    },
    /// A shared vertex already carries a different ground type.
    #[error("vertex already records {existing}, proposal has {proposed}")]
    TerrainMismatch {
        /// Ground type already recorded at the vertex.
        existing: GroundType,
        /// Ground type proposed for the vertex.
        proposed: GroundType,
    },
    /// An external record failed boundary validation.
    #[error("malformed point record: invalid {field}")]
    MalformedRecord {
        /// Field that failed validation.
        field: RecordField,
    },
    /// Another point already occupies the position within tolerance.
    #[error("another point already occupies this position")]
    DuplicatePosition,
}
