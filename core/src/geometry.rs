//! Pure coordinate geometry for the triangular grid.
//!
//! Triangles have side length `2 * size` and height `h = size * sqrt(3)`.
//! Row `r` spans `z` in `[r*h - h/2, r*h + h/2]`, and consecutive slots in a
//! row alternate orientation while overlapping by half a side. Centers sit on
//! the centroid, `h/6` below or above the middle of the row.

use crate::{Corner, GridCoord, Orientation, TerrainSlot, WorldPos};

/// Side-length scale used when none is configured.
pub const DEFAULT_TRIANGLE_SIZE: f64 = 1.0;

/// Fractional digits kept by corner position keys by default.
pub const DEFAULT_KEY_PRECISION: u32 = 6;

/// Reports whether the slot holds an upward triangle.
#[must_use]
pub const fn is_upward(coord: GridCoord) -> bool {
    matches!(coord.orientation(), Orientation::Upward)
}

/// Maps a local corner to its slot in the `[center, left, right, apex]` ordering.
///
/// Both orientations order their corners left base, right base, apex, so the
/// table is the same for both. The orientation stays in the signature so every
/// caller states which triangle the corner belongs to.
#[must_use]
pub const fn ground_slot(corner: Corner, orientation: Orientation) -> TerrainSlot {
    match (orientation, corner) {
        (Orientation::Upward, Corner::Left) | (Orientation::Downward, Corner::Left) => {
            TerrainSlot::Left
        }
        (Orientation::Upward, Corner::Right) | (Orientation::Downward, Corner::Right) => {
            TerrainSlot::Right
        }
        (Orientation::Upward, Corner::Apex) | (Orientation::Downward, Corner::Apex) => {
            TerrainSlot::Apex
        }
    }
}

/// Maps grid coordinates to world-space positions for a given triangle size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleLayout {
    size: f64,
}

impl Default for TriangleLayout {
    fn default() -> Self {
        Self::new(DEFAULT_TRIANGLE_SIZE)
    }
}

impl TriangleLayout {
    /// Creates a layout using `size` as half the triangle side length.
    #[must_use]
    pub const fn new(size: f64) -> Self {
        Self { size }
    }

    /// Half the triangle side length; the horizontal distance between slots.
    #[must_use]
    pub const fn size(&self) -> f64 {
        self.size
    }

    /// Height of a triangle, which is also the distance between rows.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.size * 3f64.sqrt()
    }

    fn vertical_offset(&self) -> f64 {
        self.height() / 6.0
    }

    /// World position of the centroid of the triangle at `coord`.
    #[must_use]
    pub fn center_of(&self, coord: GridCoord) -> WorldPos {
        let x = f64::from(coord.q()) * self.size;
        let z = f64::from(coord.r()) * self.height();
        match coord.orientation() {
            Orientation::Upward => WorldPos::new(x, z - self.vertical_offset()),
            Orientation::Downward => WorldPos::new(x, z + self.vertical_offset()),
        }
    }

    /// World positions of the corners in `[Left, Right, Apex]` order.
    #[must_use]
    pub fn corners_of(&self, coord: GridCoord) -> [WorldPos; 3] {
        let h = self.height();
        let x = f64::from(coord.q()) * self.size;
        let z = f64::from(coord.r()) * h;
        let (base, apex) = match coord.orientation() {
            Orientation::Upward => (z - h / 2.0, z + h / 2.0),
            Orientation::Downward => (z + h / 2.0, z - h / 2.0),
        };
        [
            WorldPos::new(x - self.size, base),
            WorldPos::new(x + self.size, base),
            WorldPos::new(x, apex),
        ]
    }

    /// World position of a single corner of the triangle at `coord`.
    #[must_use]
    pub fn corner_of(&self, coord: GridCoord, corner: Corner) -> WorldPos {
        self.corners_of(coord)[corner.index()]
    }

    /// Slot whose triangle contains `pos`.
    ///
    /// Points on a boundary belong to several triangles; this picks one of
    /// them, the left slot on a shared edge within a row. Use
    /// [`TriangleLayout::slots_containing`] to visit all of them.
    #[must_use]
    pub fn coord_at(&self, pos: WorldPos) -> GridCoord {
        let h = self.height();
        let row = (pos.z / h).round();
        // 0 on the row's lower edge, 1 on its upper edge.
        let rise = ((pos.z - row * h) / h + 0.5).clamp(0.0, 1.0);
        let column = pos.x / self.size;
        let left = column.floor();

        let mut best = GridCoord::new(left as i32, row as i32);
        let mut best_slack = f64::NEG_INFINITY;
        for candidate in [left, left + 1.0] {
            let coord = GridCoord::new(candidate as i32, row as i32);
            let half_width = match coord.orientation() {
                Orientation::Upward => 1.0 - rise,
                Orientation::Downward => rise,
            };
            let slack = half_width - (column - candidate).abs();
            if slack > best_slack {
                best = coord;
                best_slack = slack;
            }
        }
        best
    }

    /// Reports whether `pos` lies inside or on the boundary of the triangle at `coord`.
    #[must_use]
    pub fn contains(&self, coord: GridCoord, pos: WorldPos) -> bool {
        let rise = (pos.z / self.height() - f64::from(coord.r())) + 0.5;
        if !(-BOUNDARY_TOLERANCE..=1.0 + BOUNDARY_TOLERANCE).contains(&rise) {
            return false;
        }
        let half_width = match coord.orientation() {
            Orientation::Upward => 1.0 - rise,
            Orientation::Downward => rise,
        };
        (pos.x / self.size - f64::from(coord.q())).abs() <= half_width + BOUNDARY_TOLERANCE
    }

    /// Every slot whose closed triangle contains `pos`, starting with [`TriangleLayout::coord_at`].
    ///
    /// Interior points yield one slot, edge points two and vertices six.
    #[must_use]
    pub fn slots_containing(&self, pos: WorldPos) -> Vec<GridCoord> {
        let first = self.coord_at(pos);
        let mut slots = vec![first];
        for r in first.r() - 1..=first.r() + 1 {
            for q in first.q() - 2..=first.q() + 2 {
                let coord = GridCoord::new(q, r);
                if coord != first && self.contains(coord, pos) {
                    slots.push(coord);
                }
            }
        }
        slots
    }
}

/// Slack, in units of `size` and `h`, granted to points on a triangle boundary.
const BOUNDARY_TOLERANCE: f64 = 1e-9;
