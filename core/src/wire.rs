//! Loosely typed point records exchanged with remote peers.
//!
//! Peers send numbers as JSON numbers, so every component arrives as `f64` and
//! is validated here before it can reach the map store.

use serde::{Deserialize, Serialize};

use crate::{
    CenterPoint, CornerPoint, GridCoord, GroundType, MapError, PointUpdate, RecordField, WorldPos,
};

/// World-space position as it appears on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WirePos {
    /// Horizontal plane coordinate.
    pub x: f64,
    /// Depth plane coordinate.
    pub z: f64,
}

/// Grid coordinate as it appears on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireCoord {
    /// Column-like axial component.
    pub q: f64,
    /// Row-like axial component.
    pub r: f64,
}

/// Unvalidated point record: `{ worldPos, gridPos, groundType }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointRecord {
    /// Position of the point on the world plane.
    pub world_pos: WirePos,
    /// Slot the point belongs to.
    pub grid_pos: WireCoord,
    /// Upper-case ground type name.
    pub ground_type: String,
}

impl PointRecord {
    /// Checks every field and returns the typed components.
    pub fn validate(&self) -> Result<(WorldPos, GridCoord, GroundType), MapError> {
        let x = finite(self.world_pos.x, RecordField::X)?;
        let z = finite(self.world_pos.z, RecordField::Z)?;
        let q = integral(self.grid_pos.q, RecordField::Q)?;
        let r = integral(self.grid_pos.r, RecordField::R)?;
        let ground_type = self
            .ground_type
            .parse::<GroundType>()
            .map_err(|_| MapError::MalformedRecord {
                field: RecordField::GroundType,
            })?;
        Ok((WorldPos::new(x, z), GridCoord::new(q, r), ground_type))
    }

    fn from_parts(world_pos: WorldPos, grid_pos: GridCoord, ground_type: GroundType) -> Self {
        Self {
            world_pos: WirePos {
                x: world_pos.x,
                z: world_pos.z,
            },
            grid_pos: WireCoord {
                q: f64::from(grid_pos.q()),
                r: f64::from(grid_pos.r()),
            },
            ground_type: ground_type.name().to_owned(),
        }
    }
}

/// Map update envelope: `{ "type": "centerPoint" | "cornerPoint", "data": record }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum PointMessage {
    /// Record destined for the center collection.
    CenterPoint(PointRecord),
    /// Record destined for the corner collection.
    CornerPoint(PointRecord),
}

impl PointMessage {
    /// Validates the record and converts it into a typed update.
    pub fn into_update(self) -> Result<PointUpdate, MapError> {
        match self {
            Self::CenterPoint(record) => {
                let (world_pos, grid_pos, ground_type) = record.validate()?;
                Ok(PointUpdate::Center(CenterPoint {
                    world_pos,
                    grid_pos,
                    ground_type,
                }))
            }
            Self::CornerPoint(record) => {
                let (world_pos, grid_pos, ground_type) = record.validate()?;
                Ok(PointUpdate::Corner(CornerPoint {
                    world_pos,
                    grid_pos,
                    ground_type,
                }))
            }
        }
    }
}

impl From<&PointUpdate> for PointMessage {
    fn from(update: &PointUpdate) -> Self {
        match update {
            PointUpdate::Center(point) => Self::CenterPoint(PointRecord::from_parts(
                point.world_pos,
                point.grid_pos,
                point.ground_type,
            )),
            PointUpdate::Corner(point) => Self::CornerPoint(PointRecord::from_parts(
                point.world_pos,
                point.grid_pos,
                point.ground_type,
            )),
        }
    }
}

fn finite(value: f64, field: RecordField) -> Result<f64, MapError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MapError::MalformedRecord { field })
    }
}

fn integral(value: f64, field: RecordField) -> Result<i32, MapError> {
    let in_range = value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX);
    if value.is_finite() && value.fract() == 0.0 && in_range {
        Ok(value as i32)
    } else {
        Err(MapError::MalformedRecord { field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(x: f64, z: f64, q: f64, r: f64, ground: &str) -> PointRecord {
        PointRecord {
            world_pos: WirePos { x, z },
            grid_pos: WireCoord { q, r },
            ground_type: ground.to_owned(),
        }
    }

    #[test]
    fn accepts_well_formed_record() {
        let (pos, coord, ground) = record(1.0, -0.5, 2.0, -3.0, "ROCK")
            .validate()
            .expect("valid record");
        assert_eq!(pos, WorldPos::new(1.0, -0.5));
        assert_eq!(coord, GridCoord::new(2, -3));
        assert_eq!(ground, GroundType::Rock);
    }

    #[test]
    fn rejects_non_finite_position() {
        assert_eq!(
            record(f64::NAN, 0.0, 0.0, 0.0, "GRASS").validate(),
            Err(MapError::MalformedRecord {
                field: RecordField::X
            })
        );
        assert_eq!(
            record(0.0, f64::INFINITY, 0.0, 0.0, "GRASS").validate(),
            Err(MapError::MalformedRecord {
                field: RecordField::Z
            })
        );
    }

    #[test]
    fn rejects_fractional_or_out_of_range_coordinates() {
        assert_eq!(
            record(0.0, 0.0, 0.5, 0.0, "GRASS").validate(),
            Err(MapError::MalformedRecord {
                field: RecordField::Q
            })
        );
        assert_eq!(
            record(0.0, 0.0, 0.0, 1e12, "GRASS").validate(),
            Err(MapError::MalformedRecord {
                field: RecordField::R
            })
        );
    }

    #[test]
    fn rejects_unknown_ground_type() {
        assert_eq!(
            record(0.0, 0.0, 0.0, 0.0, "LAVA").validate(),
            Err(MapError::MalformedRecord {
                field: RecordField::GroundType
            })
        );
    }

    #[test]
    fn message_json_uses_camel_case_envelope() {
        let json = r#"{"type":"cornerPoint","data":{"worldPos":{"x":1.0,"y":0.0,"z":-0.866025},"gridPos":{"q":0,"r":0},"groundType":"SAND"}}"#;
        let message: PointMessage = serde_json::from_str(json).expect("decodes");
        let update = message.into_update().expect("valid");
        assert_eq!(
            update,
            PointUpdate::Corner(CornerPoint {
                world_pos: WorldPos::new(1.0, -0.866_025),
                grid_pos: GridCoord::new(0, 0),
                ground_type: GroundType::Sand,
            })
        );
    }

    #[test]
    fn encoded_update_decodes_to_same_update() {
        let update = PointUpdate::Center(CenterPoint {
            world_pos: WorldPos::new(3.0, 0.288_675),
            grid_pos: GridCoord::new(3, 0),
            ground_type: GroundType::Woods,
        });
        let json = serde_json::to_string(&PointMessage::from(&update)).expect("encodes");
        assert!(json.contains("\"type\":\"centerPoint\""));
        assert!(json.contains("\"groundType\":\"WOODS\""));
        let decoded: PointMessage = serde_json::from_str(&json).expect("decodes");
        assert_eq!(decoded.into_update(), Ok(update));
    }
}
