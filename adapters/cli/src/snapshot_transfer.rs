use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use stoon_core::WorldSnapshot;

const SNAPSHOT_DOMAIN: &str = "stoon";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "stoon:v1";
/// Delimiter used to separate the prefix, point counts and payload.
const FIELD_DELIMITER: char = ':';

/// Errors that can occur while encoding or decoding snapshot transfer strings.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SnapshotTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("snapshot string was empty")]
    EmptyPayload,
    /// The encoded snapshot did not contain a version segment.
    #[error("snapshot string is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include the point counts.
    #[error("snapshot string is missing the point counts")]
    MissingCounts,
    /// The encoded snapshot did not include the payload segment.
    #[error("snapshot string is missing the payload")]
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("snapshot prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("snapshot version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The point counts could not be parsed.
    #[error("could not parse point counts '{0}'")]
    InvalidCounts(String),
    /// The payload holds a different number of points than announced.
    #[error("snapshot announced {expected} but carries {found}")]
    CountMismatch {
        /// Counts from the header, as `centers x corners`.
        expected: String,
        /// Counts found in the payload, as `centers x corners`.
        found: String,
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode snapshot payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse snapshot payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The snapshot could not be serialised.
    #[error("could not serialise snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Encodes the snapshot into a single-line string suitable for clipboard transfer.
pub(crate) fn encode(snapshot: &WorldSnapshot) -> Result<String, SnapshotTransferError> {
    let json = serde_json::to_vec(snapshot).map_err(SnapshotTransferError::Serialize)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
        snapshot.centers.len(),
        snapshot.corners.len()
    ))
}

/// Reports whether `value` looks like a transfer string rather than raw JSON.
pub(crate) fn is_transfer_string(value: &str) -> bool {
    value
        .trim_start()
        .starts_with(&format!("{SNAPSHOT_DOMAIN}{FIELD_DELIMITER}"))
}

/// Decodes a snapshot from the provided string representation.
pub(crate) fn decode(value: &str) -> Result<WorldSnapshot, SnapshotTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SnapshotTransferError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().unwrap_or_default();
    let version = parts.next().ok_or(SnapshotTransferError::MissingVersion)?;
    let counts = parts.next().ok_or(SnapshotTransferError::MissingCounts)?;
    let payload = parts.next().ok_or(SnapshotTransferError::MissingPayload)?;

    if domain != SNAPSHOT_DOMAIN {
        return Err(SnapshotTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != SNAPSHOT_VERSION {
        return Err(SnapshotTransferError::UnsupportedVersion(version.to_owned()));
    }

    let (centers, corners) = parse_counts(counts)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(SnapshotTransferError::InvalidEncoding)?;
    let snapshot: WorldSnapshot =
        serde_json::from_slice(&bytes).map_err(SnapshotTransferError::InvalidPayload)?;

    if snapshot.centers.len() != centers || snapshot.corners.len() != corners {
        return Err(SnapshotTransferError::CountMismatch {
            expected: counts.to_owned(),
            found: format!("{}x{}", snapshot.centers.len(), snapshot.corners.len()),
        });
    }
    Ok(snapshot)
}

fn parse_counts(counts: &str) -> Result<(usize, usize), SnapshotTransferError> {
    let invalid = || SnapshotTransferError::InvalidCounts(counts.to_owned());
    let (centers, corners) = counts.split_once(['x', 'X']).ok_or_else(invalid)?;
    let centers = centers.trim().parse::<usize>().map_err(|_| invalid())?;
    let corners = corners.trim().parse::<usize>().map_err(|_| invalid())?;
    Ok((centers, corners))
}

#[cfg(test)]
mod tests {
    use stoon_core::{CenterPoint, GridCoord, GroundType, WorldPos};

    use super::*;

    #[test]
    fn round_trip_empty_snapshot() {
        let snapshot = WorldSnapshot::default();
        let encoded = encode(&snapshot).expect("encodes");
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:0x0:")));
        assert!(is_transfer_string(&encoded));
        assert_eq!(decode(&encoded).expect("decodes"), snapshot);
    }

    #[test]
    fn round_trip_populated_snapshot() {
        let mut snapshot = WorldSnapshot::default();
        let _ = snapshot.centers.insert(
            "3,-1".to_owned(),
            CenterPoint {
                world_pos: WorldPos::new(3.0, -1.443_375_672_974_064_5),
                grid_pos: GridCoord::new(3, -1),
                ground_type: GroundType::Woods,
            },
        );
        let encoded = encode(&snapshot).expect("encodes");
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:1x0:")));
        assert_eq!(decode(&encoded).expect("decodes"), snapshot);
    }

    #[test]
    fn rejects_foreign_prefix_and_version() {
        assert!(matches!(
            decode("maze:v1:1x1:AAAA"),
            Err(SnapshotTransferError::InvalidPrefix(prefix)) if prefix == "maze"
        ));
        assert!(matches!(
            decode("stoon:v9:0x0:e30"),
            Err(SnapshotTransferError::UnsupportedVersion(_))
        ));
        assert!(matches!(decode("   "), Err(SnapshotTransferError::EmptyPayload)));
        assert!(!is_transfer_string("{\"centers\":{}}"));
    }

    #[test]
    fn rejects_mismatched_counts() {
        let encoded = encode(&WorldSnapshot::default()).expect("encodes");
        let tampered = encoded.replacen(":0x0:", ":2x0:", 1);
        assert!(matches!(
            decode(&tampered),
            Err(SnapshotTransferError::CountMismatch { .. })
        ));
    }
}
