#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bridges JSON map updates exchanged with peers and the world's message surface.
//!
//! Inbound text is decoded and validated into [`Command::IngestPoint`] values;
//! anything malformed is logged and dropped. Outbound, every point written by a
//! local placement is encoded as a map update for broadcast.

use stoon_core::{wire::PointMessage, Command, Event, MapError, PointUpdate, RecordField};
use tracing::{debug, warn};

/// Reasons an inbound map update could not be turned into a command.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The text is not a map update envelope.
    #[error("undecodable map update: {0}")]
    Json(#[from] serde_json::Error),
    /// The envelope decoded but a field failed validation.
    #[error(transparent)]
    Invalid(#[from] MapError),
}

impl DecodeError {
    /// Rejection reason in the world's error vocabulary.
    #[must_use]
    pub fn reason(&self) -> MapError {
        match self {
            Self::Json(_) => MapError::MalformedRecord {
                field: RecordField::Shape,
            },
            Self::Invalid(reason) => *reason,
        }
    }
}

/// Decodes a single JSON map update into a validated point.
pub fn decode(text: &str) -> Result<PointUpdate, DecodeError> {
    let message: PointMessage = serde_json::from_str(text)?;
    Ok(message.into_update()?)
}

/// Encodes a point as a JSON map update.
pub fn encode(update: &PointUpdate) -> Result<String, serde_json::Error> {
    serde_json::to_string(&PointMessage::from(update))
}

/// Pure system translating between peer messages and world commands and events.
#[derive(Debug, Default)]
pub struct Synchronizer {
    accepted: usize,
    dropped: usize,
    rejected: usize,
}

impl Synchronizer {
    /// Creates a synchronizer with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes inbound map updates into ingestion commands, in arrival order.
    pub fn handle_inbound<S: AsRef<str>>(&mut self, messages: &[S], out: &mut Vec<Command>) {
        for message in messages {
            match decode(message.as_ref()) {
                Ok(update) => {
                    self.accepted += 1;
                    out.push(Command::IngestPoint { update });
                }
                Err(error) => {
                    self.dropped += 1;
                    warn!(reason = %error.reason(), %error, "dropped inbound map update");
                }
            }
        }
    }

    /// Encodes points created by local placements for broadcast.
    ///
    /// Ingested points came from peers and are not echoed back.
    pub fn handle_outbound(&mut self, events: &[Event], out: &mut Vec<String>) {
        for event in events {
            match event {
                Event::TrianglePlaced {
                    center,
                    created_corners,
                } => {
                    let updates = std::iter::once(PointUpdate::Center(*center))
                        .chain(created_corners.iter().copied().map(PointUpdate::Corner));
                    for update in updates {
                        match encode(&update) {
                            Ok(text) => out.push(text),
                            Err(error) => warn!(%error, "failed to encode map update"),
                        }
                    }
                }
                Event::PointRejected { update, reason } => {
                    self.rejected += 1;
                    debug!(coord = %update.grid_pos(), %reason, "peer update refused by world");
                }
                _ => {}
            }
        }
    }

    /// Inbound messages turned into commands so far.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Inbound messages dropped as malformed so far.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Ingested points the world refused so far.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}
