//! Change event types and their push envelope

use crate::movies::{MovieId, MovieRecord, MovieRef};
use serde::{Deserialize, Serialize};

/// The kind of mutation that was accepted upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A change to the catalog, emitted only after the store accepted it.
///
/// Transient: exists between the gateway and the subscribers, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Created(MovieRecord),
    Updated(MovieRecord),
    Deleted(MovieRef),
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Created(_) => ChangeKind::Created,
            ChangeEvent::Updated(_) => ChangeKind::Updated,
            ChangeEvent::Deleted(_) => ChangeKind::Deleted,
        }
    }

    /// Id of the record the change is about
    pub fn movie_id(&self) -> &MovieId {
        match self {
            ChangeEvent::Created(record) | ChangeEvent::Updated(record) => &record.id,
            ChangeEvent::Deleted(r) => &r.id,
        }
    }
}

/// Wire name of an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeType {
    MovieCreated,
    MovieUpdated,
    MovieDeleted,
}

impl From<ChangeKind> for EnvelopeType {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Created => EnvelopeType::MovieCreated,
            ChangeKind::Updated => EnvelopeType::MovieUpdated,
            ChangeKind::Deleted => EnvelopeType::MovieDeleted,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Push message `{ "type": "movie_created", "data": {...} }`.
///
/// One envelope per change, no batching, no acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub event_type: EnvelopeType,
    pub data: serde_json::Value,
}

impl Envelope {
    pub fn from_event(event: &ChangeEvent) -> Result<Self, EnvelopeError> {
        let data = match event {
            ChangeEvent::Created(record) | ChangeEvent::Updated(record) => {
                serde_json::to_value(record)?
            }
            ChangeEvent::Deleted(r) => serde_json::to_value(r)?,
        };
        Ok(Self {
            event_type: event.kind().into(),
            data,
        })
    }

    /// Decode the payload according to `type` alone.
    pub fn into_event(self) -> Result<ChangeEvent, EnvelopeError> {
        Ok(match self.event_type {
            EnvelopeType::MovieCreated => ChangeEvent::Created(serde_json::from_value(self.data)?),
            EnvelopeType::MovieUpdated => ChangeEvent::Updated(serde_json::from_value(self.data)?),
            EnvelopeType::MovieDeleted => ChangeEvent::Deleted(serde_json::from_value(self.data)?),
        })
    }

    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dune() -> MovieRecord {
        MovieRecord {
            id: MovieId::from("m1"),
            title: "Dune".into(),
            year: 1984,
        }
    }

    #[test]
    fn test_created_envelope_shape() {
        let envelope = Envelope::from_event(&ChangeEvent::Created(dune())).unwrap();
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"type": "movie_created", "data": {"id": "m1", "title": "Dune", "year": 1984}})
        );
    }

    #[test]
    fn test_deleted_envelope_carries_only_id() {
        let event = ChangeEvent::Deleted(MovieRef {
            id: MovieId::from("3"),
        });
        let json = Envelope::from_event(&event).unwrap().to_json().unwrap();
        assert_eq!(json, r#"{"type":"movie_deleted","data":{"id":3}}"#);
    }

    #[test]
    fn test_kind_maps_to_wire_name() {
        assert_eq!(
            serde_json::to_value(EnvelopeType::from(ChangeKind::Updated)).unwrap(),
            json!("movie_updated")
        );
        assert_eq!(ChangeEvent::Updated(dune()).kind(), ChangeKind::Updated);
    }

    #[test]
    fn test_decode_dispatches_on_type() {
        let envelope = Envelope::from_json(
            r#"{"type":"movie_deleted","data":{"id":"m1","title":"Dune","year":1984}}"#,
        )
        .unwrap();
        let event = envelope.into_event().unwrap();
        assert_eq!(event.kind(), ChangeKind::Deleted);
        assert_eq!(event.movie_id().as_str(), "m1");
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(Envelope::from_json(r#"{"type":"movie_renamed","data":{}}"#).is_err());
    }

    #[test]
    fn test_created_without_record_fields_rejected() {
        let envelope = Envelope::from_json(r#"{"type":"movie_created","data":{"id":1}}"#).unwrap();
        assert!(envelope.into_event().is_err());
    }
}
