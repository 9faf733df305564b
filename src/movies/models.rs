//! Movie records as exchanged with the upstream store and pushed to clients

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================================================
// Identifier
// ============================================================================

/// Opaque movie identifier assigned by the upstream store.
///
/// The store hands out integer ids while path parameters arrive as text, so
/// both JSON forms are accepted and compared by their canonical text. An id
/// that is a canonical integer serializes back as a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MovieId(String);

impl MovieId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Integer form of the id, if the canonical text is one.
    fn as_integer(&self) -> Option<i64> {
        self.0
            .parse::<i64>()
            .ok()
            .filter(|n| n.to_string() == self.0)
    }
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MovieId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MovieId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<i64> for MovieId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for MovieId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_integer() {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for MovieId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl de::Visitor<'_> for IdVisitor {
            type Value = MovieId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a movie id as a string or an integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MovieId, E> {
                Ok(MovieId::new(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MovieId, E> {
                Ok(MovieId::from(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MovieId, E> {
                Ok(MovieId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

// ============================================================================
// Records
// ============================================================================

/// A movie as stored upstream. Identity is the `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    pub year: i32,
}

/// Identification-only payload of a deleted event.
///
/// Decoding a full record into a `MovieRef` keeps the id and drops the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRef {
    pub id: MovieId,
}

impl From<&MovieRecord> for MovieRef {
    fn from(record: &MovieRecord) -> Self {
        Self {
            id: record.id.clone(),
        }
    }
}

/// Client-supplied movie without an id, forwarded to the store on create.
///
/// `year` is passed through verbatim; form clients send it as a string and
/// the store coerces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub year: serde_json::Value,
}

impl MovieDraft {
    pub fn new(title: impl Into<String>, year: i32) -> Self {
        Self {
            title: title.into(),
            year: serde_json::Value::from(year),
        }
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// Fields to change on update. Absent fields are not sent upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoviePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<serde_json::Value>,
}
