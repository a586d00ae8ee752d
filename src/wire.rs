//! Wire format for exchanging query context with the server
//!
//! Responses carry the server's view under [`RESPONSE_KEY`]; requests echo the
//! committed cache under [`REQUEST_KEY`]. Both use the same entry shape:
//!
//! ```json
//! {
//!   "entries": [
//!     { "id": 0, "timestamp": 123456789, "priority": 0, "context": { "base64Data": "..." } }
//!   ]
//! }
//! ```

use crate::cache::{QueryContextCache, QueryContextElement};
use crate::error::{QueryContextError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Response field holding the server's query context
pub const RESPONSE_KEY: &str = "queryContext";

/// Request field holding the client's query context
pub const REQUEST_KEY: &str = "queryContextDTO";

/// The full set of query context entries exchanged in one message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContextDto {
    #[serde(default)]
    pub entries: Vec<QueryContextEntryDto>,
}

/// One query context entry as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContextEntryDto {
    pub id: u64,
    pub timestamp: u64,
    pub priority: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<OpaqueContextDto>,
}

/// Opaque context bytes, base64-encoded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueContextDto {
    #[serde(rename = "base64Data", default, skip_serializing_if = "Option::is_none")]
    pub base64_data: Option<String>,
}

impl From<&QueryContextElement> for QueryContextEntryDto {
    fn from(element: &QueryContextElement) -> Self {
        let context = if element.context.is_empty() {
            None
        } else {
            Some(OpaqueContextDto {
                base64_data: Some(STANDARD.encode(&element.context)),
            })
        };

        Self {
            id: element.id,
            timestamp: element.read_timestamp,
            priority: element.priority,
            context,
        }
    }
}

impl QueryContextEntryDto {
    /// Decode the opaque context and build a cache element
    pub fn into_element(self) -> Result<QueryContextElement> {
        let encoded = self.context.and_then(|c| c.base64_data);
        let context = decode_context(self.id, encoded.as_deref())?;
        Ok(QueryContextElement::new(
            self.id,
            self.timestamp,
            self.priority,
            context,
        ))
    }
}

fn decode_context(id: u64, encoded: Option<&str>) -> Result<Vec<u8>> {
    match encoded {
        None | Some("") => Ok(Vec::new()),
        Some(data) => STANDARD
            .decode(data)
            .map_err(|source| QueryContextError::ContextDecodeError { id, source }),
    }
}

/// Decode the `entries` array of a response payload
///
/// Returns `None` when the payload carries no query context at all.
pub fn decode_entries(data: &Value) -> Result<Option<Vec<QueryContextElement>>> {
    let entries = match data {
        Value::Null => return Ok(None),
        Value::Object(map) => match map.get("entries") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Array(entries)) if entries.is_empty() => return Ok(None),
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(QueryContextError::InvalidPayload(
                    "`entries` is not an array".to_string(),
                ))
            }
        },
        _ => {
            return Err(QueryContextError::InvalidPayload(
                "query context is not an object".to_string(),
            ))
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| decode_entry(index, entry))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn decode_entry(index: usize, entry: &Value) -> Result<QueryContextElement> {
    let id = unsigned_field(index, entry, "id")?;
    let timestamp = unsigned_field(index, entry, "timestamp")?;
    let priority = unsigned_field(index, entry, "priority")?;

    let encoded = match entry.get("context") {
        None | Some(Value::Null) => None,
        Some(Value::String(data)) => Some(data.as_str()),
        Some(Value::Object(map)) => match map.get("base64Data") {
            None | Some(Value::Null) => {
                debug!("Query context entry {} has an empty context", id);
                None
            }
            Some(Value::String(data)) => Some(data.as_str()),
            Some(_) => return Err(invalid_field(index, "context", "base64Data is not a string")),
        },
        Some(_) => return Err(invalid_field(index, "context", "is not an object or string")),
    };

    Ok(QueryContextElement::new(
        id,
        timestamp,
        priority,
        decode_context(id, encoded)?,
    ))
}

fn unsigned_field(index: usize, entry: &Value, field: &'static str) -> Result<u64> {
    entry
        .get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| invalid_field(index, field, "is not an unsigned integer"))
}

fn invalid_field(index: usize, field: &'static str, reason: &str) -> QueryContextError {
    QueryContextError::InvalidEntry {
        index,
        field,
        reason: reason.to_string(),
    }
}

impl QueryContextCache {
    /// Apply the query context of a server response as one merge round
    ///
    /// A missing or empty payload clears the cache. A malformed payload also
    /// clears it, since a partial merge must not survive, and the error is
    /// returned.
    pub fn deserialize_query_context(&self, data: Option<&Value>) -> Result<()> {
        let decoded = match data {
            Some(data) => decode_entries(data),
            None => Ok(None),
        };

        match decoded {
            Ok(Some(elements)) => {
                self.merge_round(elements);
                Ok(())
            }
            Ok(None) => {
                self.clear_cache();
                Ok(())
            }
            Err(e) => {
                warn!("Rejecting query context payload, clearing cache: {}", e);
                self.clear_cache();
                Err(e)
            }
        }
    }

    /// Apply an already-deserialized payload as one merge round
    pub fn deserialize_query_context_dto(&self, dto: Option<&QueryContextDto>) -> Result<()> {
        let Some(dto) = dto else {
            self.clear_cache();
            return Ok(());
        };

        let decoded = dto
            .entries
            .iter()
            .cloned()
            .map(QueryContextEntryDto::into_element)
            .collect::<Result<Vec<_>>>();

        match decoded {
            Ok(elements) => {
                self.merge_round(elements);
                Ok(())
            }
            Err(e) => {
                warn!("Rejecting query context entries, clearing cache: {}", e);
                self.clear_cache();
                Err(e)
            }
        }
    }

    /// Build the request payload, or `None` when the cache is empty
    pub fn serialize_query_context_dto(&self) -> Option<QueryContextDto> {
        let elements = self.elements();
        if elements.is_empty() {
            return None;
        }

        Some(QueryContextDto {
            entries: elements.iter().map(QueryContextEntryDto::from).collect(),
        })
    }

    /// Build the request payload as JSON, or `None` when the cache is empty
    pub fn serialize_query_context(&self) -> Result<Option<Value>> {
        self.serialize_query_context_dto()
            .map(serde_json::to_value)
            .transpose()
            .map_err(QueryContextError::from)
    }
}
