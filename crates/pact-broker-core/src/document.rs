// crates/pact-broker-core/src/document.rs
// ============================================================================
// Module: Pact Document Model
// Description: Typed pact documents with an open metadata bag.
// Purpose: Separate interaction/message streams from pass-through metadata.
// Dependencies: serde, serde_json, serde_jcs, thiserror
// ============================================================================

//! ## Overview
//! A [`PactDocument`] holds two typed record streams (`interactions` and
//! `messages`) plus every other top-level key as opaque metadata. Records are
//! [`Interaction`] values identified by their `providerState` and
//! `description` fields.
//! Invariants:
//! - Unknown keys survive a parse/serialize round-trip in their original order.
//! - An absent stream is distinct from an empty stream.
//! - An absent identity field is distinct from an explicit `null`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Top-level key holding request/response interactions.
pub const INTERACTIONS_KEY: &str = "interactions";
/// Top-level key holding asynchronous message records.
pub const MESSAGES_KEY: &str = "messages";
/// Record key carrying the provider state half of a record identity.
pub const PROVIDER_STATE_KEY: &str = "providerState";
/// Record key carrying the description half of a record identity.
pub const DESCRIPTION_KEY: &str = "description";

// ============================================================================
// SECTION: Document Errors
// ============================================================================

/// Errors raised while decoding or encoding pact documents.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Input was not a valid pact document.
    #[error("invalid pact document: {0}")]
    Parse(String),
    /// Document could not be serialized.
    #[error("pact document serialization failed: {0}")]
    Serialize(String),
}

// ============================================================================
// SECTION: Record Streams
// ============================================================================

/// The two independent record streams a pact document may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionStream {
    /// Synchronous request/response interactions.
    Interactions,
    /// Asynchronous messages.
    Messages,
}

impl InteractionStream {
    /// Returns the document key for the stream.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interactions => INTERACTIONS_KEY,
            Self::Messages => MESSAGES_KEY,
        }
    }
}

impl fmt::Display for InteractionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Interaction Records
// ============================================================================

/// One interaction or message record.
///
/// # Invariants
/// - `provider_state` and `description` form the record identity.
/// - `body` never contains the identity keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Interaction {
    /// Provider state the record was captured under.
    #[serde(
        rename = "providerState",
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub provider_state: Option<Value>,
    /// Human-readable description of the record.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Value>,
    /// Remaining record fields.
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl Interaction {
    /// Creates a record from identity values and an empty body.
    #[must_use]
    pub fn new(provider_state: impl Into<Value>, description: impl Into<Value>) -> Self {
        Self {
            provider_state: Some(provider_state.into()),
            description: Some(description.into()),
            body: Map::new(),
        }
    }

    /// Adds a body field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    /// Returns the identity of the record.
    #[must_use]
    pub fn identity(&self) -> InteractionIdentity {
        InteractionIdentity {
            provider_state: self.provider_state.clone(),
            description: self.description.clone(),
        }
    }
}

/// Deserializes a present field as `Some`, keeping explicit `null` distinct from absence.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// ============================================================================
// SECTION: Record Identity
// ============================================================================

/// Identity of a record: its provider state and description.
///
/// # Invariants
/// - Values are opaque and compared by structural equality only.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionIdentity {
    /// Provider state value, `None` when the key was absent.
    pub provider_state: Option<Value>,
    /// Description value, `None` when the key was absent.
    pub description: Option<Value>,
}

impl InteractionIdentity {
    /// Returns a canonical key (RFC 8785 JSON) for indexing identities.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Serialize`] when canonicalization fails.
    pub fn canonical_key(&self) -> Result<String, DocumentError> {
        let tagged = Value::Array(vec![
            Value::Bool(self.provider_state.is_some()),
            self.provider_state.clone().unwrap_or(Value::Null),
            Value::Bool(self.description.is_some()),
            self.description.clone().unwrap_or(Value::Null),
        ]);
        serde_jcs::to_string(&tagged).map_err(|err| DocumentError::Serialize(err.to_string()))
    }
}

impl fmt::Display for InteractionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PROVIDER_STATE_KEY}: {}, {DESCRIPTION_KEY}: {}",
            render_optional(self.provider_state.as_ref()),
            render_optional(self.description.as_ref())
        )
    }
}

/// Renders an optional value for diagnostics.
pub(crate) fn render_optional(value: Option<&Value>) -> String {
    value.map_or_else(|| "<absent>".to_string(), Value::to_string)
}

// ============================================================================
// SECTION: Pact Documents
// ============================================================================

/// Consumer and provider names of a pact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pacticipants {
    /// Consumer application name.
    pub consumer: String,
    /// Provider application name.
    pub provider: String,
}

impl fmt::Display for Pacticipants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.consumer, self.provider)
    }
}

/// A pact contract document.
///
/// # Invariants
/// - `metadata` never contains the `interactions` or `messages` keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PactDocument {
    /// Every top-level key other than the record streams.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
    /// Interaction stream, `None` when the key was absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactions: Option<Vec<Interaction>>,
    /// Message stream, `None` when the key was absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Interaction>>,
}

impl PactDocument {
    /// Parses a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Parse`] when the text is not a JSON object of
    /// the expected shape.
    pub fn from_json_str(text: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(text).map_err(|err| DocumentError::Parse(err.to_string()))
    }

    /// Serializes the document as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Serialize`] when serialization fails.
    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        serde_json::to_string(self).map_err(|err| DocumentError::Serialize(err.to_string()))
    }

    /// Serializes the document as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Serialize`] when serialization fails.
    pub fn to_json_string_pretty(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|err| DocumentError::Serialize(err.to_string()))
    }

    /// Returns the record stream for the given kind.
    #[must_use]
    pub fn stream(&self, stream: InteractionStream) -> Option<&[Interaction]> {
        match stream {
            InteractionStream::Interactions => self.interactions.as_deref(),
            InteractionStream::Messages => self.messages.as_deref(),
        }
    }

    /// Returns `consumer.name` when present.
    #[must_use]
    pub fn consumer_name(&self) -> Option<&str> {
        participant_name(&self.metadata, "consumer")
    }

    /// Returns `provider.name` when present.
    #[must_use]
    pub fn provider_name(&self) -> Option<&str> {
        participant_name(&self.metadata, "provider")
    }

    /// Returns consumer and provider names when both are present.
    #[must_use]
    pub fn pacticipants(&self) -> Option<Pacticipants> {
        Some(Pacticipants {
            consumer: self.consumer_name()?.to_string(),
            provider: self.provider_name()?.to_string(),
        })
    }
}

/// Reads `<role>.name` from document metadata.
fn participant_name<'a>(metadata: &'a Map<String, Value>, role: &str) -> Option<&'a str> {
    metadata.get(role)?.get("name")?.as_str()
}
