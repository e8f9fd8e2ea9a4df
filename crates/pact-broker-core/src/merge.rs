// crates/pact-broker-core/src/merge.rs
// ============================================================================
// Module: Pact Merger
// Description: Deduplicating merge of pact documents for one pact relationship.
// Purpose: Combine locally produced pacts without losing or duplicating records.
// Dependencies: serde_json, serde_jcs, thiserror
// ============================================================================

//! ## Overview
//! [`PactMerger`] folds an ordered sequence of [`PactDocument`] values into one
//! document. The `interactions` and `messages` streams are deduplicated
//! independently by record identity (`providerState`, `description`).
//! Invariants:
//! - Each identity appears at most once per stream in the output.
//! - The first occurrence of an identity fixes its output position.
//! - A repeated identity with a different record fails the whole merge.
//! - Records and identities compare by canonical JSON, so `1` and `1.0` are equal.
//! - Output metadata is a shallow copy of the first document's metadata.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::document::DESCRIPTION_KEY;
use crate::document::DocumentError;
use crate::document::Interaction;
use crate::document::InteractionIdentity;
use crate::document::InteractionStream;
use crate::document::PROVIDER_STATE_KEY;
use crate::document::PactDocument;
use crate::document::render_optional;

// ============================================================================
// SECTION: Merge Errors
// ============================================================================

/// One field that differs between two records sharing an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDifference {
    /// Field name.
    pub field: String,
    /// Value in the first-seen record, `None` when absent.
    pub recorded: Option<Value>,
    /// Value in the later record, `None` when absent.
    pub incoming: Option<Value>,
}

impl fmt::Display for FieldDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field \"{}\" differs (recorded {}, incoming {})",
            self.field,
            render_optional(self.recorded.as_ref()),
            render_optional(self.incoming.as_ref())
        )
    }
}

/// Two records share an identity but differ elsewhere.
///
/// # Invariants
/// - `differences` is never empty.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("conflicting {stream} entry ({identity}): {}", render_differences(.differences))]
pub struct ConflictError {
    /// Stream the conflicting records belong to.
    pub stream: InteractionStream,
    /// Shared identity of the conflicting records.
    pub identity: InteractionIdentity,
    /// Fields whose values differ.
    pub differences: Vec<FieldDifference>,
}

impl ConflictError {
    /// Returns the names of the differing fields.
    #[must_use]
    pub fn differing_fields(&self) -> Vec<&str> {
        self.differences.iter().map(|difference| difference.field.as_str()).collect()
    }
}

/// Joins field differences for display.
fn render_differences(differences: &[FieldDifference]) -> String {
    differences.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Errors returned by the pact merger.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeError {
    /// No documents were supplied.
    #[error("no pact documents to merge")]
    NoDocuments,
    /// Two records with one identity differ.
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    /// A record identity or merged document could not be encoded.
    #[error("pact document encoding failed: {0}")]
    Document(String),
    /// A later document carries metadata that differs from the first document.
    #[error(
        "metadata key \"{key}\" differs across pacts (recorded {}, incoming {})",
        render_optional(.recorded.as_ref()),
        render_optional(.incoming.as_ref())
    )]
    MetadataMismatch {
        /// Metadata key.
        key: String,
        /// Value in the first document, `None` when absent.
        recorded: Option<Value>,
        /// Value in the later document.
        incoming: Option<Value>,
    },
}

impl From<DocumentError> for MergeError {
    fn from(err: DocumentError) -> Self {
        Self::Document(err.to_string())
    }
}

// ============================================================================
// SECTION: Merge Options
// ============================================================================

/// Handling of top-level metadata that differs between documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataPolicy {
    /// Keep the first document's metadata; ignore later metadata.
    #[default]
    FirstDocument,
    /// Fail when a later document's metadata differs from the first document's.
    RejectMismatch,
}

/// Options controlling a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOptions {
    /// Metadata handling.
    pub metadata: MetadataPolicy,
}

// ============================================================================
// SECTION: Pact Merger
// ============================================================================

/// Merges pact documents describing one consumer/provider relationship.
#[derive(Debug, Clone, Copy, Default)]
pub struct PactMerger {
    /// Merge options.
    options: MergeOptions,
}

impl PactMerger {
    /// Creates a merger with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a merger with the provided options.
    #[must_use]
    pub const fn with_options(options: MergeOptions) -> Self {
        Self {
            options,
        }
    }

    /// Merges the documents in order.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::NoDocuments`] for empty input,
    /// [`MergeError::Conflict`] when a repeated identity carries a different
    /// record, and [`MergeError::MetadataMismatch`] under
    /// [`MetadataPolicy::RejectMismatch`].
    pub fn merge(&self, documents: &[PactDocument]) -> Result<PactDocument, MergeError> {
        let (first, rest) = documents.split_first().ok_or(MergeError::NoDocuments)?;
        if self.options.metadata == MetadataPolicy::RejectMismatch {
            for document in rest {
                ensure_metadata_matches(&first.metadata, &document.metadata)?;
            }
        }

        let mut interactions = StreamAccumulator::new(InteractionStream::Interactions);
        let mut messages = StreamAccumulator::new(InteractionStream::Messages);
        for document in documents {
            interactions.absorb(document.interactions.as_deref())?;
            messages.absorb(document.messages.as_deref())?;
        }

        Ok(PactDocument {
            metadata: first.metadata.clone(),
            interactions: interactions.finish(),
            messages: messages.finish(),
        })
    }
}

/// Merges documents with default options.
///
/// # Errors
///
/// See [`PactMerger::merge`].
pub fn merge_pacts(documents: &[PactDocument]) -> Result<PactDocument, MergeError> {
    PactMerger::new().merge(documents)
}

// ============================================================================
// SECTION: Stream Accumulation
// ============================================================================

/// First-seen records of one stream, indexed by canonical identity.
struct StreamAccumulator {
    /// Stream being accumulated.
    stream: InteractionStream,
    /// Whether any input carried the stream key.
    present: bool,
    /// Records in first-seen order.
    records: Vec<Interaction>,
    /// Canonical identity key to position in `records`.
    index: BTreeMap<String, usize>,
}

impl StreamAccumulator {
    /// Creates an empty accumulator.
    const fn new(stream: InteractionStream) -> Self {
        Self {
            stream,
            present: false,
            records: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// Folds one document's stream into the accumulator.
    fn absorb(&mut self, records: Option<&[Interaction]>) -> Result<(), MergeError> {
        let Some(records) = records else {
            return Ok(());
        };
        self.present = true;
        for record in records {
            let key = record.identity().canonical_key()?;
            let recorded = self.index.get(&key).and_then(|position| self.records.get(*position));
            match recorded {
                Some(recorded) => {
                    let differences = diff_records(recorded, record);
                    if !differences.is_empty() {
                        return Err(ConflictError {
                            stream: self.stream,
                            identity: recorded.identity(),
                            differences,
                        }
                        .into());
                    }
                }
                None => {
                    self.index.insert(key, self.records.len());
                    self.records.push(record.clone());
                }
            }
        }
        Ok(())
    }

    /// Returns the merged stream, `None` when no input carried it.
    fn finish(self) -> Option<Vec<Interaction>> {
        self.present.then_some(self.records)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Lists every field whose value differs between two records.
fn diff_records(recorded: &Interaction, incoming: &Interaction) -> Vec<FieldDifference> {
    let mut differences = Vec::new();
    push_difference(
        &mut differences,
        PROVIDER_STATE_KEY,
        recorded.provider_state.as_ref(),
        incoming.provider_state.as_ref(),
    );
    push_difference(
        &mut differences,
        DESCRIPTION_KEY,
        recorded.description.as_ref(),
        incoming.description.as_ref(),
    );
    for (field, value) in &recorded.body {
        push_difference(&mut differences, field, Some(value), incoming.body.get(field));
    }
    for (field, value) in &incoming.body {
        if !recorded.body.contains_key(field) {
            push_difference(&mut differences, field, None, Some(value));
        }
    }
    differences
}

/// Records a difference when the two values are not canonically equal.
fn push_difference(
    differences: &mut Vec<FieldDifference>,
    field: &str,
    recorded: Option<&Value>,
    incoming: Option<&Value>,
) {
    let same = match (recorded, incoming) {
        (None, None) => true,
        (Some(recorded), Some(incoming)) => canonically_equal(recorded, incoming),
        _ => false,
    };
    if !same {
        differences.push(FieldDifference {
            field: field.to_string(),
            recorded: recorded.cloned(),
            incoming: incoming.cloned(),
        });
    }
}

/// Compares two values by their RFC 8785 canonical JSON text.
fn canonically_equal(left: &Value, right: &Value) -> bool {
    if left == right {
        return true;
    }
    match (serde_jcs::to_string(left), serde_jcs::to_string(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

/// Fails when any metadata key of `incoming` differs from `recorded`.
fn ensure_metadata_matches(
    recorded: &Map<String, Value>,
    incoming: &Map<String, Value>,
) -> Result<(), MergeError> {
    for (key, value) in incoming {
        let existing = recorded.get(key);
        if existing != Some(value) {
            return Err(MergeError::MetadataMismatch {
                key: key.clone(),
                recorded: existing.cloned(),
                incoming: Some(value.clone()),
            });
        }
    }
    Ok(())
}
