// crates/pact-broker-core/src/lib.rs
// ============================================================================
// Module: Pact Broker Core Library
// Description: Pact document model and deduplicating pact merger.
// Purpose: Provide the pure, I/O-free core shared by publishing workflows.
// Dependencies: serde, serde_json, serde_jcs, thiserror
// ============================================================================

//! ## Overview
//! Pact Broker Core defines the typed [`PactDocument`] model and the
//! [`PactMerger`] that folds several pacts for one consumer/provider pair into
//! a single canonical document.
//! Invariants:
//! - Merging performs no I/O and never mutates its inputs.
//! - Merge conflicts fail the whole merge; there are no partial results.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod document;
pub mod merge;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use document::DESCRIPTION_KEY;
pub use document::DocumentError;
pub use document::INTERACTIONS_KEY;
pub use document::Interaction;
pub use document::InteractionIdentity;
pub use document::InteractionStream;
pub use document::MESSAGES_KEY;
pub use document::PROVIDER_STATE_KEY;
pub use document::PactDocument;
pub use document::Pacticipants;
pub use merge::ConflictError;
pub use merge::FieldDifference;
pub use merge::MergeError;
pub use merge::MergeOptions;
pub use merge::MetadataPolicy;
pub use merge::PactMerger;
pub use merge::merge_pacts;
