// crates/pact-broker-publish/src/outcome.rs
// ============================================================================
// Module: Publish Outcomes
// Description: Per-file publish results and the batch report.
// Purpose: Record every file's result without aborting the batch.
// Dependencies: pact-broker-core, thiserror
// ============================================================================

//! ## Overview
//! Each input location yields exactly one [`PublishOutcome`]; a
//! [`PublishReport`] keeps them in input order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use pact_broker_core::MergeError;
use pact_broker_core::Pacticipants;
use thiserror::Error;

use crate::client::ClientError;
use crate::source::FileReadError;

// ============================================================================
// SECTION: Failures
// ============================================================================

/// Why one file was not published.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PublishFailure {
    /// The file could not be read or parsed.
    #[error(transparent)]
    FileRead(#[from] FileReadError),
    /// The broker client reported a failure.
    #[error("publish failed: {0}")]
    Publish(#[from] ClientError),
    /// Pacts sharing this file's consumer/provider pair could not be merged.
    #[error("merge failed: {0}")]
    Merge(#[from] MergeError),
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of publishing one location.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutcome {
    /// Location identifier.
    pub location: String,
    /// Consumer/provider names when the document parsed and named both.
    pub pacticipants: Option<Pacticipants>,
    /// Success or the failure cause.
    pub result: Result<(), PublishFailure>,
}

impl PublishOutcome {
    /// Returns true when the file was published.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the failure cause, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&PublishFailure> {
        match &self.result {
            Ok(()) => None,
            Err(failure) => Some(failure),
        }
    }
}

/// Ordered outcomes of one publish batch.
///
/// # Invariants
/// - One outcome per input location, in input order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PublishReport {
    /// Per-location outcomes.
    outcomes: Vec<PublishOutcome>,
}

impl PublishReport {
    /// Creates a report from ordered outcomes.
    #[must_use]
    pub const fn new(outcomes: Vec<PublishOutcome>) -> Self {
        Self {
            outcomes,
        }
    }

    /// Returns the outcomes in input order.
    #[must_use]
    pub fn outcomes(&self) -> &[PublishOutcome] {
        &self.outcomes
    }

    /// Consumes the report, returning the outcomes.
    #[must_use]
    pub fn into_outcomes(self) -> Vec<PublishOutcome> {
        self.outcomes
    }

    /// Returns true when every location was published.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(PublishOutcome::is_success)
    }

    /// Returns the successful outcomes.
    pub fn successes(&self) -> impl Iterator<Item = &PublishOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.is_success())
    }

    /// Returns the failed outcomes.
    pub fn failures(&self) -> impl Iterator<Item = &PublishOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    /// Returns the number of outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true when the batch was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
