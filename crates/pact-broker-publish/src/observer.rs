// crates/pact-broker-publish/src/observer.rs
// ============================================================================
// Module: Publish Observers
// Description: Event hooks and JSON-lines event log for publish batches.
// Purpose: Report publish progress without coupling to a logging backend.
// Dependencies: serde, serde_json, std
// ============================================================================

//! ## Overview
//! The publisher reports [`PublishEvent`] values to a [`PublishObserver`].
//! [`NoopObserver`] discards them; [`JsonLinesObserver`] writes one JSON
//! object per event to any writer.
//! Invariants:
//! - Observer failures never change publish outcomes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Progress event emitted during a publish batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PublishEvent {
    /// Work on a location began.
    Started {
        /// Location identifier.
        location: String,
    },
    /// A location's pact was accepted by the broker.
    Published {
        /// Location identifier.
        location: String,
        /// Consumer name when known.
        consumer: Option<String>,
        /// Provider name when known.
        provider: Option<String>,
        /// Consumer version the pact was published under.
        consumer_version: String,
    },
    /// A location could not be published.
    Failed {
        /// Location identifier.
        location: String,
        /// Rendered failure cause.
        error: String,
    },
    /// The batch completed.
    Finished {
        /// Number of locations processed.
        total: usize,
        /// Number of locations published.
        succeeded: usize,
        /// Number of locations that failed.
        failed: usize,
    },
}

// ============================================================================
// SECTION: Observer Trait
// ============================================================================

/// Receives publish progress events.
pub trait PublishObserver: Send + Sync {
    /// Records one event.
    fn record(&self, event: &PublishEvent);
}

/// Observer that discards every event.
///
/// # Invariants
/// - Events are intentionally discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PublishObserver for NoopObserver {
    fn record(&self, _event: &PublishEvent) {}
}

// ============================================================================
// SECTION: JSON Lines Observer
// ============================================================================

/// Observer writing one JSON object per event.
///
/// # Invariants
/// - Each event is written as a single newline-terminated line.
/// - Write failures are dropped.
pub struct JsonLinesObserver<W> {
    /// Serialized writer.
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesObserver<W> {
    /// Creates an observer writing to `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the observer, returning the writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> PublishObserver for JsonLinesObserver<W> {
    fn record(&self, event: &PublishEvent) {
        let Ok(mut line) = serde_json::to_vec(event) else {
            return;
        };
        line.push(b'\n');
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Write and flush failures are dropped; they never change publish outcomes.
        drop(writer.write_all(&line).and_then(|()| writer.flush()));
    }
}
