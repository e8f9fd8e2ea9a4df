// crates/pact-broker-publish/src/lib.rs
// ============================================================================
// Module: Pact Broker Publish Library
// Description: Batch publishing of local pact files to a pact broker.
// Purpose: Read, optionally merge, and publish pacts with per-file isolation.
// Dependencies: pact-broker-config, pact-broker-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Pact Broker Publish provides the [`PactPublisher`] batch driver, the
//! [`BrokerClient`] capability it publishes through, [`PactLocation`]
//! implementations for reading pact text, and [`PublishObserver`] hooks for
//! progress events.
//! Invariants:
//! - One file's failure never prevents attempts on later files.
//! - Reports hold one outcome per input location, in input order.
//! - Transport, authentication, and retries are the broker client's concern.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod observer;
pub mod outcome;
pub mod publisher;
pub mod source;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::BrokerClient;
pub use client::CallbackClient;
pub use client::ClientError;
pub use observer::JsonLinesObserver;
pub use observer::NoopObserver;
pub use observer::PublishEvent;
pub use observer::PublishObserver;
pub use outcome::PublishFailure;
pub use outcome::PublishOutcome;
pub use outcome::PublishReport;
pub use publisher::PactPublisher;
pub use publisher::run_configured;
pub use source::DEFAULT_MAX_PACT_BYTES;
pub use source::FileLocation;
pub use source::FileReadError;
pub use source::InlineLocation;
pub use source::PactLocation;
