// crates/pact-broker-publish/src/client.rs
// ============================================================================
// Module: Broker Client Interface
// Description: Publish capability of a remote pact broker.
// Purpose: Decouple publishing from broker transport, auth, and retries.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`BrokerClient`] is the single capability the publisher needs from a pact
//! broker: accept one pact document under a consumer version. Transport,
//! authentication, and retry policy belong to implementations.
//! Invariants:
//! - `Ok(())` is returned only when the broker accepted the pact.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

// ============================================================================
// SECTION: Client Errors
// ============================================================================

/// Errors reported by broker clients.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The broker received the pact and refused it.
    #[error("broker rejected pact: {0}")]
    Rejected(String),
    /// The pact could not be delivered to the broker.
    #[error("broker transport failure: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Client Trait
// ============================================================================

/// Publishes pact documents to a broker.
pub trait BrokerClient: Send + Sync {
    /// Publishes one pact under `consumer_version`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the broker does not accept the pact.
    fn publish(&self, pact_json: &str, consumer_version: &str) -> Result<(), ClientError>;
}

impl<T: BrokerClient + ?Sized> BrokerClient for &T {
    fn publish(&self, pact_json: &str, consumer_version: &str) -> Result<(), ClientError> {
        (**self).publish(pact_json, consumer_version)
    }
}

impl<T: BrokerClient + ?Sized> BrokerClient for Arc<T> {
    fn publish(&self, pact_json: &str, consumer_version: &str) -> Result<(), ClientError> {
        (**self).publish(pact_json, consumer_version)
    }
}

// ============================================================================
// SECTION: Callback Client
// ============================================================================

/// Broker client backed by a closure.
pub struct CallbackClient<F> {
    /// Publish callback.
    callback: F,
}

impl<F> CallbackClient<F>
where
    F: Fn(&str, &str) -> Result<(), ClientError> + Send + Sync,
{
    /// Creates a client that forwards every publish call to `callback`.
    #[must_use]
    pub const fn new(callback: F) -> Self {
        Self {
            callback,
        }
    }
}

impl<F> BrokerClient for CallbackClient<F>
where
    F: Fn(&str, &str) -> Result<(), ClientError> + Send + Sync,
{
    fn publish(&self, pact_json: &str, consumer_version: &str) -> Result<(), ClientError> {
        (self.callback)(pact_json, consumer_version)
    }
}
