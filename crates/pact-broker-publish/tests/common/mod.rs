// crates/pact-broker-publish/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared helpers for pact-broker-publish tests.
// Purpose: Provide recording clients, pact fixtures, and writer doubles.
// Dependencies: pact-broker-publish, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Provides shared helper functions and test doubles for publisher tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use pact_broker_publish::BrokerClient;
use pact_broker_publish::ClientError;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Pact Fixtures
// ============================================================================

/// Builds a pact between `consumer` and `provider` with the given interactions.
pub fn pact_json(consumer: &str, provider: &str, interactions: &Value) -> Value {
    json!({
        "consumer": {"name": consumer},
        "provider": {"name": provider},
        "interactions": interactions,
    })
}

/// Writes a JSON value to `dir/name` and returns the path.
pub fn write_pact(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, value.to_string()).expect("write pact fixture");
    path
}

// ============================================================================
// SECTION: Recording Client
// ============================================================================

/// One publish call observed by [`RecordingClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishCall {
    /// Published pact text.
    pub pact_json: String,
    /// Consumer version.
    pub consumer_version: String,
}

/// Broker client double that records calls and rejects marked pacts.
#[derive(Default)]
pub struct RecordingClient {
    /// Calls observed so far.
    calls: Mutex<Vec<PublishCall>>,
    /// Text that makes the client reject a pact.
    reject_marker: Option<String>,
}

impl RecordingClient {
    /// Creates a client that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client that rejects pacts whose text contains `marker`.
    pub fn rejecting(marker: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reject_marker: Some(marker.to_string()),
        }
    }

    /// Returns the recorded calls.
    pub fn calls(&self) -> Vec<PublishCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Returns the recorded calls parsed as JSON.
    pub fn published_values(&self) -> Vec<Value> {
        self.calls()
            .iter()
            .map(|call| serde_json::from_str(&call.pact_json).expect("published json"))
            .collect()
    }
}

impl BrokerClient for RecordingClient {
    fn publish(&self, pact_json: &str, consumer_version: &str) -> Result<(), ClientError> {
        self.calls.lock().expect("calls lock").push(PublishCall {
            pact_json: pact_json.to_string(),
            consumer_version: consumer_version.to_string(),
        });
        match &self.reject_marker {
            Some(marker) if pact_json.contains(marker.as_str()) => {
                Err(ClientError::Rejected(format!("pact contains {marker}")))
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Shared Buffer for Write Testing
// ============================================================================

/// A thread-safe buffer for testing Write implementations.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    /// Written bytes.
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Creates a new empty shared buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the contents as a string.
    pub fn to_string_lossy(&self) -> String {
        let guard = self.inner.lock().expect("buffer lock");
        String::from_utf8_lossy(&guard).to_string()
    }

    /// Returns each written line parsed as JSON.
    pub fn json_lines(&self) -> Vec<Value> {
        self.to_string_lossy()
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Failing Writer for Error Testing
// ============================================================================

/// A writer that always fails, for testing error paths.
pub struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("simulated write failure"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A writer that stores bytes but always fails to flush.
#[derive(Clone, Default)]
pub struct FlushFailingWriter {
    /// Bytes written before each failed flush.
    pub buffer: SharedBuffer,
}

impl Write for FlushFailingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Err(std::io::Error::other("simulated flush failure"))
    }
}
