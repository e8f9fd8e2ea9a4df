// crates/pact-broker-publish/src/source.rs
// ============================================================================
// Module: Pact Locations
// Description: Resolvable handles to pact document content.
// Purpose: Read raw pact text from files or memory with size limits.
// Dependencies: thiserror, std
// ============================================================================

//! ## Overview
//! A [`PactLocation`] names a pact document for diagnostics and yields its raw
//! text. [`FileLocation`] reads from the filesystem; [`InlineLocation`] holds
//! content in memory.
//! Invariants:
//! - Content is capped at the configured byte limit, checked against the
//!   declared file length and again against the bytes actually read.
//! - Content must be UTF-8.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

pub use pact_broker_config::DEFAULT_MAX_PACT_BYTES;
use thiserror::Error;

// ============================================================================
// SECTION: Read Errors
// ============================================================================

/// Errors raised while reading or parsing one pact file.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileReadError {
    /// File is missing or unreadable.
    #[error("unable to read {location}: {reason}")]
    Io {
        /// Location identifier.
        location: String,
        /// Underlying I/O failure.
        reason: String,
    },
    /// File exceeds the size cap.
    #[error("{location} exceeds size limit ({actual} > {limit} bytes)")]
    TooLarge {
        /// Location identifier.
        location: String,
        /// Observed size in bytes.
        actual: u64,
        /// Configured cap in bytes.
        limit: u64,
    },
    /// File is not UTF-8.
    #[error("{location} is not valid utf-8")]
    InvalidUtf8 {
        /// Location identifier.
        location: String,
    },
    /// File is not a valid pact document.
    #[error("unable to parse {location}: {reason}")]
    Parse {
        /// Location identifier.
        location: String,
        /// Parser failure.
        reason: String,
    },
}

// ============================================================================
// SECTION: Location Trait
// ============================================================================

/// Handle to one pact document.
pub trait PactLocation {
    /// Returns a human-readable identifier (for example a path).
    fn identifier(&self) -> String;

    /// Reads the raw document text.
    ///
    /// # Errors
    ///
    /// Returns [`FileReadError`] when the content cannot be read.
    fn read_contents(&self) -> Result<String, FileReadError>;
}

impl<T: PactLocation + ?Sized> PactLocation for &T {
    fn identifier(&self) -> String {
        (**self).identifier()
    }

    fn read_contents(&self) -> Result<String, FileReadError> {
        (**self).read_contents()
    }
}

// ============================================================================
// SECTION: File Location
// ============================================================================

/// Pact document stored on the local filesystem.
///
/// # Invariants
/// - Reads never return more than `max_bytes` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    /// Path to the pact file.
    path: PathBuf,
    /// Size cap in bytes.
    max_bytes: usize,
}

impl FileLocation {
    /// Creates a file location with the default size cap.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_bytes: DEFAULT_MAX_PACT_BYTES,
        }
    }

    /// Overrides the size cap.
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Builds an I/O error for this location.
    fn io_error(&self, err: &std::io::Error) -> FileReadError {
        FileReadError::Io {
            location: self.identifier(),
            reason: err.to_string(),
        }
    }
}

impl PactLocation for FileLocation {
    fn identifier(&self) -> String {
        self.path.display().to_string()
    }

    fn read_contents(&self) -> Result<String, FileReadError> {
        let limit = u64::try_from(self.max_bytes).unwrap_or(u64::MAX);
        let file = File::open(&self.path).map_err(|err| self.io_error(&err))?;
        let declared = file.metadata().map_err(|err| self.io_error(&err))?.len();
        enforce_limit(&self.identifier(), declared, limit)?;
        let mut bytes = Vec::new();
        file.take(limit.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|err| self.io_error(&err))?;
        enforce_limit(&self.identifier(), u64::try_from(bytes.len()).unwrap_or(u64::MAX), limit)?;
        String::from_utf8(bytes).map_err(|_| FileReadError::InvalidUtf8 {
            location: self.identifier(),
        })
    }
}

// ============================================================================
// SECTION: Inline Location
// ============================================================================

/// Pact document held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineLocation {
    /// Identifier reported in outcomes.
    name: String,
    /// Raw document text.
    content: String,
}

impl InlineLocation {
    /// Creates an in-memory location.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl PactLocation for InlineLocation {
    fn identifier(&self) -> String {
        self.name.clone()
    }

    fn read_contents(&self) -> Result<String, FileReadError> {
        Ok(self.content.clone())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Fails when `actual` exceeds `limit`.
fn enforce_limit(location: &str, actual: u64, limit: u64) -> Result<(), FileReadError> {
    if actual > limit {
        return Err(FileReadError::TooLarge {
            location: location.to_string(),
            actual,
            limit,
        });
    }
    Ok(())
}
