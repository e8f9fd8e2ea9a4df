// crates/pact-broker-publish/src/publisher.rs
// ============================================================================
// Module: Pact Publisher
// Description: Batch publishing of local pact files with per-file isolation.
// Purpose: Publish every pact it can and report each file's result.
// Dependencies: pact-broker-config, pact-broker-core
// ============================================================================

//! ## Overview
//! [`PactPublisher`] reads each [`PactLocation`], parses it as a
//! [`PactDocument`], and hands the raw text to a [`BrokerClient`]. Failures
//! are recorded per location and never stop the batch.
//! [`PactPublisher::publish_merged`] first merges pacts that share a
//! consumer/provider pair and publishes one document per pair.
//! Invariants:
//! - Exactly one outcome per input location, in input order.
//! - Every readable location is attempted regardless of earlier failures.
//! - No retries are performed here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use pact_broker_config::LogFormat;
use pact_broker_config::PublishConfig;
use pact_broker_core::MergeError;
use pact_broker_core::MergeOptions;
use pact_broker_core::PactDocument;
use pact_broker_core::PactMerger;
use pact_broker_core::Pacticipants;

use crate::client::BrokerClient;
use crate::observer::JsonLinesObserver;
use crate::observer::NoopObserver;
use crate::observer::PublishEvent;
use crate::observer::PublishObserver;
use crate::outcome::PublishFailure;
use crate::outcome::PublishOutcome;
use crate::outcome::PublishReport;
use crate::source::FileLocation;
use crate::source::FileReadError;
use crate::source::PactLocation;

// ============================================================================
// SECTION: Publisher
// ============================================================================

/// Publishes batches of pact files through a broker client.
pub struct PactPublisher<C> {
    /// Broker publish capability.
    client: C,
    /// Progress event sink.
    observer: Box<dyn PublishObserver>,
    /// Merger used by grouped publishing.
    merger: PactMerger,
}

impl<C: BrokerClient> PactPublisher<C> {
    /// Creates a publisher with a no-op observer and default merge options.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client,
            observer: Box::new(NoopObserver),
            merger: PactMerger::new(),
        }
    }

    /// Replaces the progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: impl PublishObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Replaces the merge options used by [`Self::publish_merged`].
    #[must_use]
    pub fn with_merge_options(mut self, options: MergeOptions) -> Self {
        self.merger = PactMerger::with_options(options);
        self
    }

    /// Publishes each location independently, in order.
    pub fn publish<L: PactLocation>(&self, locations: &[L], consumer_version: &str) -> PublishReport {
        let mut outcomes = Vec::with_capacity(locations.len());
        for location in locations {
            let identifier = location.identifier();
            self.observer.record(&PublishEvent::Started {
                location: identifier.clone(),
            });
            let outcome = match load_pact(location) {
                Ok(loaded) => {
                    let result = self
                        .client
                        .publish(&loaded.raw, consumer_version)
                        .map_err(PublishFailure::from);
                    PublishOutcome {
                        location: identifier,
                        pacticipants: loaded.document.pacticipants(),
                        result,
                    }
                }
                Err(err) => unreadable(identifier, err),
            };
            self.record_outcome(&outcome, consumer_version);
            outcomes.push(outcome);
        }
        self.finish(outcomes)
    }

    /// Merges pacts per consumer/provider pair, then publishes one pact per pair.
    ///
    /// Unreadable locations fail individually. Every location in a pair shares
    /// the pair's merge and publish result. Locations that do not name both a
    /// consumer and a provider are published on their own.
    pub fn publish_merged<L: PactLocation>(
        &self,
        locations: &[L],
        consumer_version: &str,
    ) -> PublishReport {
        let mut slots: Vec<Option<PublishOutcome>> = vec![None; locations.len()];
        let mut loaded = Vec::new();
        for (index, location) in locations.iter().enumerate() {
            let identifier = location.identifier();
            self.observer.record(&PublishEvent::Started {
                location: identifier.clone(),
            });
            match load_pact(location) {
                Ok(pact) => loaded.push((index, pact)),
                Err(err) => {
                    let outcome = unreadable(identifier, err);
                    self.record_outcome(&outcome, consumer_version);
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(outcome);
                    }
                }
            }
        }

        for group in group_by_pacticipants(loaded) {
            let result = self.publish_group(&group, consumer_version);
            for (index, pact) in &group.members {
                let outcome = PublishOutcome {
                    location: pact.location.clone(),
                    pacticipants: group.pacticipants.clone(),
                    result: result.clone(),
                };
                self.record_outcome(&outcome, consumer_version);
                if let Some(slot) = slots.get_mut(*index) {
                    *slot = Some(outcome);
                }
            }
        }

        self.finish(slots.into_iter().flatten().collect())
    }

    /// Merges and publishes one pacticipant group.
    fn publish_group(&self, group: &PactGroup, consumer_version: &str) -> Result<(), PublishFailure> {
        let pact_json = match group.members.as_slice() {
            [(_, single)] => single.raw.clone(),
            members => {
                let documents: Vec<PactDocument> =
                    members.iter().map(|(_, pact)| pact.document.clone()).collect();
                let merged = self.merger.merge(&documents)?;
                merged.to_json_string().map_err(MergeError::from)?
            }
        };
        self.client.publish(&pact_json, consumer_version)?;
        Ok(())
    }

    /// Emits the terminal event for one outcome.
    fn record_outcome(&self, outcome: &PublishOutcome, consumer_version: &str) {
        let event = match &outcome.result {
            Ok(()) => PublishEvent::Published {
                location: outcome.location.clone(),
                consumer: outcome.pacticipants.as_ref().map(|names| names.consumer.clone()),
                provider: outcome.pacticipants.as_ref().map(|names| names.provider.clone()),
                consumer_version: consumer_version.to_string(),
            },
            Err(failure) => PublishEvent::Failed {
                location: outcome.location.clone(),
                error: failure.to_string(),
            },
        };
        self.observer.record(&event);
    }

    /// Emits the batch summary and builds the report.
    fn finish(&self, outcomes: Vec<PublishOutcome>) -> PublishReport {
        let report = PublishReport::new(outcomes);
        let succeeded = report.successes().count();
        self.observer.record(&PublishEvent::Finished {
            total: report.len(),
            succeeded,
            failed: report.len() - succeeded,
        });
        report
    }
}

// ============================================================================
// SECTION: Configured Runs
// ============================================================================

/// Runs the publish batch described by `config`.
///
/// Events are written as JSON lines to stderr when the config selects the
/// `json` log format.
pub fn run_configured<C: BrokerClient>(config: &PublishConfig, client: C) -> PublishReport {
    let locations: Vec<FileLocation> = config
        .pact_files
        .iter()
        .map(|path| FileLocation::new(path).with_max_bytes(config.max_pact_bytes))
        .collect();
    let publisher = match config.log.format {
        LogFormat::None => PactPublisher::new(client),
        LogFormat::Json => {
            PactPublisher::new(client).with_observer(JsonLinesObserver::new(std::io::stderr()))
        }
    };
    if config.merge {
        publisher.publish_merged(&locations, &config.consumer_version)
    } else {
        publisher.publish(&locations, &config.consumer_version)
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// A readable, parsed pact.
struct LoadedPact {
    /// Location identifier.
    location: String,
    /// Raw file text, published verbatim when not merged.
    raw: String,
    /// Parsed document.
    document: PactDocument,
}

/// Reads and parses one location.
fn load_pact<L: PactLocation>(location: &L) -> Result<LoadedPact, FileReadError> {
    let identifier = location.identifier();
    let raw = location.read_contents()?;
    let document = PactDocument::from_json_str(&raw).map_err(|err| FileReadError::Parse {
        location: identifier.clone(),
        reason: err.to_string(),
    })?;
    Ok(LoadedPact {
        location: identifier,
        raw,
        document,
    })
}

/// Builds the outcome for an unreadable location.
fn unreadable(location: String, err: FileReadError) -> PublishOutcome {
    PublishOutcome {
        location,
        pacticipants: None,
        result: Err(PublishFailure::from(err)),
    }
}

// ============================================================================
// SECTION: Grouping
// ============================================================================

/// Loaded pacts sharing one consumer/provider pair.
struct PactGroup {
    /// Shared pair, `None` for a pact that does not name both.
    pacticipants: Option<Pacticipants>,
    /// Input index and pact of each member, in input order.
    members: Vec<(usize, LoadedPact)>,
}

/// Groups pacts by consumer/provider pair in first-seen order.
fn group_by_pacticipants(loaded: Vec<(usize, LoadedPact)>) -> Vec<PactGroup> {
    let mut groups: Vec<PactGroup> = Vec::new();
    for (index, pact) in loaded {
        let pacticipants = pact.document.pacticipants();
        let position = match &pacticipants {
            Some(names) => {
                groups.iter().position(|group| group.pacticipants.as_ref() == Some(names))
            }
            None => None,
        };
        let existing = match position {
            Some(position) => groups.get_mut(position),
            None => None,
        };
        match existing {
            Some(group) => group.members.push((index, pact)),
            None => groups.push(PactGroup {
                pacticipants,
                members: vec![(index, pact)],
            }),
        }
    }
    groups
}
