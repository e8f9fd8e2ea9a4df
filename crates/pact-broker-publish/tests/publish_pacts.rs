// crates/pact-broker-publish/tests/publish_pacts.rs
// ============================================================================
// Module: Pact Publisher Tests
// Description: Batch publishing behavior over real files.
// Purpose: Validate per-file isolation, ordering, and grouped publishing.
// Dependencies: pact-broker-publish, pact-broker-core, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Exercises [`pact_broker_publish::PactPublisher`] against pact files on disk
//! and a recording broker client.

#![allow(dead_code, reason = "Common module may have unused helpers.")]
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

mod common;

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use common::RecordingClient;
use common::pact_json;
use common::write_pact;
use pact_broker_core::MergeError;
use pact_broker_core::MergeOptions;
use pact_broker_core::MetadataPolicy;
use pact_broker_core::Pacticipants;
use pact_broker_publish::CallbackClient;
use pact_broker_publish::ClientError;
use pact_broker_publish::FileLocation;
use pact_broker_publish::FileReadError;
use pact_broker_publish::InlineLocation;
use pact_broker_publish::PactPublisher;
use pact_broker_publish::PublishFailure;
use serde_json::json;
use tempfile::tempdir;

// ============================================================================
// SECTION: Per-File Publishing
// ============================================================================

/// Tests the raw file text is published under the consumer version.
#[test]
fn publishes_raw_pact_text_with_consumer_version() {
    let dir = tempdir().expect("temp dir");
    let raw = "{\"consumer\": {\"name\": \"Consumer\"}, \"provider\": {\"name\": \"Provider\"}}";
    let path = dir.path().join("consumer-provider.json");
    std::fs::write(&path, raw).expect("write pact");

    let client = RecordingClient::new();
    let report = PactPublisher::new(&client).publish(&[FileLocation::new(&path)], "1.2.3");

    assert!(report.all_succeeded());
    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].pact_json, raw);
    assert_eq!(calls[0].consumer_version, "1.2.3");
    assert_eq!(
        report.outcomes()[0].pacticipants,
        Some(Pacticipants {
            consumer: "Consumer".to_string(),
            provider: "Provider".to_string(),
        })
    );
}

/// Tests a missing file does not stop later files from publishing.
#[test]
fn missing_file_does_not_stop_the_batch() {
    let dir = tempdir().expect("temp dir");
    let missing = dir.path().join("doesnotexist.json");
    let valid = write_pact(dir.path(), "consumer-provider.json", &pact_json("C", "P", &json!([])));

    let client = RecordingClient::new();
    let report = PactPublisher::new(&client)
        .publish(&[FileLocation::new(&missing), FileLocation::new(&valid)], "1.2.3");

    assert_eq!(report.len(), 2);
    let outcomes = report.outcomes();
    assert_eq!(outcomes[0].location, missing.display().to_string());
    assert!(matches!(
        outcomes[0].failure(),
        Some(PublishFailure::FileRead(FileReadError::Io { .. }))
    ));
    assert!(outcomes[1].is_success());
    assert_eq!(client.calls().len(), 1);
    assert_eq!(client.published_values()[0], pact_json("C", "P", &json!([])));
    assert!(!report.all_succeeded());
}

/// Tests a rejected pact is isolated from the rest of the batch.
#[test]
fn rejected_pact_is_isolated() {
    let client = RecordingClient::rejecting("Rejected");
    let locations = vec![
        InlineLocation::new("a.json", pact_json("A", "P", &json!([])).to_string()),
        InlineLocation::new("b.json", pact_json("Rejected", "P", &json!([])).to_string()),
        InlineLocation::new("c.json", pact_json("C", "P", &json!([])).to_string()),
    ];
    let report = PactPublisher::new(&client).publish(&locations, "2.0.0");

    let results: Vec<bool> = report.outcomes().iter().map(|outcome| outcome.is_success()).collect();
    assert_eq!(results, vec![true, false, true]);
    assert_eq!(client.calls().len(), 3);
    let failure = report.outcomes()[1].failure().expect("failure");
    assert!(matches!(failure, PublishFailure::Publish(ClientError::Rejected(_))));
    assert!(failure.to_string().contains("Rejected"));
    assert_eq!(report.failures().count(), 1);
    assert_eq!(report.successes().count(), 2);
}

/// Tests an unparsable file is reported and never sent to the broker.
#[test]
fn unparsable_file_is_not_published() {
    let client = RecordingClient::new();
    let locations = vec![
        InlineLocation::new("broken.json", "{\"interactions\": "),
        InlineLocation::new("ok.json", "{}"),
    ];
    let report = PactPublisher::new(&client).publish(&locations, "1.0.0");

    assert!(matches!(
        report.outcomes()[0].failure(),
        Some(PublishFailure::FileRead(FileReadError::Parse { location, .. })) if location == "broken.json"
    ));
    assert!(report.outcomes()[1].is_success());
    assert_eq!(client.calls().len(), 1);
    assert_eq!(client.calls()[0].pact_json, "{}");
}

/// Tests files above the size cap are rejected before publishing.
#[test]
fn oversized_file_is_rejected() {
    let dir = tempdir().expect("temp dir");
    let path = write_pact(dir.path(), "big.json", &pact_json("C", "P", &json!([])));

    let client = RecordingClient::new();
    let report =
        PactPublisher::new(&client).publish(&[FileLocation::new(&path).with_max_bytes(8)], "1.0.0");

    assert!(matches!(
        report.outcomes()[0].failure(),
        Some(PublishFailure::FileRead(FileReadError::TooLarge { limit: 8, .. }))
    ));
    assert!(client.calls().is_empty());
}

/// Tests every location is attempted even when all of them fail.
#[test]
fn every_failure_is_recorded_in_order() {
    let attempts = AtomicUsize::new(0);
    let client = CallbackClient::new(|_, _| {
        attempts.fetch_add(1, Ordering::SeqCst);
        Err(ClientError::Transport("connection refused".to_string()))
    });
    let locations: Vec<InlineLocation> =
        (0 .. 4).map(|index| InlineLocation::new(format!("{index}.json"), "{}")).collect();
    let report = PactPublisher::new(&client).publish(&locations, "1.0.0");

    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    let names: Vec<&str> = report.outcomes().iter().map(|outcome| outcome.location.as_str()).collect();
    assert_eq!(names, vec!["0.json", "1.json", "2.json", "3.json"]);
    assert!(report.outcomes().iter().all(|outcome| !outcome.is_success()));
}

/// Tests an empty batch yields an empty, successful report.
#[test]
fn empty_batch_is_trivially_successful() {
    let client = RecordingClient::new();
    let report = PactPublisher::new(&client).publish::<InlineLocation>(&[], "1.0.0");
    assert!(report.is_empty());
    assert!(report.all_succeeded());
    assert!(client.calls().is_empty());
}

// ============================================================================
// SECTION: Grouped Publishing
// ============================================================================

/// Tests pacts for one pair are merged into a single publish.
#[test]
fn merged_publishing_combines_pacts_per_pair() {
    let dir = tempdir().expect("temp dir");
    let first = write_pact(
        dir.path(),
        "web-api-1.json",
        &pact_json("Web", "Api", &json!([{"providerState": 1, "description": 1, "foo": "bar"}])),
    );
    let other = write_pact(
        dir.path(),
        "web-billing.json",
        &pact_json("Web", "Billing", &json!([{"providerState": 9, "description": 9}])),
    );
    let second = write_pact(
        dir.path(),
        "web-api-2.json",
        &pact_json(
            "Web",
            "Api",
            &json!([
                {"providerState": 2, "description": 2, "foo": "wiffle"},
                {"providerState": 1, "description": 1, "foo": "bar"}
            ]),
        ),
    );

    let client = RecordingClient::new();
    let locations = vec![FileLocation::new(&first), FileLocation::new(&other), FileLocation::new(&second)];
    let report = PactPublisher::new(&client).publish_merged(&locations, "3.1.0");

    assert!(report.all_succeeded());
    assert_eq!(report.len(), 3);
    assert_eq!(report.outcomes()[2].location, second.display().to_string());
    let published = client.published_values();
    assert_eq!(published.len(), 2);
    assert_eq!(
        published[0],
        pact_json(
            "Web",
            "Api",
            &json!([
                {"providerState": 1, "description": 1, "foo": "bar"},
                {"providerState": 2, "description": 2, "foo": "wiffle"}
            ])
        )
    );
    assert_eq!(published[1]["provider"]["name"], "Billing");
    assert!(client.calls().iter().all(|call| call.consumer_version == "3.1.0"));
}

/// Tests a merge conflict fails every file of the pair and nothing else.
#[test]
fn merge_conflict_fails_only_its_pair() {
    let client = RecordingClient::new();
    let locations = vec![
        InlineLocation::new(
            "a.json",
            pact_json("Web", "Api", &json!([{"providerState": 1, "description": 1, "foo": "bar"}]))
                .to_string(),
        ),
        InlineLocation::new("b.json", pact_json("Web", "Billing", &json!([])).to_string()),
        InlineLocation::new(
            "c.json",
            pact_json("Web", "Api", &json!([{"providerState": 1, "description": 1, "foo": "different"}]))
                .to_string(),
        ),
    ];
    let report = PactPublisher::new(&client).publish_merged(&locations, "1.0.0");

    let results: Vec<bool> = report.outcomes().iter().map(|outcome| outcome.is_success()).collect();
    assert_eq!(results, vec![false, true, false]);
    for index in [0, 2] {
        let failure = report.outcomes()[index].failure().expect("failure");
        assert!(matches!(failure, PublishFailure::Merge(MergeError::Conflict(_))));
        let message = failure.to_string();
        assert!(message.contains("foo") && message.contains("different"), "{message}");
    }
    assert_eq!(client.calls().len(), 1);
}

/// Tests unreadable files fail alone during grouped publishing.
#[test]
fn merged_publishing_isolates_unreadable_files() {
    let dir = tempdir().expect("temp dir");
    let missing = dir.path().join("missing.json");
    let valid = write_pact(dir.path(), "ok.json", &pact_json("Web", "Api", &json!([])));

    let client = RecordingClient::new();
    let report = PactPublisher::new(&client)
        .publish_merged(&[FileLocation::new(&missing), FileLocation::new(&valid)], "1.0.0");

    assert!(!report.outcomes()[0].is_success());
    assert!(report.outcomes()[1].is_success());
    assert_eq!(client.calls().len(), 1);
}

/// Tests a pair with one pact publishes the raw file text verbatim.
#[test]
fn single_pact_pair_is_published_verbatim() {
    let raw = "{\n  \"consumer\": {\"name\": \"Web\"},\n  \"provider\": {\"name\": \"Api\"}\n}";
    let client = RecordingClient::new();
    let report =
        PactPublisher::new(&client).publish_merged(&[InlineLocation::new("only.json", raw)], "1.0.0");
    assert!(report.all_succeeded());
    assert_eq!(client.calls()[0].pact_json, raw);
}

/// Tests strict metadata merging is applied in grouped publishing.
#[test]
fn merged_publishing_honors_metadata_policy() {
    let client = RecordingClient::new();
    let mut first = pact_json("Web", "Api", &json!([]));
    first["metadata"] = json!({"pactSpecification": {"version": "2.0.0"}});
    let mut second = pact_json("Web", "Api", &json!([]));
    second["metadata"] = json!({"pactSpecification": {"version": "3.0.0"}});
    let locations = vec![
        InlineLocation::new("v2.json", first.to_string()),
        InlineLocation::new("v3.json", second.to_string()),
    ];

    let report = PactPublisher::new(&client)
        .with_merge_options(MergeOptions {
            metadata: MetadataPolicy::RejectMismatch,
        })
        .publish_merged(&locations, "1.0.0");

    assert!(report.outcomes().iter().all(|outcome| matches!(
        outcome.failure(),
        Some(PublishFailure::Merge(MergeError::MetadataMismatch { .. }))
    )));
    assert!(client.calls().is_empty());
}
