#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use call_analyzer::{
    FailureKind, HeuristicEngine, Intent, MockProvider, Sentiment, Stage, StageTimeouts, Tone,
    Urgency,
};
use tokio_util::sync::CancellationToken;

use common::*;

#[tokio::test]
async fn test_offline_pipeline_end_to_end() {
    let tools = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = offline_pipeline(fake_tool(tools.path(), CONVERTING_TOOL), scratch.path());

    let result = pipeline
        .run(b"ID3 pretend mp3 bytes", Some("call.mp3"))
        .await
        .unwrap();

    assert_eq!(result.intent, Intent::BillingIssue);
    assert_eq!(result.sentiment, Sentiment::Positive);
    assert_eq!(result.tone, Tone::Cheerful);
    assert_eq!(result.urgency, Urgency::High);
    assert_eq!(result.summary, MockProvider::DEFAULT_TEXT);
    assert_eq!(result.important_phrases, Some(vec![]));
    assert!(result.agent_score.is_none());
    assert!(result.raw_response.is_none());
    assert_eq!(residue(scratch.path()), 0);
}

#[tokio::test]
async fn test_result_serializes_required_fields() {
    let tools = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = offline_pipeline(fake_tool(tools.path(), CONVERTING_TOOL), scratch.path());

    let result = pipeline.run(b"bytes", None).await.unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["intent"], "billing_issue");
    assert_eq!(json["sentiment"], "positive");
    assert_eq!(json["tone"], "cheerful");
    assert_eq!(json["urgency"], "high");
    assert!(json["summary"].is_string());
    assert!(json.get("agent_score").is_none());
    assert!(json.get("raw_response").is_none());
}

#[tokio::test]
async fn test_custom_transcript_drives_analysis() {
    let tools = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        fake_tool(tools.path(), CONVERTING_TOOL),
        scratch.path(),
        Arc::new(MockProvider::with_text(
            "I want to cancel my subscription. I am not happy with the service.",
        )),
        Arc::new(HeuristicEngine::default()),
        Default::default(),
    );

    let result = pipeline.run(b"bytes", Some("call.wav")).await.unwrap();
    assert_eq!(result.intent, Intent::CancelSubscription);
    assert_eq!(result.sentiment, Sentiment::Negative);
    assert_eq!(result.tone, Tone::Frustrated);
    assert_eq!(result.urgency, Urgency::Low);
}

#[tokio::test]
async fn test_missing_tool_fails_normalization() {
    let tools = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = offline_pipeline(tools.path().join("no-such-ffmpeg"), scratch.path());

    let err = pipeline.run(b"bytes", Some("call.mp3")).await.unwrap_err();
    assert_eq!(err.stage, Stage::Normalization);
    assert_eq!(err.kind, FailureKind::ToolUnavailable);
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("tool unavailable"));
    assert_eq!(residue(scratch.path()), 0);
}

#[tokio::test]
async fn test_rejected_input_fails_normalization() {
    let tools = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = offline_pipeline(fake_tool(tools.path(), REJECTING_TOOL), scratch.path());

    let err = pipeline.run(b"not audio", Some("notes.txt")).await.unwrap_err();
    assert_eq!(err.stage, Stage::Normalization);
    assert_eq!(err.kind, FailureKind::ConversionFailed);
    assert!(err.message.contains("Invalid data found"));
    assert_eq!(residue(scratch.path()), 0);
}

#[tokio::test]
async fn test_hung_tool_times_out() {
    let tools = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        fake_tool(tools.path(), HANGING_TOOL),
        scratch.path(),
        Arc::new(MockProvider::new()),
        Arc::new(HeuristicEngine::default()),
        timeouts(Duration::from_millis(300)),
    );

    let started = Instant::now();
    let err = pipeline.run(b"bytes", None).await.unwrap_err();

    assert_eq!(err.stage, Stage::Normalization);
    assert_eq!(err.kind, FailureKind::Timeout);
    assert!(err.is_retryable());
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(residue(scratch.path()), 0);
}

#[tokio::test]
async fn test_cancel_during_normalization() {
    let tools = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = offline_pipeline(fake_tool(tools.path(), HANGING_TOOL), scratch.path());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = pipeline
        .run_with_cancel(b"bytes", Some("call.ogg"), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Normalization);
    assert_eq!(err.kind, FailureKind::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(residue(scratch.path()), 0);
}

#[tokio::test]
async fn test_concurrent_requests_are_isolated() {
    let tools = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = Arc::new(offline_pipeline(
        fake_tool(tools.path(), CONVERTING_TOOL),
        scratch.path(),
    ));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                // Same original file name on every request
                pipeline
                    .run(format!("payload {}", i).as_bytes(), Some("call.mp3"))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.intent, Intent::BillingIssue);
    }
    assert_eq!(residue(scratch.path()), 0);
}

#[tokio::test]
async fn test_transcription_failure_releases_scratch() {
    let tools = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        fake_tool(tools.path(), CONVERTING_TOOL),
        scratch.path(),
        Arc::new(FailingTranscriber(FailureKind::Unreachable)),
        Arc::new(HeuristicEngine::default()),
        Default::default(),
    );

    let err = pipeline.run(b"bytes", Some("call.mp3")).await.unwrap_err();
    assert_eq!(err.stage, Stage::Transcription);
    assert_eq!(err.kind, FailureKind::Unreachable);
    assert!(err.is_retryable());
    assert_eq!(residue(scratch.path()), 0);
}

#[tokio::test]
async fn test_analysis_failure_releases_scratch() {
    let tools = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        fake_tool(tools.path(), CONVERTING_TOOL),
        scratch.path(),
        Arc::new(MockProvider::new()),
        Arc::new(FailingEngine(FailureKind::Unauthorized)),
        Default::default(),
    );

    let err = pipeline.run(b"bytes", Some("call.mp3")).await.unwrap_err();
    assert_eq!(err.stage, Stage::Analysis);
    assert_eq!(err.kind, FailureKind::Unauthorized);
    assert!(!err.is_retryable());
    assert_eq!(residue(scratch.path()), 0);
}

#[tokio::test]
async fn test_hung_transcription_times_out() {
    let tools = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        fake_tool(tools.path(), CONVERTING_TOOL),
        scratch.path(),
        Arc::new(HangingTranscriber),
        Arc::new(HeuristicEngine::default()),
        StageTimeouts {
            transcribe: Duration::from_millis(200),
            ..StageTimeouts::default()
        },
    );

    let started = Instant::now();
    let err = pipeline.run(b"bytes", None).await.unwrap_err();

    assert_eq!(err.stage, Stage::Transcription);
    assert_eq!(err.kind, FailureKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(residue(scratch.path()), 0);
}

#[tokio::test]
async fn test_hung_analysis_times_out() {
    let tools = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        fake_tool(tools.path(), CONVERTING_TOOL),
        scratch.path(),
        Arc::new(MockProvider::new()),
        Arc::new(HangingEngine),
        StageTimeouts {
            analyze: Duration::from_millis(200),
            ..StageTimeouts::default()
        },
    );

    let started = Instant::now();
    let err = pipeline.run(b"bytes", None).await.unwrap_err();

    assert_eq!(err.stage, Stage::Analysis);
    assert_eq!(err.kind, FailureKind::Timeout);
    assert!(err.is_retryable());
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(residue(scratch.path()), 0);
}

#[tokio::test]
async fn test_dropped_request_releases_scratch() {
    let tools = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = offline_pipeline(fake_tool(tools.path(), HANGING_TOOL), scratch.path());

    // The caller gives up mid-conversion, as a disconnected HTTP client does
    let outcome = tokio::time::timeout(
        Duration::from_millis(300),
        pipeline.run(b"bytes", Some("call.mp3")),
    )
    .await;

    assert!(outcome.is_err());
    assert_eq!(residue(scratch.path()), 0);
}
