// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::media::NoOpMediaTool;
use crate::test_helpers::{RemuxBehavior, ScriptedTool};
use tempfile::tempdir;
use tokio::sync::broadcast;

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn write_clip(dir: &Path) -> PathBuf {
    let path = dir.join("clip.mp4");
    std::fs::write(&path, b"original").unwrap();
    path
}

#[tokio::test]
async fn valid_file_is_validated_then_repaired() {
    let temp = tempdir().unwrap();
    let path = write_clip(temp.path());
    let (tx, mut rx) = broadcast::channel(100);
    let processor = PostProcessor::new(tx, Arc::new(ScriptedTool::valid()), true, true);

    let processed = processor.run(&path).await.unwrap();

    assert_eq!(processed.path, path);
    assert!(processed.repair.is_repaired());
    assert_eq!(std::fs::read(&path).unwrap(), b"remuxed:original");

    let events = drain(&mut rx);
    assert!(matches!(events[0], Event::Validating { .. }));
    assert!(matches!(events[1], Event::ValidateComplete { valid: true }));
    assert!(matches!(events[2], Event::Remuxing { .. }));
    assert!(matches!(events[3], Event::RemuxComplete { .. }));
    assert_eq!(events.len(), 4);
}

#[tokio::test]
async fn invalid_file_fails_and_is_discarded() {
    let temp = tempdir().unwrap();
    let path = write_clip(temp.path());
    let (tx, mut rx) = broadcast::channel(100);
    let tool = Arc::new(ScriptedTool::invalid("Invalid data found when processing input"));
    let processor = PostProcessor::new(tx, tool.clone(), true, true);

    let result = processor.run(&path).await;

    match result {
        Err(Error::Validation { diagnostic, .. }) => {
            assert!(diagnostic.contains("Invalid data"))
        }
        other => panic!("expected Validation error, got {other:?}"),
    }
    assert!(!path.exists(), "invalid file should be discarded");
    assert_eq!(tool.remux_calls(), 0);

    let events = drain(&mut rx);
    assert!(
        events
            .iter()
            .all(|e| !matches!(e, Event::Remuxing { .. }))
    );
    assert!(matches!(
        events.last(),
        Some(Event::ValidateComplete { valid: false })
    ));
}

#[tokio::test]
async fn invalid_file_is_kept_when_discard_disabled() {
    let temp = tempdir().unwrap();
    let path = write_clip(temp.path());
    let (tx, _rx) = broadcast::channel(100);
    let processor = PostProcessor::new(tx, Arc::new(ScriptedTool::invalid("bad")), false, true);

    assert!(processor.run(&path).await.is_err());
    assert_eq!(std::fs::read(&path).unwrap(), b"original");
}

#[tokio::test]
async fn remux_failure_is_not_fatal() {
    let temp = tempdir().unwrap();
    let path = write_clip(temp.path());
    let (tx, mut rx) = broadcast::channel(100);
    let tool = ScriptedTool::valid().with_remux(RemuxBehavior::FailWritingTemp("boom".into()));
    let processor = PostProcessor::new(tx, Arc::new(tool), true, true);

    let processed = processor.run(&path).await.unwrap();

    assert_eq!(
        processed.repair,
        RepairOutcome::Failed {
            reason: "boom".into()
        }
    );
    assert_eq!(std::fs::read(&path).unwrap(), b"original");
    assert!(matches!(
        drain(&mut rx).last(),
        Some(Event::RemuxFailed { .. })
    ));
}

#[tokio::test]
async fn disabled_repair_skips_remux() {
    let temp = tempdir().unwrap();
    let path = write_clip(temp.path());
    let (tx, mut rx) = broadcast::channel(100);
    let tool = Arc::new(ScriptedTool::valid());
    let processor = PostProcessor::new(tx, tool.clone(), true, false);

    let processed = processor.run(&path).await.unwrap();

    assert!(matches!(processed.repair, RepairOutcome::Unchanged { .. }));
    assert_eq!(tool.validate_calls(), 1);
    assert_eq!(tool.remux_calls(), 0);
    assert!(matches!(
        drain(&mut rx).last(),
        Some(Event::RemuxSkipped { .. })
    ));
}

#[tokio::test]
async fn missing_tool_makes_validation_terminal() {
    let temp = tempdir().unwrap();
    let path = write_clip(temp.path());
    let (tx, _rx) = broadcast::channel(100);
    let processor = PostProcessor::new(tx, Arc::new(NoOpMediaTool), true, true);

    let result = processor.run(&path).await;

    assert!(matches!(result, Err(Error::Validation { .. })));
    // Nothing proved the file bad, so it is left for the caller
    assert!(path.exists());
}

#[tokio::test]
async fn send_without_receivers_does_not_fail() {
    let temp = tempdir().unwrap();
    let path = write_clip(temp.path());
    let (tx, rx) = broadcast::channel(100);
    drop(rx);
    let processor = PostProcessor::new(tx, Arc::new(ScriptedTool::valid()), true, true);

    assert!(processor.run(&path).await.is_ok());
}
