//! Event collection and assertions for integration tests

use media_acquire::{Event, Stage};
use tokio::sync::broadcast;

/// Collect every event already sent on `rx`
pub fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Stages in the order their attempts started
pub fn attempted_stages(events: &[Event]) -> Vec<Stage> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::AttemptStarted { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect()
}

/// Assert the last event is a terminal `Complete`
pub fn assert_completed(events: &[Event]) {
    match events.last() {
        Some(Event::Complete { .. }) => {}
        other => panic!("expected Complete as final event, got {:?}", other),
    }
}

/// Assert the last event is a terminal `Failed` and return its message
pub fn assert_failed(events: &[Event]) -> String {
    match events.last() {
        Some(Event::Failed { error }) => error.clone(),
        other => panic!("expected Failed as final event, got {:?}", other),
    }
}
