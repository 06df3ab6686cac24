use crate::{
    ConnectionState, RawStatus, RecordingSessionTracker, RecordingState, TotalTimeStore,
    tests::support::MemoryStore,
};

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

fn tracker_with(total: u64) -> (RecordingSessionTracker, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_total(total));
    (RecordingSessionTracker::new(store.clone()), store)
}

/// WHAT: A complete session is folded into the store exactly once
/// WHY: End-to-end accounting for the common case
#[test]
#[allow(clippy::unwrap_used)]
fn given_ninety_second_session_when_stopped_then_total_increases_by_ninety() {
    // Given
    let (mut tracker, store) = tracker_with(0);

    // When
    tracker.apply_snapshot(&RawStatus::pushed(true, false)).unwrap();
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:30.000"))
        .unwrap();
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:01:30.000"))
        .unwrap();
    let folded = tracker.apply_snapshot(&RawStatus::pushed(false, false)).unwrap();

    // Then
    assert_eq!(folded, 90);
    assert_eq!(store.load(), 90);
    assert_eq!(tracker.current_session_seconds(), 0);
    assert_eq!(tracker.display().total_seconds, 90);
    assert_eq!(tracker.display().state, RecordingState::Stopped);
}

/// WHAT: The displayed total includes the in-flight session
/// WHY: Users watch the total grow while recording
#[test]
#[allow(clippy::unwrap_used)]
fn given_active_session_when_polled_then_display_total_includes_current() {
    let (mut tracker, store) = tracker_with(100);

    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:20.000"))
        .unwrap();

    let display = tracker.display();
    assert_eq!(display.current_seconds, 20);
    assert_eq!(display.total_seconds, 120);
    assert_eq!(display.formatted_total_time(), "00:02:00");
    // Nothing persisted until the session ends
    assert_eq!(store.load(), 100);
}

/// WHAT: A final inactive poll after the stop event adds nothing
/// WHY: At-most-once folding across push and poll
#[test]
#[allow(clippy::unwrap_used)]
fn given_stop_event_when_final_poll_arrives_then_no_second_fold() {
    let (mut tracker, store) = tracker_with(0);
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:12.000"))
        .unwrap();
    tracker.apply_snapshot(&RawStatus::pushed(false, false)).unwrap();

    let folded = tracker
        .apply_snapshot(&RawStatus::polled(false, false, "00:00:12.000"))
        .unwrap();

    assert_eq!(folded, 0);
    assert_eq!(store.load(), 12);
}

/// WHAT: Losing the connection mid-session folds the last known seconds
/// WHY: Recorded time must survive an unexpected disconnect
#[test]
#[allow(clippy::unwrap_used)]
fn given_active_session_when_connection_lost_then_current_folded() {
    // Given
    let (mut tracker, store) = tracker_with(0);
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:30.000"))
        .unwrap();

    // When
    let folded = tracker.connection_lost().unwrap();

    // Then
    assert_eq!(folded, 30);
    assert_eq!(store.load(), 30);
    assert!(!tracker.session().is_active());

    // A second loss has nothing left to fold
    assert_eq!(tracker.connection_lost().unwrap(), 0);
    assert_eq!(store.load(), 30);
}

/// WHAT: Resetting while recording zeroes the total and drops pre-reset seconds
/// WHY: After a reset the total reflects only what is recorded afterwards
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_when_total_reset_then_only_later_seconds_counted() {
    // Given: 500 stored and 40 seconds into a recording
    let (mut tracker, store) = tracker_with(500);
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:40.000"))
        .unwrap();

    // When
    tracker.reset_total().unwrap();

    // Then
    assert_eq!(store.load(), 0);
    assert_eq!(tracker.display().total_seconds, 0);

    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:50.000"))
        .unwrap();
    assert_eq!(tracker.display().total_seconds, 10);
    tracker.apply_snapshot(&RawStatus::pushed(false, false)).unwrap();
    assert_eq!(store.load(), 10);
}

/// WHAT: A failed write keeps the seconds pending and retries them later
/// WHY: A transient storage error must not lose recorded time
#[test]
#[allow(clippy::unwrap_used)]
fn given_failing_store_when_session_ends_then_seconds_retried_on_next_snapshot() {
    // Given: The store rejects writes when the session ends
    let (mut tracker, store) = tracker_with(0);
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:01:30.000"))
        .unwrap();
    store.fail_writes(true);

    // When
    let result = tracker.apply_snapshot(&RawStatus::pushed(false, false));

    // Then: Seconds are shown as unsaved but still part of the total
    assert!(result.is_err());
    assert_eq!(store.load(), 0);
    assert_eq!(tracker.display().unsaved_seconds, 90);
    assert_eq!(tracker.display().total_seconds, 90);

    // And: The next snapshot retries once storage recovers
    store.fail_writes(false);
    let folded = tracker
        .apply_snapshot(&RawStatus::polled(false, false, "00:01:30.000"))
        .unwrap();
    assert_eq!(folded, 90);
    assert_eq!(store.load(), 90);
    assert_eq!(tracker.display().unsaved_seconds, 0);
}

/// WHAT: Manual adjustments clamp at zero and later folds add on top
/// WHY: Corrections and sessions share the same total
#[test]
#[allow(clippy::unwrap_used)]
fn given_negative_adjustment_when_session_folds_then_added_to_clamped_total() {
    let (mut tracker, store) = tracker_with(100);

    assert_eq!(tracker.adjust_total_by(-150).unwrap(), 0);
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:30.000"))
        .unwrap();
    tracker.apply_snapshot(&RawStatus::pushed(false, false)).unwrap();

    assert_eq!(store.load(), 30);
    assert_eq!(tracker.display().total_seconds, 30);
}

/// WHAT: A push event without a timecode keeps the last polled clock
/// WHY: Pause events must not blank the displayed duration
#[test]
#[allow(clippy::unwrap_used)]
fn given_polled_session_when_pause_event_arrives_then_clock_kept() {
    let (mut tracker, _store) = tracker_with(0);
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:20.000"))
        .unwrap();

    tracker.apply_snapshot(&RawStatus::pushed(true, true)).unwrap();

    let display = tracker.display();
    assert_eq!(display.state, RecordingState::Paused);
    assert_eq!(display.current_seconds, 20);
    assert_eq!(tracker.current_session_seconds(), 20);
}

/// WHAT: A start event shows a zero clock rather than the previous recording's
/// WHY: Each session's clock starts at zero
#[test]
#[allow(clippy::unwrap_used)]
fn given_stopped_recording_when_start_event_arrives_then_clock_zeroed() {
    let (mut tracker, _store) = tracker_with(0);
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:20.000"))
        .unwrap();
    tracker.apply_snapshot(&RawStatus::pushed(false, false)).unwrap();
    assert_eq!(tracker.display().current_seconds, 20);

    tracker.apply_snapshot(&RawStatus::pushed(true, false)).unwrap();

    assert_eq!(tracker.display().current_seconds, 0);
    assert_eq!(tracker.display().state, RecordingState::Recording);
}

/// WHAT: A poll failure extrapolates the clock for display but is never folded
/// WHY: The estimate is a guess; only device readings reach the total
#[test]
#[allow(clippy::unwrap_used)]
fn given_poll_failure_when_session_stops_then_estimate_not_folded() {
    // Given
    let (mut tracker, store) = tracker_with(0);
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:10.000"))
        .unwrap();

    // When: Polling fails five seconds later
    tracker.note_poll_failure(Instant::now() + Duration::from_secs(5));

    // Then: The display shows an estimate
    let display = tracker.display();
    assert!(display.estimated);
    assert_eq!(display.current_seconds, 15);

    // And: Only the device reading is folded
    tracker.apply_snapshot(&RawStatus::pushed(false, false)).unwrap();
    assert_eq!(store.load(), 10);
    assert!(!tracker.display().estimated);
}

/// WHAT: Poll failures while idle leave the display untouched
/// WHY: There is no running clock to extrapolate
#[test]
fn given_idle_tracker_when_poll_fails_then_no_estimate() {
    let (mut tracker, _store) = tracker_with(0);

    tracker.note_poll_failure(Instant::now() + Duration::from_secs(5));

    assert!(!tracker.display().estimated);
    assert_eq!(tracker.display().current_seconds, 0);
}

/// WHAT: Connection changes are published to subscribers
/// WHY: The tray reflects the control socket state
#[test]
fn given_subscriber_when_connection_changes_then_notified() {
    let (mut tracker, _store) = tracker_with(0);
    let mut display = tracker.subscribe();
    display.mark_unchanged();

    tracker.set_connection(ConnectionState::Connected {
        version: "30.2.0".to_string(),
    });

    assert!(display.has_changed().unwrap_or(false));
    assert_eq!(
        display.borrow().connection,
        ConnectionState::Connected {
            version: "30.2.0".to_string()
        }
    );
}

/// WHAT: An adjustment first retries unsaved seconds
/// WHY: Pending seconds are retried on commands as well as snapshots
#[test]
#[allow(clippy::unwrap_used)]
fn given_unsaved_seconds_when_adjusting_then_saved_before_adjustment() {
    // Given: 90 unsaved seconds
    let (mut tracker, store) = tracker_with(0);
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:01:30.000"))
        .unwrap();
    store.fail_writes(true);
    assert!(tracker.apply_snapshot(&RawStatus::pushed(false, false)).is_err());
    store.fail_writes(false);

    // When
    let total = tracker.adjust_total_by(-60).unwrap();

    // Then
    assert_eq!(total, 30);
    assert_eq!(store.load(), 30);
    assert_eq!(tracker.display().unsaved_seconds, 0);
}

/// WHAT: A recording still running after a reconnect is not counted twice
/// WHY: The seconds before the drop were already folded when the connection was lost
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_cut_by_connection_loss_when_it_resumes_and_stops_then_counted_once() {
    // Given: 30 seconds folded when the connection dropped
    let (mut tracker, store) = tracker_with(0);
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:30.000"))
        .unwrap();
    tracker.connection_lost().unwrap();
    assert_eq!(store.load(), 30);

    // When: The same recording is found at 45 seconds, then stops
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:45.000"))
        .unwrap();
    assert_eq!(tracker.display().total_seconds, 45);
    tracker.apply_snapshot(&RawStatus::pushed(false, false)).unwrap();

    // Then: One 45 second recording
    assert_eq!(store.load(), 45);
}

/// WHAT: A failed reset leaves unsaved and in-flight seconds in place
/// WHY: The stored total was not cleared, so nothing recorded may be dropped
#[test]
#[allow(clippy::unwrap_used)]
fn given_failing_store_when_reset_fails_then_session_and_unsaved_seconds_kept() {
    // Given: 20 unsaved seconds and a recording 40 seconds in
    let (mut tracker, store) = tracker_with(100);
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:20.000"))
        .unwrap();
    store.fail_writes(true);
    assert!(tracker.apply_snapshot(&RawStatus::pushed(false, false)).is_err());
    tracker
        .apply_snapshot(&RawStatus::polled(true, false, "00:00:40.000"))
        .ok();

    // When
    let result = tracker.reset_total();

    // Then
    assert!(result.is_err());
    assert_eq!(tracker.current_session_seconds(), 40);
    assert_eq!(tracker.display().unsaved_seconds, 20);
    assert_eq!(tracker.display().total_seconds, 160);

    // And the session still folds in full once the store recovers
    store.fail_writes(false);
    tracker.apply_snapshot(&RawStatus::pushed(false, false)).unwrap();
    assert_eq!(store.load(), 160);
}
