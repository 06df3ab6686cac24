use crate::{NormalizedStatus, RawStatus, RecordingState, normalize};

/// WHAT: Active and paused maps to Paused
/// WHY: Paused takes priority over Recording
#[test]
fn given_active_paused_output_when_normalizing_then_paused() {
    // Given
    let raw = RawStatus::polled(true, true, "00:10:00.000");

    // When
    let status = normalize(&raw);

    // Then
    assert_eq!(status.state, RecordingState::Paused);
    assert_eq!(status.elapsed_seconds, 600);
}

/// WHAT: Active and not paused maps to Recording
/// WHY: Normal running recording
#[test]
fn given_active_output_when_normalizing_then_recording() {
    let status = normalize(&RawStatus::polled(true, false, "00:00:05.000"));
    assert_eq!(status.state, RecordingState::Recording);
    assert_eq!(status.elapsed_seconds, 5);
}

/// WHAT: Inactive output with a non-zero clock maps to Stopped
/// WHY: The just-finished recording's time is still worth displaying
#[test]
fn given_inactive_output_with_time_when_normalizing_then_stopped() {
    let status = normalize(&RawStatus::polled(false, false, "00:01:30.000"));
    assert_eq!(status.state, RecordingState::Stopped);
    assert!(status.has_recorded_time());
}

/// WHAT: Inactive output with a zero or missing clock maps to Idle
/// WHY: Nothing has been recorded
#[test]
fn given_inactive_output_without_time_when_normalizing_then_idle() {
    assert_eq!(
        normalize(&RawStatus::polled(false, false, "00:00:00.000")),
        NormalizedStatus {
            state: RecordingState::Idle,
            elapsed_seconds: 0
        }
    );
    assert_eq!(
        normalize(&RawStatus::pushed(false, false)).state,
        RecordingState::Idle
    );
}

/// WHAT: A GetRecordStatus payload deserializes into RawStatus
/// WHY: Field names follow the device's camelCase contract
#[test]
#[allow(clippy::unwrap_used)]
fn given_record_status_json_when_deserializing_then_fields_mapped() {
    // Given: A payload with extra fields the interpreter ignores
    let json = r#"{"outputActive":true,"outputPaused":false,"outputTimecode":"00:00:12.345","outputDuration":12345,"outputBytes":1024}"#;

    // When
    let raw: RawStatus = serde_json::from_str(json).unwrap();

    // Then
    assert_eq!(raw, RawStatus::polled(true, false, "00:00:12.345"));
}
