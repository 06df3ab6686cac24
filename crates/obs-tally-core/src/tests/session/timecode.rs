use crate::{CoreError, timecode};

/// WHAT: Well-formed timecodes parse to H*3600 + M*60 + S
/// WHY: The device clock is the authoritative session duration
#[test]
fn given_hms_timecode_when_parsing_then_seconds_computed() {
    // Given/When/Then
    assert_eq!(timecode::parse(Some("00:00:00")), 0);
    assert_eq!(timecode::parse(Some("00:01:30")), 90);
    assert_eq!(timecode::parse(Some("01:01:01")), 3661);
    assert_eq!(timecode::parse(Some("123:00:05")), 442_805);
}

/// WHAT: Milliseconds are dropped, not rounded
/// WHY: obs-websocket reports `HH:MM:SS.mmm` and accounting is in whole seconds
#[test]
fn given_timecode_with_millis_when_parsing_then_fraction_dropped() {
    // Given: A timecode just short of the next second
    let text = "00:00:59.999";

    // When: Parsing it
    let seconds = timecode::parse(Some(text));

    // Then: The fraction is discarded
    assert_eq!(seconds, 59);
}

/// WHAT: Absent, empty and malformed input parse to zero
/// WHY: Parse failures are recovered at the boundary and never surfaced
#[test]
fn given_malformed_input_when_parsing_then_zero() {
    for input in [
        None,
        Some(""),
        Some("   "),
        Some("not-a-time"),
        Some("12:34"),
        Some("1:2:3:4"),
        Some("aa:bb:cc"),
        Some("-1:00:00"),
        Some("01::05"),
        Some("99999999999999999999:00:00"),
    ] {
        assert_eq!(timecode::parse(input), 0, "input {:?}", input);
    }
}

/// WHAT: try_parse reports malformed input as MalformedTimecode
/// WHY: Callers that care can distinguish a real zero from garbage
#[test]
fn given_garbage_when_try_parsing_then_malformed_timecode_error() {
    // Given/When
    let result = timecode::try_parse("not-a-time");

    // Then
    assert!(matches!(result, Err(CoreError::MalformedTimecode { .. })));
}

/// WHAT: Formatting zero-pads each field and never wraps hours
/// WHY: Totals across many sessions exceed 24 hours
#[test]
fn given_seconds_when_formatting_then_zero_padded_hms() {
    assert_eq!(timecode::format(0), "00:00:00");
    assert_eq!(timecode::format(3661), "01:01:01");
    assert_eq!(timecode::format(86_400), "24:00:00");
    assert_eq!(timecode::format(360_000), "100:00:00");
}

/// WHAT: Negative input formats as zero
/// WHY: Manual corrections must never display a negative clock
#[test]
fn given_negative_seconds_when_formatting_then_clamped_to_zero() {
    assert_eq!(timecode::format(-5), "00:00:00");
}

/// WHAT: Fractional seconds are floored
/// WHY: A clock must not show a second that has not elapsed yet
#[test]
fn given_fractional_seconds_when_formatting_then_floored() {
    assert_eq!(timecode::format_fractional(59.9), "00:00:59");
    assert_eq!(timecode::format_fractional(-0.5), "00:00:00");
    assert_eq!(timecode::format_fractional(f64::NAN), "00:00:00");
}

/// WHAT: format(parse(s)) reproduces the H/M/S fields of s
/// WHY: Display of a device timecode must match what the device reported
#[test]
fn given_valid_timecodes_when_round_tripping_then_hms_preserved() {
    for text in ["00:00:00", "00:00:07.250", "09:59:59", "47:12:03.001"] {
        let hms = text.split('.').next().unwrap_or_default();
        let seconds = timecode::parse(Some(text));
        assert_eq!(timecode::format(seconds as i64), hms);
    }
}
