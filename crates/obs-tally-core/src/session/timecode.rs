//! Conversion between device timecodes (`HH:MM:SS[.mmm]`) and whole seconds.

use crate::{CoreError, CoreResult};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::debug;

const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Parse a timecode into whole seconds, rejecting anything malformed.
///
/// Milliseconds after the `.` are dropped. Exactly three `:`-separated
/// numeric fields are required; hours are unbounded.
#[track_caller]
pub fn try_parse(text: &str) -> CoreResult<u64> {
    let malformed = || CoreError::MalformedTimecode {
        input: text.to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    let whole = text.trim().split('.').next().unwrap_or_default();
    let mut fields = whole.split(':');

    let (Some(h), Some(m), Some(s), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(malformed());
    };

    let field = |part: &str| -> Option<u64> {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        part.parse().ok()
    };

    let (Some(hours), Some(minutes), Some(seconds)) = (field(h), field(m), field(s)) else {
        return Err(malformed());
    };

    hours
        .checked_mul(SECONDS_PER_HOUR)
        .and_then(|total| total.checked_add(minutes.checked_mul(SECONDS_PER_MINUTE)?))
        .and_then(|total| total.checked_add(seconds))
        .ok_or_else(malformed)
}

/// Parse a timecode into whole seconds, returning 0 for absent or malformed input.
pub fn parse(text: Option<&str>) -> u64 {
    let Some(text) = text else {
        return 0;
    };

    match try_parse(text) {
        Ok(seconds) => seconds,
        Err(e) => {
            debug!(error = %e, "Treating malformed timecode as zero");
            0
        }
    }
}

/// Format whole seconds as `HH:MM:SS`; negative input is clamped to zero.
pub fn format(seconds: i64) -> String {
    let total = seconds.max(0).unsigned_abs();
    format!(
        "{:02}:{:02}:{:02}",
        total / SECONDS_PER_HOUR,
        (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
        total % SECONDS_PER_MINUTE
    )
}

/// Format fractional seconds as `HH:MM:SS`, flooring the fraction.
pub fn format_fractional(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return format(0);
    }
    // `as` saturates for values beyond i64::MAX
    format(seconds.floor() as i64)
}
