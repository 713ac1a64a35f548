use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use jiff::{Timestamp, Zoned};

/// Format a history timestamp for display in the local time zone, e.g.
/// "May 1, 2024, 10:30 AM". Unparsable input is shown verbatim.
pub fn format_timestamp(iso: &str) -> String {
    format_timestamp_in(iso, &TimeZone::system())
}

/// Like [`format_timestamp`] but in an explicit zone.
///
/// Timestamps without an offset are taken as UTC, which is what the backend
/// stores.
pub fn format_timestamp_in(iso: &str, tz: &TimeZone) -> String {
    match parse_timestamp(iso) {
        Some(ts) => Zoned::new(ts, tz.clone())
            .strftime("%B %-d, %Y, %I:%M %p")
            .to_string(),
        None => iso.to_string(),
    }
}

fn parse_timestamp(iso: &str) -> Option<Timestamp> {
    let iso = iso.trim();
    if let Ok(ts) = iso.parse::<Timestamp>() {
        return Some(ts);
    }
    iso.parse::<DateTime>()
        .ok()
        .and_then(|dt| dt.to_zoned(TimeZone::UTC).ok())
        .map(|z| z.timestamp())
}
