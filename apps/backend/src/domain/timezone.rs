//! Fixed local timezone: `US/Pacific` from the tz database.
//!
//! Wall-clock inputs inside a skipped spring hour or a repeated autumn hour
//! resolve to standard time.

use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

const ZONE: Tz = chrono_tz::US::Pacific;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[weekday repr:short],[month repr:short] [day padding:none]");
const CLOCK_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour repr:12 padding:none]:[minute] [period]");

fn naive_from_unix(seconds: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp(seconds, 0).map(|utc| utc.naive_utc())
}

fn to_offset(seconds: i64) -> Option<UtcOffset> {
    UtcOffset::from_whole_seconds(i32::try_from(seconds).ok()?).ok()
}

/// UTC offset in effect at `instant`.
///
/// Instants outside the tz database's range keep UTC.
pub fn offset_at(instant: OffsetDateTime) -> UtcOffset {
    naive_from_unix(instant.unix_timestamp())
        .map(|utc| ZONE.offset_from_utc_datetime(&utc).fix().local_minus_utc())
        .and_then(|seconds| to_offset(i64::from(seconds)))
        .unwrap_or(UtcOffset::UTC)
}

pub fn to_local(instant: OffsetDateTime) -> OffsetDateTime {
    instant.to_offset(offset_at(instant))
}

fn local_offset(wall: NaiveDateTime) -> Option<UtcOffset> {
    let seconds = match ZONE.from_local_datetime(&wall) {
        LocalResult::Single(local) => i64::from(local.offset().fix().local_minus_utc()),
        LocalResult::Ambiguous(first, second) => {
            let standard = if first.offset().dst_offset().num_seconds() == 0 {
                first
            } else {
                second
            };
            i64::from(standard.offset().fix().local_minus_utc())
        }
        // Gap: standard offset of the zone around that wall time
        LocalResult::None => ZONE
            .offset_from_utc_datetime(&wall)
            .base_utc_offset()
            .num_seconds(),
    };
    to_offset(seconds)
}

/// Attach the local offset to a wall-clock time and normalise to UTC.
pub fn from_local(wall: PrimitiveDateTime) -> OffsetDateTime {
    let offset = naive_from_unix(wall.assume_utc().unix_timestamp())
        .and_then(local_offset)
        .unwrap_or(UtcOffset::UTC);
    wall.assume_offset(offset).to_offset(UtcOffset::UTC)
}

/// `"Sat,Oct 14"`
pub fn format_date(instant: OffsetDateTime) -> Result<String, time::error::Format> {
    to_local(instant).format(DATE_FORMAT)
}

/// `"7:30 PM"`
pub fn format_clock(instant: OffsetDateTime) -> Result<String, time::error::Format> {
    to_local(instant).format(CLOCK_FORMAT)
}
