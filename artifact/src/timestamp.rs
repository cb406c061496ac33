//! UTC timestamps for manifests and archive entries.
//!
//! [`format_now`] is the only way writers stamp a manifest, so every
//! manifest carries the same `YYYY-MM-DDThh:mm:ss.mmmZ` shape. The civil
//! date conversions also translate between filesystem modification times
//! and the broken-down date/time fields zip entries store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A manifest construction timestamp.
///
/// Stored as an opaque string; manifests from older writers are carried
/// forward verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Constructed(String);

impl Constructed {
    /// Wrap an existing timestamp string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Stamp the current time using [`format_now`].
    #[must_use]
    pub fn now() -> Self {
        Self(format_now())
    }

    /// Return the timestamp as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Constructed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Broken-down UTC date and time with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilTime {
    /// Calendar year.
    pub year: i64,
    /// Month, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
    /// Hour, 0-23.
    pub hour: u32,
    /// Minute, 0-59.
    pub minute: u32,
    /// Second, 0-59.
    pub second: u32,
    /// Millisecond, 0-999.
    pub millis: u32,
}

impl CivilTime {
    /// Break down milliseconds since the Unix epoch.
    #[must_use]
    pub fn from_epoch_millis(epoch_millis: i64) -> Self {
        let days = epoch_millis.div_euclid(MILLIS_PER_DAY);
        let day_millis = epoch_millis.rem_euclid(MILLIS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        let secs = day_millis / 1_000;
        Self {
            year,
            month,
            day,
            hour: narrow(secs / 3_600),
            minute: narrow((secs % 3_600) / 60),
            second: narrow(secs % 60),
            millis: narrow(day_millis % 1_000),
        }
    }

    /// Return milliseconds since the Unix epoch.
    #[must_use]
    pub fn to_epoch_millis(self) -> i64 {
        let days = days_from_civil(self.year, self.month, self.day);
        let secs = i64::from(self.hour) * 3_600 + i64::from(self.minute) * 60 + i64::from(self.second);
        days * MILLIS_PER_DAY + secs * 1_000 + i64::from(self.millis)
    }
}

impl fmt::Display for CivilTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.millis
        )
    }
}

/// Format the current UTC time as `YYYY-MM-DDThh:mm:ss.mmmZ`.
///
/// A clock set before 1970 formats as the epoch.
#[must_use]
pub fn format_now() -> String {
    format_epoch_millis(system_time_millis(SystemTime::now()).unwrap_or_default())
}

/// Format milliseconds since the Unix epoch as `YYYY-MM-DDThh:mm:ss.mmmZ`.
///
/// # Examples
///
/// ```
/// use avail_artifact::timestamp::format_epoch_millis;
///
/// assert_eq!(format_epoch_millis(0), "1970-01-01T00:00:00.000Z");
/// ```
#[must_use]
pub fn format_epoch_millis(epoch_millis: i64) -> String {
    CivilTime::from_epoch_millis(epoch_millis).to_string()
}

/// Convert a [`SystemTime`] to milliseconds since the Unix epoch.
///
/// Returns `None` for times before the epoch or beyond `i64` range.
#[must_use]
pub fn system_time_millis(time: SystemTime) -> Option<i64> {
    let elapsed = time.duration_since(UNIX_EPOCH).ok()?;
    i64::try_from(elapsed.as_millis()).ok()
}

/// Convert epoch milliseconds to a zip entry timestamp.
///
/// Zip stores local date/time fields with two-second precision between
/// 1980 and 2107; times outside that window yield `None`.
pub(crate) fn to_zip_datetime(epoch_millis: i64) -> Option<zip::DateTime> {
    let civil = CivilTime::from_epoch_millis(epoch_millis);
    zip::DateTime::from_date_and_time(
        u16::try_from(civil.year).ok()?,
        u8::try_from(civil.month).ok()?,
        u8::try_from(civil.day).ok()?,
        u8::try_from(civil.hour).ok()?,
        u8::try_from(civil.minute).ok()?,
        u8::try_from(civil.second).ok()?,
    )
    .ok()
}

/// Convert a zip entry timestamp to epoch milliseconds.
pub(crate) fn from_zip_datetime(stamp: zip::DateTime) -> i64 {
    CivilTime {
        year: i64::from(stamp.year()),
        month: u32::from(stamp.month()),
        day: u32::from(stamp.day()),
        hour: u32::from(stamp.hour()),
        minute: u32::from(stamp.minute()),
        second: u32::from(stamp.second()),
        millis: 0,
    }
    .to_epoch_millis()
}

/// Narrow a value already reduced into a small range.
fn narrow(value: i64) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

/// Convert days since the Unix epoch into a `(year, month, day)` triple.
///
/// Howard Hinnant's public domain `civil_from_days` algorithm.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, narrow(month), narrow(day))
}

/// Inverse of [`civil_from_days`].
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let month = i64::from(month);
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let yoe = year.rem_euclid(400);
    let mp = if month > 2 { month - 3 } else { month + 9 };
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}
