//! Business-hours evaluation in a fixed civil time zone.
//!
//! The support desk runs on Bangkok time (UTC+7, no DST). A fallback that
//! lands inside the staffed window gets the short reply; anything outside
//! gets the long reply that spells out the operating hours.

use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Wall-clock reading in the business time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CivilTime {
    /// Day of week, 0 = Sunday .. 6 = Saturday.
    pub weekday: u32,
    /// Hour of day, 0..=23.
    pub hour: u32,
    /// Minute of hour, 0..=59.
    pub minute: u32,
}

impl CivilTime {
    /// `hour + minute / 60`.
    pub fn fractional_hour(&self) -> f64 {
        f64::from(self.hour) + f64::from(self.minute) / 60.0
    }

    /// Whether this reading falls on a Sunday.
    pub fn is_sunday(&self) -> bool {
        self.weekday == 0
    }
}

/// Staffed-hours window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusinessHours {
    zone: Tz,
    opens_at: f64,
    closes_at: f64,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            zone: chrono_tz::Asia::Bangkok,
            opens_at: 9.0,
            closes_at: 18.0,
        }
    }
}

impl BusinessHours {
    /// Window `[opens_at, closes_at)` in fractional hours, evaluated in `zone`.
    pub fn new(zone: Tz, opens_at: f64, closes_at: f64) -> Self {
        Self {
            zone,
            opens_at,
            closes_at,
        }
    }

    /// The civil time zone used for evaluation.
    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Convert an instant to local time in the business zone.
    pub fn localize(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        now.with_timezone(&self.zone)
    }

    /// Day-of-week, hour and minute of `now` in the business zone.
    pub fn civil_time(&self, now: DateTime<Utc>) -> CivilTime {
        let local = self.localize(now);
        CivilTime {
            weekday: local.weekday().num_days_from_sunday(),
            hour: local.hour(),
            minute: local.minute(),
        }
    }

    /// Opening and closing hour for a given day of week.
    ///
    /// Sunday and Monday-Saturday share one window. The published hours for
    /// Monday-Saturday run until midnight, but replies switch to the
    /// after-hours text at the same closing hour every day.
    pub fn window_for(&self, _weekday: u32) -> (f64, f64) {
        (self.opens_at, self.closes_at)
    }

    /// Whether `now` falls inside the staffed window.
    pub fn is_within(&self, now: DateTime<Utc>) -> bool {
        let civil = self.civil_time(now);
        let h = civil.fractional_hour();
        let (opens, closes) = self.window_for(civil.weekday);

        debug!(
            local_time = %self.localize(now).format("%Y-%m-%d %H:%M:%S"),
            day = civil.weekday,
            hour = civil.hour,
            minute = civil.minute,
            "Evaluating business hours"
        );

        h >= opens && h < closes
    }
}

/// ISO-8601 rendering of `now` in `zone`, millisecond precision with offset.
///
/// e.g. `2024-03-10T14:30:00.000+07:00`
pub fn civil_time_iso_string(now: DateTime<Utc>, zone: Tz) -> String {
    now.with_timezone(&zone)
        .to_rfc3339_opts(SecondsFormat::Millis, false)
}
