// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamps for audit rows.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::warn;

/// Format stored in `logs.created_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Produces `created_at` strings in a fixed local offset.
#[derive(Debug, Clone, Copy)]
pub struct AuditClock {
    offset: FixedOffset,
}

impl AuditClock {
    /// Falls back to UTC when the offset is out of range.
    pub fn from_offset_minutes(minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| {
            warn!(minutes, "audit UTC offset out of range, using UTC");
            Utc.fix()
        });
        Self { offset }
    }

    pub fn now(&self) -> String {
        self.format(Utc::now())
    }

    pub fn format(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn kuala_lumpur_offset_is_applied() {
        let clock = AuditClock::from_offset_minutes(480);
        let instant = Utc.with_ymd_and_hms(2025, 12, 31, 20, 15, 0).unwrap();
        assert_eq!(clock.format(instant), "2026-01-01 04:15:00");
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        let clock = AuditClock::from_offset_minutes(100_000);
        let instant = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(clock.format(instant), "2025-01-02 03:04:05");
    }

    #[test]
    fn now_parses_back() {
        let stamp = AuditClock::from_offset_minutes(0).now();
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT).is_ok());
    }
}
