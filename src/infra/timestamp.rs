// ============================================================
// Layer 6 — Wall-Clock Timestamps
// ============================================================
// UTC timestamps for the event log, the "last trained" stat and
// the default model file name (ai-model-YYYY-MM-DD.json).
//
// Seconds since the Unix epoch are split into a day count and a
// time of day; the day count is converted to a proleptic
// Gregorian date with the days-from-civil inverse described in
// Howard Hinnant's "chrono-Compatible Low-Level Date Algorithms".

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

const SECS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    secs: u64,
}

impl Timestamp {
    /// Current time. A clock set before 1970 reads as the epoch.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self { secs }
    }

    #[cfg(test)]
    pub fn from_unix_secs(secs: u64) -> Self {
        Self { secs }
    }

    /// (year, month 1-12, day 1-31)
    pub fn civil_date(&self) -> (i64, u32, u32) {
        civil_from_days((self.secs / SECS_PER_DAY) as i64)
    }

    /// `YYYY-MM-DD`
    pub fn date(&self) -> String {
        let (y, m, d) = self.civil_date();
        format!("{y:04}-{m:02}-{d:02}")
    }

    /// `HH:MM:SS`
    pub fn time_of_day(&self) -> String {
        let s = self.secs % SECS_PER_DAY;
        format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} UTC", self.date(), self.time_of_day())
    }
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z   = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);                               // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365; // [0, 399]
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);             // [0, 365]
    let mp  = (5 * doy + 2) / 153;                                 // [0, 11]
    let d   = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m   = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let y   = yoe + era * 400 + i64::from(m <= 2);
    (y, m, d)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_is_1970_01_01() {
        let t = Timestamp::from_unix_secs(0);
        assert_eq!(t.date(), "1970-01-01");
        assert_eq!(t.time_of_day(), "00:00:00");
        assert_eq!(t.to_string(), "1970-01-01 00:00:00 UTC");
    }

    #[test]
    fn test_known_dates() {
        // 2000-02-29 12:34:56 UTC
        let t = Timestamp::from_unix_secs(951_827_696);
        assert_eq!(t.date(), "2000-02-29");
        assert_eq!(t.time_of_day(), "12:34:56");

        // 2024-12-31 23:59:59 UTC
        let t = Timestamp::from_unix_secs(1_735_689_599);
        assert_eq!(t.date(), "2024-12-31");
        assert_eq!(t.time_of_day(), "23:59:59");

        // one second later rolls the year
        let t = Timestamp::from_unix_secs(1_735_689_600);
        assert_eq!(t.civil_date(), (2025, 1, 1));
    }

    #[test]
    fn test_now_is_after_2020() {
        assert!(Timestamp::now().civil_date().0 >= 2020);
    }
}
