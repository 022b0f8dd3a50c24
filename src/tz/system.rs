use crate::{
    civil::Weekday,
    sys,
    tz::{
        timezone::{TimeInfo, TimeInfoKind, TimeZoneFixed},
        Breakdown, Offset,
    },
    util::abbrev::Abbreviation,
    SignedDuration, Timestamp,
};

/// A time zone backed by the host's local time facilities, i.e.
/// `localtime_r(3)` and `mktime(3)`.
///
/// The host owns the rules, so this backend cannot diagnose skipped or
/// repeated civil times; `mktime` picks an interpretation and that is the
/// answer. When the host cannot convert at all (an instant outside the
/// practical `time_t` range, or a platform without local time support),
/// conversions degrade to UTC.
pub(crate) struct TimeZoneSystem {
    // All state lives in the host.
}

impl TimeZoneSystem {
    pub(crate) fn new() -> TimeZoneSystem {
        TimeZoneSystem {}
    }

    pub(crate) fn to_breakdown(&self, timestamp: Timestamp) -> Breakdown {
        let second = timestamp.as_second();
        let subsec = SignedDuration::from_nanos(i128::from(
            timestamp.subsec_nanosecond(),
        ));

        let Some(tm) = sys::localtime(second) else {
            debug!(
                "host local time conversion failed for second {second}, \
                 falling back to UTC",
            );
            return TimeZoneFixed::utc().to_breakdown(timestamp);
        };

        // tm_gmtoff is always a sane sub-day quantity when localtime_r
        // succeeds.
        let offset = Offset::from_seconds(tm.tm_gmtoff as i32)
            .unwrap_or(Offset::UTC);

        Breakdown {
            year: i64::from(tm.tm_year) + 1900,
            month: (tm.tm_mon + 1) as i8,
            day: tm.tm_mday as i8,
            hour: tm.tm_hour as i8,
            minute: tm.tm_min as i8,
            second: tm.tm_sec as i8,
            subsec,
            weekday: Weekday::from_tm_wday(tm.tm_wday),
            yearday: (tm.tm_yday + 1) as i16,
            offset,
            dst: tm.tm_isdst > 0,
            abbreviation: Abbreviation::new(tm.zone().unwrap_or("")),
        }
    }

    pub(crate) fn to_time_info(
        &self,
        year: i64,
        month: i32,
        day: i32,
        hour: i32,
        minute: i32,
        second: i32,
    ) -> TimeInfo {
        let want_year = year.saturating_sub(1900);
        let want_month = month.saturating_sub(1);

        let mut tm = sys::Tm::zeroed();
        tm.tm_year =
            want_year.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        tm.tm_mon = want_month;
        tm.tm_mday = day;
        tm.tm_hour = hour;
        tm.tm_min = minute;
        tm.tm_sec = second;
        // Let the host pick standard or daylight time itself.
        tm.tm_isdst = -1;

        let Some(t) = sys::make_time(&mut tm) else {
            return TimeZoneFixed::utc()
                .to_time_info(year, month, day, hour, minute, second);
        };

        // mktime normalizes the fields in place. Any change means the
        // input was not a canonical civil time (including years clipped
        // on the way into the host's int-width year).
        let normalized = i64::from(tm.tm_year) != want_year
            || tm.tm_mon != want_month
            || tm.tm_mday != day
            || tm.tm_hour != hour
            || tm.tm_min != minute
            || tm.tm_sec != second;

        let ts = Timestamp::from_second_saturating(i128::from(t));
        TimeInfo {
            kind: TimeInfoKind::Unique,
            pre: ts,
            trans: ts,
            post: ts,
            normalized,
        }
    }
}

impl core::fmt::Debug for TimeZoneSystem {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("System")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use crate::TimeZone;

    #[test]
    fn breakdown_fields_are_canonical() {
        let tz = TimeZone::system();
        let bd = tz.to_breakdown(crate::Timestamp::UNIX_EPOCH);
        assert!((1..=12).contains(&bd.month));
        assert!((1..=31).contains(&bd.day));
        assert!((0..=23).contains(&bd.hour));
        assert!((0..=59).contains(&bd.minute));
        assert!((0..=59).contains(&bd.second));
        assert!((1..=366).contains(&bd.yearday));
    }

    #[test]
    fn make_time_rejects_impossible_dates() {
        let tz = TimeZone::system();
        // Whatever the host zone is, February 30th does not exist.
        let ti = tz.to_time_info(2023, 2, 30, 12, 0, 0);
        assert!(ti.normalized);
    }
}
