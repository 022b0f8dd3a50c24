use std::sync::Arc;

use crate::{
    civil::{self, Weekday},
    error::Error,
    tz::{db, system::TimeZoneSystem, Offset},
    util::abbrev::Abbreviation,
    SignedDuration, Timestamp,
};

/// A time zone: a set of rules for mapping between absolute instants and
/// civil (wall-clock) time in a geo-political region.
///
/// A `TimeZone` is a small value type that is cheap to clone; clones share
/// the underlying rules. The default value, [`TimeZone::UTC`], denotes
/// UTC.
///
/// Zones are usually obtained from [`TimeZone::get`] by name:
///
/// ```
/// use civtz::TimeZone;
///
/// let tz = TimeZone::get("UTC-08:00")?;
/// let ts = tz.to_timestamp(2015, 1, 2, 3, 4, 5);
/// let bd = tz.to_breakdown(ts);
/// assert_eq!((bd.year, bd.month, bd.day), (2015, 1, 2));
/// assert_eq!(bd.offset.seconds(), -8 * 60 * 60);
///
/// # Ok::<(), civtz::Error>(())
/// ```
///
/// # Equality
///
/// Two zones compare equal when they share the same underlying rules
/// object, not when their rules happen to coincide. UTC handles are all
/// equal to each other, and the loader caches by name, so loading the
/// same name twice yields equal zones.
///
/// # Supported backends
///
/// This crate ships two backends: a fixed offset from UTC (including
/// plain UTC), and the host's local time facilities under the name
/// `"localtime"`. Neither can ever classify a civil time as skipped or
/// repeated; a backend with full zone rules (e.g. one reading the IANA
/// database) would plug in at the same seam and report those through
/// [`TimeInfo`].
#[derive(Clone, Default)]
pub struct TimeZone {
    kind: Option<Arc<TimeZoneKind>>,
}

#[derive(Debug)]
enum TimeZoneKind {
    Fixed(TimeZoneFixed),
    System(TimeZoneSystem),
}

impl TimeZone {
    /// The UTC time zone.
    ///
    /// Its offset is zero and it never has any transitions.
    pub const UTC: TimeZone = TimeZone { kind: None };

    /// Returns the UTC time zone.
    pub fn utc() -> TimeZone {
        TimeZone::UTC
    }

    /// Returns a time zone with a fixed offset from UTC.
    ///
    /// A zero offset returns [`TimeZone::UTC`] itself.
    pub fn fixed(offset: Offset) -> TimeZone {
        if offset == Offset::UTC {
            return TimeZone::UTC;
        }
        let fixed = TimeZoneFixed::new(offset);
        TimeZone { kind: Some(Arc::new(TimeZoneKind::Fixed(fixed))) }
    }

    /// Returns a handle to the host's local time zone.
    pub(crate) fn new_system() -> TimeZone {
        let system = TimeZoneSystem::new();
        TimeZone { kind: Some(Arc::new(TimeZoneKind::System(system))) }
    }

    /// Loads the named zone.
    ///
    /// Recognized names are `""` and `"UTC"` for UTC, `"localtime"` for
    /// the host's local time zone, and fixed offsets spelled like
    /// `"UTC+05:30"`, `"UTC-8"` or `"UTC+0530"`. Loading the same name
    /// again returns a zone equal to the first.
    ///
    /// # Errors
    ///
    /// This returns an error when the name is not recognized. Callers
    /// that want the classic "fall back to UTC" behavior can use
    /// [`TimeZone::get_or_utc`].
    pub fn get(name: &str) -> Result<TimeZone, Error> {
        db::get(name)
    }

    /// Loads the named zone, falling back to UTC when the name is not
    /// recognized.
    ///
    /// The failure is logged at `warn` level, but is otherwise invisible
    /// to the caller.
    pub fn get_or_utc(name: &str) -> TimeZone {
        match TimeZone::get(name) {
            Ok(tz) => tz,
            Err(_err) => {
                warn!(
                    "failed to load time zone {name:?}, \
                     falling back to UTC: {_err}",
                );
                TimeZone::UTC
            }
        }
    }

    /// Returns the host's local time zone.
    ///
    /// On platforms without usable local time facilities, the zone
    /// behaves like UTC.
    pub fn system() -> TimeZone {
        TimeZone::get_or_utc("localtime")
    }

    /// Returns the civil time fields, weekday, day of year, offset and
    /// abbreviation for the given instant in this zone.
    pub fn to_breakdown(&self, timestamp: Timestamp) -> Breakdown {
        match self.kind.as_deref() {
            None => TimeZoneFixed::utc().to_breakdown(timestamp),
            Some(TimeZoneKind::Fixed(tz)) => tz.to_breakdown(timestamp),
            Some(TimeZoneKind::System(tz)) => tz.to_breakdown(timestamp),
        }
    }

    /// Converts civil time fields in this zone to an instant, with
    /// disambiguation data where the backend supports it.
    ///
    /// Out-of-range fields are normalized by carrying into the next
    /// wider field, and [`TimeInfo::normalized`] reports whether that
    /// happened. For example, October 32 normalizes to November 1:
    ///
    /// ```
    /// use civtz::TimeZone;
    ///
    /// let ti = TimeZone::UTC.to_time_info(2013, 10, 32, 8, 30, 0);
    /// assert!(ti.normalized);
    /// let bd = TimeZone::UTC.to_breakdown(ti.pre);
    /// assert_eq!((bd.month, bd.day), (11, 1));
    /// ```
    pub fn to_time_info(
        &self,
        year: i64,
        month: i32,
        day: i32,
        hour: i32,
        minute: i32,
        second: i32,
    ) -> TimeInfo {
        match self.kind.as_deref() {
            None => TimeZoneFixed::utc()
                .to_time_info(year, month, day, hour, minute, second),
            Some(TimeZoneKind::Fixed(tz)) => {
                tz.to_time_info(year, month, day, hour, minute, second)
            }
            Some(TimeZoneKind::System(tz)) => {
                tz.to_time_info(year, month, day, hour, minute, second)
            }
        }
    }

    /// Converts civil time fields in this zone to an instant.
    ///
    /// This is the `pre` instant of [`TimeZone::to_time_info`], which for
    /// a skipped or repeated civil time in a rules-aware backend is the
    /// answer computed with the pre-transition offset.
    pub fn to_timestamp(
        &self,
        year: i64,
        month: i32,
        day: i32,
        hour: i32,
        minute: i32,
        second: i32,
    ) -> Timestamp {
        self.to_time_info(year, month, day, hour, minute, second).pre
    }
}

impl Eq for TimeZone {}

impl PartialEq for TimeZone {
    fn eq(&self, rhs: &TimeZone) -> bool {
        match (&self.kind, &rhs.kind) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl core::fmt::Debug for TimeZone {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let field: &dyn core::fmt::Debug = match self.kind.as_deref() {
            None => &"UTC",
            Some(TimeZoneKind::Fixed(tz)) => tz,
            Some(TimeZoneKind::System(tz)) => tz,
        };
        f.debug_tuple("TimeZone").field(field).finish()
    }
}

/// A time zone backed by a fixed offset from UTC.
pub(crate) struct TimeZoneFixed {
    offset: Offset,
    abbreviation: Abbreviation,
}

impl TimeZoneFixed {
    pub(crate) fn new(offset: Offset) -> TimeZoneFixed {
        let abbreviation = if offset == Offset::UTC {
            Abbreviation::new("UTC")
        } else {
            offset.to_abbreviation()
        };
        TimeZoneFixed { offset, abbreviation }
    }

    pub(crate) fn utc() -> TimeZoneFixed {
        TimeZoneFixed::new(Offset::UTC)
    }

    pub(crate) fn to_breakdown(&self, timestamp: Timestamp) -> Breakdown {
        // Split into floor seconds and a non-negative sub-second.
        let second = timestamp.as_second();
        let subsec = SignedDuration::from_nanos(i128::from(
            timestamp.subsec_nanosecond(),
        ));

        let local = second + i64::from(self.offset.seconds());
        let days = local.div_euclid(86_400);
        let mut rest = local.rem_euclid(86_400);

        let (year, month, day) = civil::from_day_ordinal(days);
        let hour = rest / 3_600;
        rest %= 3_600;
        let (minute, sec) = (rest / 60, rest % 60);

        // The day of year is small even when the year itself is not.
        let yearday =
            (i128::from(days) - civil::day_ordinal(year, 1, 1) + 1) as i16;

        Breakdown {
            year,
            month,
            day,
            hour: hour as i8,
            minute: minute as i8,
            second: sec as i8,
            subsec,
            weekday: Weekday::from_day_ordinal(days),
            yearday,
            offset: self.offset,
            dst: false,
            abbreviation: self.abbreviation,
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
        let n = civil::normalize(
            year,
            i64::from(month),
            i64::from(day),
            i64::from(hour),
            i64::from(minute),
            i64::from(second),
        );
        let ordinal = civil::day_ordinal(n.year, n.month, n.day);
        let seconds = ((ordinal * 24 + i128::from(n.hour)) * 60
            + i128::from(n.minute))
            * 60
            + i128::from(n.second)
            - i128::from(self.offset.seconds());
        let ts = Timestamp::from_second_saturating(seconds);
        TimeInfo {
            kind: TimeInfoKind::Unique,
            pre: ts,
            trans: ts,
            post: ts,
            normalized: n.normalized,
        }
    }
}

impl core::fmt::Debug for TimeZoneFixed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_tuple("Fixed").field(&self.offset).finish()
    }
}

/// The civil time components of an instant in a particular time zone.
///
/// A breakdown is plain data. It does not identify an instant on its own;
/// rather than passing a `Breakdown` around, pass the [`Timestamp`] and
/// [`TimeZone`] it came from.
#[derive(Clone, Debug)]
pub struct Breakdown {
    /// The year. May be any `i64`; arithmetic that would exceed the range
    /// saturates rather than wrapping.
    pub year: i64,
    /// The month of the year, `1..=12`.
    pub month: i8,
    /// The day of the month, `1..=31`.
    pub day: i8,
    /// The hour of the day, `0..=23`.
    pub hour: i8,
    /// The minute of the hour, `0..=59`.
    pub minute: i8,
    /// The second of the minute, `0..=59`.
    pub second: i8,
    /// The sub-second remainder, always in `[0, 1s)`.
    pub subsec: SignedDuration,
    /// The day of the week.
    pub weekday: Weekday,
    /// The day of the year, `1..=366`.
    pub yearday: i16,
    /// Seconds east of UTC at this instant.
    pub offset: Offset,
    /// Whether the offset in effect is non-standard ("daylight saving").
    pub dst: bool,
    /// The time zone abbreviation, e.g. `"UTC"` or `"PST"`.
    pub abbreviation: Abbreviation,
}

/// The result of converting civil time fields to an instant in a time
/// zone.
///
/// A civil time does not always name a unique instant: around a forward
/// zone transition some civil times are skipped, and around a backward
/// one some occur twice. `TimeInfo` carries enough data to describe all
/// three cases:
///
/// * [`TimeInfoKind::Unique`]: `pre == trans == post`, the answer.
/// * [`TimeInfoKind::Skipped`]: the civil time fell in a gap. `pre` is
///   computed with the pre-transition offset, `post` with the
///   post-transition offset, and `trans` is the transition instant.
/// * [`TimeInfoKind::Repeated`]: the civil time occurred twice. `pre`
///   and `post` locate the two occurrences and `trans` the transition
///   between them.
///
/// The backends bundled with this crate cannot observe transitions and
/// always report `Unique`.
#[derive(Clone, Copy, Debug)]
pub struct TimeInfo {
    /// How the civil time mapped onto the timeline.
    pub kind: TimeInfoKind,
    /// The instant computed with the pre-transition offset.
    pub pre: Timestamp,
    /// The transition instant bracketing a gap or overlap.
    pub trans: Timestamp,
    /// The instant computed with the post-transition offset.
    pub post: Timestamp,
    /// True when any input field was out of its canonical range and was
    /// carried during conversion.
    pub normalized: bool,
}

/// Classifies how a civil time mapped onto the timeline in a zone.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeInfoKind {
    /// The civil time was singular.
    Unique,
    /// The civil time did not exist.
    Skipped,
    /// The civil time was ambiguous.
    Repeated,
}

#[cfg(test)]
mod tests {
    use crate::tz::offset;

    use super::*;

    #[test]
    fn epoch_breakdown() {
        let bd = TimeZone::UTC.to_breakdown(Timestamp::UNIX_EPOCH);
        assert_eq!(bd.year, 1970);
        assert_eq!(bd.month, 1);
        assert_eq!(bd.day, 1);
        assert_eq!((bd.hour, bd.minute, bd.second), (0, 0, 0));
        assert_eq!(bd.subsec, SignedDuration::ZERO);
        assert_eq!(bd.weekday, Weekday::Thursday);
        assert_eq!(bd.weekday.to_monday_one_offset(), 4);
        assert_eq!(bd.yearday, 1);
        assert_eq!(bd.offset, Offset::UTC);
        assert!(!bd.dst);
        assert_eq!(bd.abbreviation, "UTC");
    }

    #[test]
    fn negative_subsecond_split() {
        let ts = Timestamp::constant(0, 0)
            .saturating_sub(SignedDuration::from_nanos(1));
        let bd = TimeZone::UTC.to_breakdown(ts);
        assert_eq!((bd.year, bd.month, bd.day), (1969, 12, 31));
        assert_eq!((bd.hour, bd.minute, bd.second), (23, 59, 59));
        assert_eq!(bd.subsec, SignedDuration::from_nanos(999_999_999));
    }

    #[test]
    fn fixed_offset_roundtrip() {
        let tz = TimeZone::fixed(offset(-8));
        let ts = tz.to_timestamp(2015, 1, 2, 3, 4, 5);
        let bd = tz.to_breakdown(ts);
        assert_eq!(
            (bd.year, bd.month, bd.day, bd.hour, bd.minute, bd.second),
            (2015, 1, 2, 3, 4, 5),
        );
        assert_eq!(bd.abbreviation, "-08:00");
        // The same civil fields in UTC name an instant 8 hours earlier.
        let utc = TimeZone::UTC.to_timestamp(2015, 1, 2, 3, 4, 5);
        assert_eq!(
            ts,
            utc.saturating_add(SignedDuration::from_secs(8 * 3_600)),
        );
    }

    #[test]
    fn unique_time_info() {
        let ti = TimeZone::UTC.to_time_info(2011, 1, 1, 0, 0, 0);
        assert_eq!(ti.kind, TimeInfoKind::Unique);
        assert_eq!(ti.pre, ti.trans);
        assert_eq!(ti.pre, ti.post);
        assert!(!ti.normalized);
    }

    #[test]
    fn normalization_is_reported() {
        let ti = TimeZone::UTC.to_time_info(2013, 10, 32, 8, 30, 0);
        assert!(ti.normalized);
        let bd = TimeZone::UTC.to_breakdown(ti.pre);
        assert_eq!((bd.year, bd.month, bd.day), (2013, 11, 1));
    }

    #[test]
    fn huge_years_saturate() {
        let ti = TimeZone::UTC.to_time_info(i64::MAX, 1, 1, 0, 0, 0);
        assert_eq!(ti.pre, Timestamp::MAX);
        let ti = TimeZone::UTC.to_time_info(i64::MIN, 1, 1, 0, 0, 0);
        assert_eq!(ti.pre, Timestamp::MIN);
    }

    #[test]
    fn zone_identity() {
        assert_eq!(TimeZone::UTC, TimeZone::utc());
        assert_eq!(TimeZone::UTC, TimeZone::get("UTC").unwrap());
        let a = TimeZone::get("UTC-08:00").unwrap();
        let b = TimeZone::get("UTC-08:00").unwrap();
        assert_eq!(a, b);
        // Distinct allocations of the same rules are distinct zones.
        let c = TimeZone::fixed(offset(-8));
        assert_ne!(a, c);
    }

    quickcheck::quickcheck! {
        fn prop_normalize_idempotent(
            year: i32, month: i32, day: i32,
            hour: i32, minute: i32, second: i32
        ) -> bool {
            // The year walk is linear in the day count, so keep the test
            // fast in debug builds while still carrying across many
            // thousands of years.
            let day = day % 10_000_000;
            let tz = TimeZone::UTC;
            let ti =
                tz.to_time_info(i64::from(year), month, day, hour, minute, second);
            let bd = tz.to_breakdown(ti.pre);
            let canonical = (1..=12).contains(&bd.month)
                && (1..=31).contains(&bd.day)
                && (0..=23).contains(&bd.hour)
                && (0..=59).contains(&bd.minute)
                && (0..=59).contains(&bd.second);
            let again = tz.to_time_info(
                bd.year,
                i32::from(bd.month),
                i32::from(bd.day),
                i32::from(bd.hour),
                i32::from(bd.minute),
                i32::from(bd.second),
            );
            canonical && !again.normalized && again.pre == ti.pre
        }

        fn prop_epoch_roundtrip(
            year: i16, month: u8, day: u8,
            hour: u8, minute: u8, second: u8
        ) -> bool {
            let year = i64::from(year);
            let month = i64::from(month % 12) + 1;
            let day = i64::from(day)
                % crate::civil::days_in_month(year, month) + 1;
            let (hour, minute, second) =
                (i32::from(hour % 24), i32::from(minute % 60), i32::from(second % 60));
            let ts = TimeZone::UTC.to_timestamp(
                year, month as i32, day as i32, hour, minute, second,
            );
            let bd = TimeZone::UTC.to_breakdown(ts);
            bd.year == year
                && i64::from(bd.month) == month
                && i64::from(bd.day) == day
                && i32::from(bd.hour) == hour
                && i32::from(bd.minute) == minute
                && i32::from(bd.second) == second
        }
    }
}
