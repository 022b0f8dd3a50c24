use crate::{
    error::{err, Error},
    SignedDuration, NANOS_PER_SECOND,
};

/// An instant in time, represented as a signed count of nanoseconds since
/// the Unix epoch, `1970-01-01T00:00:00Z`.
///
/// The underlying counter is 128 bits wide and spans `±10^18` seconds
/// around the epoch, or roughly ±31 billion years. That is wide enough
/// that arithmetic on any civil time a caller can plausibly write down
/// never wraps; conversions that would land outside the range saturate at
/// [`Timestamp::MIN`] and [`Timestamp::MAX`] instead.
///
/// A `Timestamp` has no time zone. To get civil time fields out of one,
/// pair it with a [`TimeZone`](crate::TimeZone):
///
/// ```
/// use civtz::{Timestamp, TimeZone};
///
/// let bd = TimeZone::UTC.to_breakdown(Timestamp::UNIX_EPOCH);
/// assert_eq!((bd.year, bd.month, bd.day), (1970, 1, 1));
/// ```
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timestamp {
    nanos: i128,
}

impl Timestamp {
    /// The earliest representable instant: `-10^18` seconds before the
    /// Unix epoch.
    pub const MIN: Timestamp =
        Timestamp { nanos: -1_000_000_000_000_000_000 * NANOS_PER_SECOND };

    /// The latest representable instant: `10^18` seconds after the Unix
    /// epoch.
    pub const MAX: Timestamp =
        Timestamp { nanos: 1_000_000_000_000_000_000 * NANOS_PER_SECOND };

    /// The Unix epoch, `1970-01-01T00:00:00Z`.
    pub const UNIX_EPOCH: Timestamp = Timestamp { nanos: 0 };

    /// Creates a new timestamp from a number of seconds and additional
    /// nanoseconds relative to the Unix epoch.
    ///
    /// The nanosecond component may have either sign and any magnitude
    /// below one second; it is simply added to the seconds.
    ///
    /// # Errors
    ///
    /// This returns an error if `nanosecond` is not in the range
    /// `-999_999_999..=999_999_999`, or if the resulting instant is
    /// outside of `Timestamp::MIN..=Timestamp::MAX`.
    pub fn new(second: i64, nanosecond: i32) -> Result<Timestamp, Error> {
        if !(-999_999_999..=999_999_999).contains(&nanosecond) {
            return Err(err!(
                "nanosecond {nanosecond} is not in the required range of \
                 -999999999..=999999999",
            ));
        }
        let nanos =
            i128::from(second) * NANOS_PER_SECOND + i128::from(nanosecond);
        if nanos < Timestamp::MIN.nanos || nanos > Timestamp::MAX.nanos {
            return Err(err!(
                "timestamp with second {second} and nanosecond \
                 {nanosecond} is outside the representable range",
            ));
        }
        Ok(Timestamp { nanos })
    }

    /// Creates a new timestamp in a `const` context, panicking when the
    /// inputs are invalid.
    ///
    /// This is mainly useful for tests and constants where the value is
    /// known to be in range.
    pub const fn constant(second: i64, nanosecond: i32) -> Timestamp {
        if nanosecond <= -1_000_000_000 || nanosecond >= 1_000_000_000 {
            panic!("invalid nanosecond");
        }
        let nanos =
            second as i128 * NANOS_PER_SECOND + nanosecond as i128;
        if nanos < Timestamp::MIN.nanos || nanos > Timestamp::MAX.nanos {
            panic!("timestamp out of range");
        }
        Timestamp { nanos }
    }

    /// Creates a timestamp from a number of whole seconds since the Unix
    /// epoch, saturating at the representable bounds.
    pub(crate) fn from_second_saturating(second: i128) -> Timestamp {
        let second = second.clamp(
            -1_000_000_000_000_000_000,
            1_000_000_000_000_000_000,
        );
        Timestamp { nanos: second * NANOS_PER_SECOND }
    }

    /// Creates a timestamp from a number of nanoseconds since the Unix
    /// epoch, saturating at the representable bounds.
    pub(crate) fn from_nanosecond_saturating(nanos: i128) -> Timestamp {
        let nanos =
            nanos.clamp(Timestamp::MIN.nanos, Timestamp::MAX.nanos);
        Timestamp { nanos }
    }

    /// Returns the number of whole seconds from the Unix epoch to this
    /// timestamp, rounding toward negative infinity.
    ///
    /// Together with [`Timestamp::subsec_nanosecond`], this splits an
    /// instant into a second and a non-negative sub-second part.
    #[inline]
    pub fn as_second(self) -> i64 {
        // OK because |nanos| <= 10^27 implies |seconds| <= 10^18.
        i64::try_from(self.nanos.div_euclid(NANOS_PER_SECOND))
            .expect("floor seconds always fit in i64")
    }

    /// Returns the sub-second component of this timestamp, in nanoseconds,
    /// in the range `0..=999_999_999`.
    #[inline]
    pub fn subsec_nanosecond(self) -> i32 {
        // OK because rem_euclid of NANOS_PER_SECOND is < 10^9.
        i32::try_from(self.nanos.rem_euclid(NANOS_PER_SECOND))
            .expect("sub-second nanoseconds always fit in i32")
    }

    /// Returns this timestamp as a count of nanoseconds since the Unix
    /// epoch.
    #[inline]
    pub const fn as_nanosecond(self) -> i128 {
        self.nanos
    }

    /// Adds a signed duration to this timestamp.
    ///
    /// # Errors
    ///
    /// This returns an error when the result would be outside of
    /// `Timestamp::MIN..=Timestamp::MAX`.
    pub fn checked_add(
        self,
        duration: SignedDuration,
    ) -> Result<Timestamp, Error> {
        let nanos = self
            .nanos
            .checked_add(duration.as_nanos())
            .filter(|&n| {
                Timestamp::MIN.nanos <= n && n <= Timestamp::MAX.nanos
            })
            .ok_or_else(|| {
                err!("adding duration to timestamp overflowed")
            })?;
        Ok(Timestamp { nanos })
    }

    /// Subtracts a signed duration from this timestamp.
    ///
    /// # Errors
    ///
    /// This returns an error when the result would be outside of
    /// `Timestamp::MIN..=Timestamp::MAX`.
    pub fn checked_sub(
        self,
        duration: SignedDuration,
    ) -> Result<Timestamp, Error> {
        self.checked_add(-duration)
    }

    /// Adds a signed duration to this timestamp, saturating at the
    /// representable bounds instead of failing.
    pub fn saturating_add(self, duration: SignedDuration) -> Timestamp {
        let nanos =
            self.nanos.saturating_add(duration.as_nanos());
        Timestamp::from_nanosecond_saturating(nanos)
    }

    /// Subtracts a signed duration from this timestamp, saturating at the
    /// representable bounds instead of failing.
    pub fn saturating_sub(self, duration: SignedDuration) -> Timestamp {
        let nanos =
            self.nanos.saturating_sub(duration.as_nanos());
        Timestamp::from_nanosecond_saturating(nanos)
    }
}

/// Renders this timestamp as an RFC 3339 instant in UTC, e.g.
/// `2001-09-09T01:46:40Z`, with the fractional second trimmed of trailing
/// zeros.
impl core::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let string = crate::fmt::format(
            "%Y-%m-%dT%H:%M:%E*S",
            *self,
            &crate::TimeZone::UTC,
        );
        write!(f, "{string}Z")
    }
}

impl core::fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Timestamp {
    fn arbitrary(g: &mut quickcheck::Gen) -> Timestamp {
        // Stick to instants whose year fits in four digits or so. The
        // far reaches of the representable range are covered by targeted
        // saturation tests instead.
        let second = i64::arbitrary(g) % 250_000_000_000;
        let nanosecond = (i32::arbitrary(g) % 1_000_000_000).abs();
        Timestamp::new(second, nanosecond).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_is_floored() {
        let ts = Timestamp::constant(-1, -500_000_000);
        assert_eq!(ts.as_second(), -2);
        assert_eq!(ts.subsec_nanosecond(), 500_000_000);

        let ts = Timestamp::constant(1, 500_000_000);
        assert_eq!(ts.as_second(), 1);
        assert_eq!(ts.subsec_nanosecond(), 500_000_000);
    }

    #[test]
    fn arithmetic_saturates() {
        let ts = Timestamp::MAX
            .saturating_add(SignedDuration::from_secs(1));
        assert_eq!(ts, Timestamp::MAX);
        assert!(Timestamp::MAX
            .checked_add(SignedDuration::from_secs(1))
            .is_err());
        let ts = Timestamp::MIN
            .saturating_sub(SignedDuration::from_secs(1));
        assert_eq!(ts, Timestamp::MIN);
    }

    #[test]
    fn display_is_rfc3339() {
        let ts = Timestamp::constant(1_000_000_000, 0);
        assert_eq!(ts.to_string(), "2001-09-09T01:46:40Z");
        let ts = Timestamp::constant(1_000_000_000, 250_000_000);
        assert_eq!(ts.to_string(), "2001-09-09T01:46:40.25Z");
    }
}
