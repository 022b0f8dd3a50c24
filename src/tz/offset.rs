use crate::{
    error::{err, Error},
    util::abbrev::Abbreviation,
};

/// An offset from UTC, in seconds, for a particular instant in a
/// particular time zone.
///
/// Positive offsets are east of the prime meridian, negative offsets
/// west. Equivalently, `civil - offset = UTC` in all cases.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Offset {
    seconds: i32,
}

impl Offset {
    /// The offset of UTC, zero seconds.
    pub const UTC: Offset = Offset { seconds: 0 };

    /// The westernmost representable offset, one second shy of -24 hours.
    pub const MIN: Offset = Offset { seconds: -86_399 };

    /// The easternmost representable offset, one second shy of +24 hours.
    pub const MAX: Offset = Offset { seconds: 86_399 };

    /// Creates an offset from a number of seconds east of UTC.
    ///
    /// # Errors
    ///
    /// This returns an error if the offset is not in the range
    /// `-86_399..=86_399`.
    pub fn from_seconds(seconds: i32) -> Result<Offset, Error> {
        if seconds < Offset::MIN.seconds || seconds > Offset::MAX.seconds {
            return Err(err!(
                "offset of {seconds} seconds is not in the required \
                 range of -86399..=86399",
            ));
        }
        Ok(Offset { seconds })
    }

    /// Creates an offset from a number of hours in a `const` context,
    /// panicking when the value is out of `-23..=23`.
    pub const fn constant(hours: i8) -> Offset {
        if hours <= -24 || hours >= 24 {
            panic!("offset hours out of range");
        }
        Offset { seconds: hours as i32 * 3_600 }
    }

    /// Returns this offset as a number of seconds east of UTC.
    #[inline]
    pub fn seconds(self) -> i32 {
        self.seconds
    }

    /// Returns true when this offset is west of UTC.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.seconds < 0
    }

    /// Renders this offset as an abbreviation, e.g. `+05:30`.
    pub(crate) fn to_abbreviation(self) -> Abbreviation {
        use core::fmt::Write;

        let mut abbrev = Abbreviation::default();
        // Infallible: Abbreviation's writer truncates rather than errors.
        let _ = write!(abbrev, "{}", self);
        abbrev
    }
}

/// Renders this offset in `±HH:MM` form, with a trailing `:SS` when the
/// offset is not a whole number of minutes.
impl core::fmt::Display for Offset {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut secs = self.seconds;
        let sign = if secs < 0 {
            secs = -secs;
            '-'
        } else {
            '+'
        };
        write!(f, "{sign}{:02}:{:02}", secs / 3_600, (secs / 60) % 60)?;
        if secs % 60 != 0 {
            write!(f, ":{:02}", secs % 60)?;
        }
        Ok(())
    }
}

impl core::fmt::Debug for Offset {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Offset({})", self)
    }
}

/// Creates an offset from a number of hours in a `const` context.
///
/// This is a convenience free function for [`Offset::constant`], useful
/// for tersely constructing offsets known to be valid:
///
/// ```
/// use civtz::tz::offset;
///
/// assert_eq!(offset(-8).seconds(), -8 * 60 * 60);
/// ```
pub const fn offset(hours: i8) -> Offset {
    Offset::constant(hours)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(offset(0).to_string(), "+00:00");
        assert_eq!(offset(-8).to_string(), "-08:00");
        assert_eq!(
            Offset::from_seconds(5 * 3600 + 30 * 60).unwrap().to_string(),
            "+05:30",
        );
        assert_eq!(
            Offset::from_seconds(-(3600 + 59)).unwrap().to_string(),
            "-01:00:59",
        );
    }

    #[test]
    fn ranges() {
        assert!(Offset::from_seconds(86_400).is_err());
        assert!(Offset::from_seconds(-86_400).is_err());
        assert_eq!(Offset::from_seconds(86_399).unwrap(), Offset::MAX);
    }
}
