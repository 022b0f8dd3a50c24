/*!
`strftime`/`strptime` style formatting and parsing of instants.

[`format()`] renders a [`Timestamp`] as civil time in a [`TimeZone`],
and [`parse()`] maps text back to the instant it names. Both walk the
same directive grammar: a superset of POSIX `strftime(3)`, plus a few
extensions:

| Specifier | Example | Description |
| --------- | ------- | ----------- |
| `%Ez` | `-08:00` | RFC 3339 compatible numeric offset (`±HH:MM`). |
| `%E*S` | `05.25` | Seconds with full fractional precision, trailing zeros trimmed. |
| `%E#S` | `05.250` | Seconds with `#` digits of fractional precision. |
| `%E4Y` | `-001` | Years padded to four characters (`-999` ... `9999`). |

The specifiers `%Y %m %d %e %H %M %S %z %Z %s` and the extensions above
are handled natively. Everything else is forwarded to the host's
`strftime(3)`/`strptime(3)` in contiguous batches, so locale dependent
directives like `%A` and `%p` behave exactly as the platform's do.

Note that `%Y` produces as many characters as it takes to render the
year in full, and `%s` denotes integer seconds since the Unix epoch
independent of the supplied zone.

# Formatting

```
use civtz::{fmt, TimeZone};

let tz = TimeZone::get("UTC-08:00")?;
let ts = tz.to_timestamp(2015, 1, 2, 3, 4, 5);
assert_eq!(fmt::format("%Y-%m-%d %H:%M:%S", ts, &tz), "2015-01-02 03:04:05");
assert_eq!(fmt::format("%H:%M:%E3S", ts, &tz), "03:04:05.000");
assert_eq!(fmt::format("%Y-%m-%d %H:%M:%S %Ez", ts, &tz), "2015-01-02 03:04:05 -08:00");

# Ok::<(), civtz::Error>(())
```

# Parsing

Parsing is strict. Each numeric directive enforces its natural range, the
entire input must be consumed, and civil fields that would need
normalization (like September 31) are rejected rather than carried:

```
use civtz::{fmt, TimeZone};

let ts = fmt::parse("%Y-%m-%d %H:%M:%S", "2015-09-22 09:35:00", &TimeZone::UTC)?;
assert_eq!(ts.to_string(), "2015-09-22T09:35:00Z");

assert!(fmt::parse("%Y-%m-%d", "2013-10-32", &TimeZone::UTC).is_err());

# Ok::<(), civtz::Error>(())
```

Fields not named by the format default to `1970-01-01 00:00:00.0 +0000`.
A parsed `%z`/`%Ez` offset overrides the supplied zone; `%s` overrides
everything. A leap second `:60` is accepted and normalized to `:00` of
the following minute. Since [`parse()`] returns instants, it makes the most
sense to parse fully specified datetimes that include an offset.

[`Timestamp`]: crate::Timestamp
[`TimeZone`]: crate::TimeZone
*/

use crate::{
    error::{Error, ErrorContext},
    tz::TimeZone,
    Timestamp,
};

mod format;
mod parse;
mod util;

/// Formats the given instant in the given time zone according to the
/// format string.
///
/// See the [module documentation](self) for the directive grammar.
///
/// Formatting cannot fail for well-formed inputs: unknown directives are
/// forwarded to the host's `strftime`, which renders them however the
/// platform does.
///
/// # Example
///
/// ```
/// use civtz::{fmt, Timestamp, TimeZone};
///
/// let got = fmt::format("%Y-%m-%dT%H:%M:%S %Ez", Timestamp::UNIX_EPOCH, &TimeZone::UTC);
/// assert_eq!(got, "1970-01-01T00:00:00 +00:00");
/// ```
pub fn format(
    format: impl AsRef<str>,
    timestamp: Timestamp,
    tz: &TimeZone,
) -> String {
    self::format::format(format.as_ref().as_bytes(), timestamp, tz)
}

/// Parses the input according to the format string, producing the
/// instant the text names in the given time zone.
///
/// See the [module documentation](self) for the directive grammar and
/// the strictness rules.
///
/// # Errors
///
/// This returns an error when the input does not match the format
/// string, a numeric field is out of range, the input is not fully
/// consumed, or the parsed civil fields would require normalization.
///
/// # Example
///
/// ```
/// use civtz::{fmt, TimeZone};
///
/// let ts = fmt::parse("%s", "1000000000", &TimeZone::UTC)?;
/// assert_eq!(ts.to_string(), "2001-09-09T01:46:40Z");
///
/// # Ok::<(), civtz::Error>(())
/// ```
pub fn parse(
    format: impl AsRef<str>,
    input: impl AsRef<str>,
    tz: &TimeZone,
) -> Result<Timestamp, Error> {
    self::parse::parse(
        format.as_ref().as_bytes(),
        input.as_ref().as_bytes(),
        tz,
    )
    .context("strptime-style parsing failed")
}

#[cfg(test)]
mod tests {
    use crate::{Timestamp, TimeZone};

    #[test]
    fn public_parse_has_context() {
        let err = super::parse("%H", "99", &TimeZone::UTC).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @r###"strptime-style parsing failed: %H failed: failed to parse hour in the range 0..=23 at "99""###,
        );
    }

    #[test]
    fn format_then_parse_identifies_instant() {
        let tz = TimeZone::get("UTC+05:30").unwrap();
        let ts = Timestamp::constant(1_322_131_200, 0);
        let fmt = "%Y-%m-%d %H:%M:%S %Ez";
        let rendered = super::format(fmt, ts, &tz);
        let parsed = super::parse(fmt, &rendered, &tz).unwrap();
        assert_eq!(parsed, ts);
    }
}
