use crate::{
    fmt::util::{parse_int, Decimal, DIGITS10, EXP10},
    sys,
    tz::{Breakdown, TimeZone},
    Timestamp, NANOS_PER_SECOND,
};

/// Formats `timestamp` in `tz` according to the given format string.
pub(crate) fn format(
    fmt: &[u8],
    timestamp: Timestamp,
    tz: &TimeZone,
) -> String {
    let bd = tz.to_breakdown(timestamp);
    let tm = to_tm(&bd);
    let formatter = Formatter {
        fmt,
        bd: &bd,
        tm,
        timestamp,
        out: String::with_capacity(fmt.len() * 2),
    };
    formatter.format()
}

/// Converts a breakdown to the host's `struct tm`, for the conversion
/// specifiers that are delegated to the host's `strftime`.
fn to_tm(bd: &Breakdown) -> sys::Tm {
    let mut tm = sys::Tm::zeroed();
    tm.tm_sec = i32::from(bd.second);
    tm.tm_min = i32::from(bd.minute);
    tm.tm_hour = i32::from(bd.hour);
    tm.tm_mday = i32::from(bd.day);
    tm.tm_mon = i32::from(bd.month) - 1;
    // Saturate the year in cases of over/underflow. %Y and %E4Y render
    // the real year themselves; this clipped value is only what host
    // specifiers like %D see.
    tm.tm_year = bd
        .year
        .saturating_sub(1900)
        .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    tm.tm_wday = i32::from(bd.weekday.to_sunday_zero_offset());
    tm.tm_yday = i32::from(bd.yearday) - 1;
    tm.tm_isdst = i32::from(bd.dst);
    tm
}

struct Formatter<'f, 'b> {
    fmt: &'f [u8],
    bd: &'b Breakdown,
    tm: sys::Tm,
    timestamp: Timestamp,
    out: String,
}

impl<'f, 'b> Formatter<'f, 'b> {
    /// A single left to right scan over the format string.
    ///
    /// Three disjoint windows span the format at all times: everything
    /// before `pending` has been rendered into the output, the bytes in
    /// `pending..cur` are known to need no custom handling (they will be
    /// forwarded to the host's `strftime` in one batch), and everything
    /// from `cur` on is unexamined.
    fn format(mut self) -> String {
        let f = self.fmt;
        let end = f.len();
        let mut pending = 0;
        let mut cur = 0;

        while cur != end {
            // Move cur to the next percent sign.
            let mut start = cur;
            while cur != end && f[cur] != b'%' {
                cur += 1;
            }

            // If the new pending text is all ordinary, copy it out.
            if cur != start && pending == start {
                self.push_bytes(&f[pending..cur]);
                pending = cur;
                start = cur;
            }

            // Span the sequential percent signs.
            let percent = cur;
            while cur != end && f[cur] == b'%' {
                cur += 1;
            }

            // If the new pending text is all percents, copy out one
            // percent for every matched pair, then skip those pairs.
            if cur != start && pending == start {
                let escaped = (cur - pending) / 2;
                self.push_bytes(&f[pending..pending + escaped]);
                pending += escaped * 2;
                // Also copy out a single trailing percent.
                if pending != cur && cur == end {
                    self.push_bytes(&f[pending..pending + 1]);
                    pending += 1;
                }
            }

            // Loop unless we have an unescaped percent.
            if cur == end || (cur - percent) % 2 == 0 {
                continue;
            }

            // Simple specifiers rendered without the host's help.
            if matches!(
                f[cur],
                b'Y' | b'm'
                    | b'd'
                    | b'e'
                    | b'H'
                    | b'M'
                    | b'S'
                    | b'z'
                    | b'Z'
                    | b's'
            ) {
                if pending != cur - 1 {
                    self.flush_to_host(pending, cur - 1);
                }
                match f[cur] {
                    // %Y renders the full year, sidestepping the clipped
                    // tm_year entirely.
                    b'Y' => self.push_decimal(&Decimal::new(self.bd.year, 0)),
                    b'm' => self.push_two_digits(i64::from(self.bd.month)),
                    b'd' | b'e' => {
                        let day = Decimal::two_digits(i64::from(self.bd.day));
                        let mut bytes = [0u8; 2];
                        bytes.copy_from_slice(day.as_bytes());
                        // %e is space padded, for Windows compatibility.
                        if f[cur] == b'e' && bytes[0] == b'0' {
                            bytes[0] = b' ';
                        }
                        self.push_bytes(&bytes);
                    }
                    b'H' => self.push_two_digits(i64::from(self.bd.hour)),
                    b'M' => self.push_two_digits(i64::from(self.bd.minute)),
                    b'S' => self.push_two_digits(i64::from(self.bd.second)),
                    b'z' => self.push_offset(None),
                    b'Z' => self.out.push_str(self.bd.abbreviation.as_str()),
                    b's' => {
                        let seconds = (self.timestamp.as_nanosecond()
                            / NANOS_PER_SECOND)
                            as i64;
                        self.push_decimal(&Decimal::new(seconds, 0));
                    }
                    _ => unreachable!("unexpected custom specifier"),
                }
                cur += 1;
                pending = cur;
                continue;
            }

            // Loop if there is no E modifier.
            if f[cur] != b'E' {
                continue;
            }
            cur += 1;
            if cur == end {
                continue;
            }

            if f[cur] == b'z' {
                // %Ez: RFC3339-compatible offset.
                if pending != cur - 2 {
                    self.flush_to_host(pending, cur - 2);
                }
                self.push_offset(Some(b':'));
                cur += 1;
                pending = cur;
            } else if f[cur] == b'*' && cur + 1 != end && f[cur + 1] == b'S' {
                // %E*S: seconds with full fractional precision, trailing
                // zeros trimmed.
                if pending != cur - 2 {
                    self.flush_to_host(pending, cur - 2);
                }
                self.push_two_digits(i64::from(self.bd.second));
                let nanos = self.bd.subsec.as_nanos() as i64;
                let frac = Decimal::new(nanos, 9);
                let digits = frac.as_bytes();
                let mut keep = digits.len();
                while keep > 0 && digits[keep - 1] == b'0' {
                    keep -= 1;
                }
                if keep > 0 {
                    self.out.push('.');
                    self.push_bytes(&digits[..keep]);
                }
                cur += 2;
                pending = cur;
            } else if f[cur] == b'4' && cur + 1 != end && f[cur + 1] == b'Y' {
                // %E4Y: the year padded to (at least) four characters,
                // sign included.
                if pending != cur - 2 {
                    self.flush_to_host(pending, cur - 2);
                }
                self.push_decimal(&Decimal::new(self.bd.year, 4));
                cur += 2;
                pending = cur;
            } else if f[cur].is_ascii_digit() {
                // Possibly %E#S.
                if let Some((n, used)) = parse_int(&f[cur..], 0, 0, 1024) {
                    if f.get(cur + used) == Some(&b'S') {
                        if pending != cur - 2 {
                            self.flush_to_host(pending, cur - 2);
                        }
                        self.push_seconds_with_precision(n as usize);
                        cur += used + 1;
                        pending = cur;
                    }
                }
                // Otherwise the %E<digits> stays pending for the host.
            }
        }

        // Render any remaining pending text.
        if pending != end {
            self.flush_to_host(pending, end);
        }
        self.out
    }

    /// %E#S: seconds followed by exactly `precision` fractional digits.
    fn push_seconds_with_precision(&mut self, precision: usize) {
        let precision = precision.min(DIGITS10);
        self.push_two_digits(i64::from(self.bd.second));
        if precision == 0 {
            return;
        }
        let nanos = self.bd.subsec.as_nanos() as i64;
        let scaled = if precision > 9 {
            nanos * EXP10[precision - 9]
        } else {
            nanos / EXP10[9 - precision]
        };
        self.out.push('.');
        self.push_decimal(&Decimal::new(scaled, precision));
    }

    /// Renders the offset as `±HHMM`, or `±HH:MM` with a separator.
    fn push_offset(&mut self, sep: Option<u8>) {
        let mut minutes = self.bd.offset.seconds() / 60;
        let sign = if minutes < 0 {
            minutes = -minutes;
            '-'
        } else {
            '+'
        };
        self.out.push(sign);
        self.push_two_digits(i64::from(minutes / 60));
        if let Some(sep) = sep {
            self.out.push(char::from(sep));
        }
        self.push_two_digits(i64::from(minutes % 60));
    }

    /// Forwards `fmt[start..end]` to the host's `strftime` in one batch.
    fn flush_to_host(&mut self, start: usize, end: usize) {
        let chunk = &self.fmt[start..end];
        let rendered = sys::format(chunk, &self.tm);
        self.out.push_str(&String::from_utf8_lossy(&rendered));
    }

    fn push_decimal(&mut self, decimal: &Decimal) {
        self.out.push_str(decimal.as_str());
    }

    fn push_two_digits(&mut self, value: i64) {
        self.push_decimal(&Decimal::two_digits(value));
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.out.push_str(&String::from_utf8_lossy(bytes));
    }
}

#[cfg(test)]
mod tests {
    use crate::{tz::offset, SignedDuration, TimeZone};

    use super::*;

    fn f(fmt: &str, ts: Timestamp, tz: &TimeZone) -> String {
        format(fmt.as_bytes(), ts, tz)
    }

    #[test]
    fn ok_format_basic() {
        let tz = TimeZone::fixed(offset(-8));
        let ts = tz.to_timestamp(2015, 1, 2, 3, 4, 5);
        insta::assert_snapshot!(
            f("%Y-%m-%d %H:%M:%S", ts, &tz),
            @"2015-01-02 03:04:05",
        );
        insta::assert_snapshot!(f("%Y-%m-%d", ts, &tz), @"2015-01-02");
        insta::assert_snapshot!(f("%H:%M:%S", ts, &tz), @"03:04:05");
    }

    #[test]
    fn ok_format_fractional() {
        let tz = TimeZone::UTC;
        let ts = tz.to_timestamp(2013, 1, 2, 3, 4, 5);
        insta::assert_snapshot!(f("%H:%M:%E3S", ts, &tz), @"03:04:05.000");
        insta::assert_snapshot!(f("%H:%M:%E0S", ts, &tz), @"03:04:05");
        insta::assert_snapshot!(f("%E*S", ts, &tz), @"05");

        let ts = ts.saturating_add(SignedDuration::from_nanos(6_500_000));
        insta::assert_snapshot!(f("%E*S", ts, &tz), @"05.0065");
        insta::assert_snapshot!(f("%E9S", ts, &tz), @"05.006500000");
        insta::assert_snapshot!(f("%E2S", ts, &tz), @"05.00");
        // Precision beyond nanoseconds is zero filled.
        insta::assert_snapshot!(f("%E12S", ts, &tz), @"05.006500000000");
        // And clamped at the width of the underlying counter.
        insta::assert_snapshot!(f("%E400S", ts, &tz), @"05.006500000000000000");
    }

    #[test]
    fn ok_format_years() {
        let utc = TimeZone::UTC;
        let at = |year| utc.to_timestamp(year, 1, 1, 0, 0, 0);
        insta::assert_snapshot!(f("%E4Y", at(-1), &utc), @"-001");
        insta::assert_snapshot!(f("%E4Y", at(0), &utc), @"0000");
        insta::assert_snapshot!(f("%E4Y", at(1970), &utc), @"1970");
        insta::assert_snapshot!(f("%E4Y", at(12345), &utc), @"12345");
        insta::assert_snapshot!(f("%Y", at(-25), &utc), @"-25");
        insta::assert_snapshot!(f("%Y", at(76), &utc), @"76");
    }

    #[test]
    fn ok_format_offsets() {
        let tz = TimeZone::get("UTC-08:00").unwrap();
        let ts = Timestamp::UNIX_EPOCH;
        insta::assert_snapshot!(f("%z", ts, &tz), @"-0800");
        insta::assert_snapshot!(f("%Ez", ts, &tz), @"-08:00");
        insta::assert_snapshot!(f("%Z", ts, &tz), @"-08:00");

        let tz = TimeZone::get("UTC+05:30").unwrap();
        insta::assert_snapshot!(f("%z", ts, &tz), @"+0530");
        insta::assert_snapshot!(f("%Ez", ts, &tz), @"+05:30");

        insta::assert_snapshot!(f("%z", ts, &TimeZone::UTC), @"+0000");
        insta::assert_snapshot!(f("%Z", ts, &TimeZone::UTC), @"UTC");
    }

    #[test]
    fn ok_format_epoch_seconds() {
        let utc = TimeZone::UTC;
        let ts = Timestamp::constant(1_000_000_000, 0);
        insta::assert_snapshot!(f("%s", ts, &utc), @"1000000000");
        // %s is zone independent.
        let lax = TimeZone::get("UTC-08:00").unwrap();
        insta::assert_snapshot!(f("%s", ts, &lax), @"1000000000");
        // And truncates toward zero, like the reference.
        let ts = Timestamp::constant(-1, 500_000_000);
        insta::assert_snapshot!(f("%s", ts, &utc), @"0");
    }

    #[test]
    fn ok_format_day_padding() {
        let utc = TimeZone::UTC;
        let ts = utc.to_timestamp(2024, 7, 9, 0, 0, 0);
        insta::assert_snapshot!(f("%d", ts, &utc), @"09");
        insta::assert_snapshot!(f("%e", ts, &utc), @" 9");
        let ts = utc.to_timestamp(2024, 7, 19, 0, 0, 0);
        insta::assert_snapshot!(f("%e", ts, &utc), @"19");
    }

    #[test]
    fn ok_format_percent_escapes() {
        let utc = TimeZone::UTC;
        let ts = Timestamp::UNIX_EPOCH;
        insta::assert_snapshot!(f("100%%", ts, &utc), @"100%");
        insta::assert_snapshot!(f("%%%H", ts, &utc), @"%00");
        insta::assert_snapshot!(f("%%H", ts, &utc), @"%H");
        insta::assert_snapshot!(f("%", ts, &utc), @"%");
        assert_eq!(f("", ts, &utc), "");
    }

    #[cfg(unix)]
    #[test]
    fn ok_format_host_delegation() {
        let utc = TimeZone::UTC;
        let ts = Timestamp::UNIX_EPOCH;
        // %a and %b go through the host in one batch; %e and %Y do not.
        insta::assert_snapshot!(
            f("%a %b %e %H:%M:%S %Y", ts, &utc),
            @"Thu Jan  1 00:00:00 1970",
        );
        insta::assert_snapshot!(f("%j", ts, &utc), @"001");
    }

    #[test]
    fn ok_format_wide_years() {
        let utc = TimeZone::UTC;
        let bd = utc.to_breakdown(Timestamp::MAX);
        let rendered = f("%Y", Timestamp::MAX, &utc);
        assert_eq!(rendered, bd.year.to_string());
        assert!(bd.year > 9999);
    }
}
