use crate::{
    error::{err, Error, ErrorContext},
    fmt::util::{parse_int, EXP10},
    sys,
    tz::TimeZone,
    util::escape::{Byte, Bytes},
    SignedDuration, Timestamp,
};

/// Parses `input` against the given format string, producing the instant
/// the text names in `tz`.
pub(crate) fn parse(
    fmt: &[u8],
    input: &[u8],
    tz: &TimeZone,
) -> Result<Timestamp, Error> {
    Parser::new(fmt, input).parse(tz)
}

struct Parser<'f, 'i> {
    fmt: &'f [u8],
    f: usize,
    inp: &'i [u8],
    i: usize,
    /// The accumulating civil fields. This is the host's `tm` layout so
    /// that delegated directives can write straight into it.
    tm: sys::Tm,
    subsec_nanos: i64,
    /// Set by %z/%Ez. When present, the civil fields are interpreted in
    /// UTC and this offset is applied afterwards.
    offset: Option<i32>,
    twelve_hour: bool,
    afternoon: bool,
    saw_percent_s: bool,
    percent_s: i64,
}

impl<'f, 'i> Parser<'f, 'i> {
    fn new(fmt: &'f [u8], inp: &'i [u8]) -> Parser<'f, 'i> {
        // Unspecified fields default to 1970-01-01 00:00:00.0 +0000,
        // which was a Thursday.
        let mut tm = sys::Tm::zeroed();
        tm.tm_year = 70;
        tm.tm_mon = 0;
        tm.tm_mday = 1;
        tm.tm_wday = 4;
        Parser {
            fmt,
            f: 0,
            inp,
            i: 0,
            tm,
            subsec_nanos: 0,
            offset: None,
            twelve_hour: false,
            afternoon: false,
            saw_percent_s: false,
            percent_s: 0,
        }
    }

    fn parse(mut self, tz: &TimeZone) -> Result<Timestamp, Error> {
        self.skip_input_whitespace();

        while self.f < self.fmt.len() {
            if self.fmt[self.f].is_ascii_whitespace() {
                // A whitespace run in the format consumes a (possibly
                // empty) whitespace run in the input.
                self.skip_input_whitespace();
                self.f += 1;
                while self.f < self.fmt.len()
                    && self.fmt[self.f].is_ascii_whitespace()
                {
                    self.f += 1;
                }
                continue;
            }
            if self.fmt[self.f] != b'%' {
                self.match_literal()?;
                continue;
            }

            let percent = self.f;
            self.f += 1;
            if self.f == self.fmt.len() {
                return Err(err!(
                    "format string ends with an unterminated %",
                ));
            }
            let spec = self.fmt[self.f];
            self.f += 1;
            match spec {
                b'Y' => {
                    self.parse_year().context("%Y failed")?;
                    continue;
                }
                b'm' => {
                    let month = self
                        .parse_ranged("month", 2, 1, 12)
                        .context("%m failed")?;
                    self.tm.tm_mon = month - 1;
                    continue;
                }
                b'd' => {
                    self.tm.tm_mday = self
                        .parse_ranged("day", 2, 1, 31)
                        .context("%d failed")?;
                    continue;
                }
                b'H' => {
                    self.tm.tm_hour = self
                        .parse_ranged("hour", 2, 0, 23)
                        .context("%H failed")?;
                    self.twelve_hour = false;
                    continue;
                }
                b'M' => {
                    self.tm.tm_min = self
                        .parse_ranged("minute", 2, 0, 59)
                        .context("%M failed")?;
                    continue;
                }
                b'S' => {
                    // 60 is allowed here: a leap second, normalized away
                    // during reconciliation.
                    self.tm.tm_sec = self
                        .parse_ranged("second", 2, 0, 60)
                        .context("%S failed")?;
                    continue;
                }
                // These directives are handed to the host, but we need to
                // remember whether the hour they fill in is on a 12-hour
                // clock.
                b'I' | b'r' => self.twelve_hour = true,
                b'R' | b'T' | b'c' | b'X' => self.twelve_hour = false,
                b'z' => {
                    self.parse_offset_directive(0).context("%z failed")?;
                    continue;
                }
                b'Z' => {
                    self.parse_zone_abbreviation().context("%Z failed")?;
                    continue;
                }
                b's' => {
                    let (v, n) = parse_int(
                        self.rest(),
                        0,
                        i64::MIN,
                        i64::MAX,
                    )
                    .ok_or_else(|| {
                        err!("failed to parse seconds since the Unix epoch")
                    })
                    .context("%s failed")?;
                    self.percent_s = v;
                    self.saw_percent_s = true;
                    self.i += n;
                    continue;
                }
                b'E' => {
                    if self.parse_extension()? {
                        continue;
                    }
                }
                b'O' => {
                    match self.fmt.get(self.f).copied() {
                        Some(b'H') => self.twelve_hour = false,
                        Some(b'I') => self.twelve_hour = true,
                        _ => {}
                    }
                    if self.f < self.fmt.len() {
                        self.f += 1;
                    }
                }
                // Everything else is a two character directive for the
                // host.
                _ => {}
            }
            self.delegate_to_host(percent)?;
        }

        // Adjust a 12-hour clock value that turned out to be in the
        // afternoon.
        if self.twelve_hour && self.afternoon && self.tm.tm_hour < 12 {
            self.tm.tm_hour += 12;
        }

        // The entire input must be consumed, modulo trailing whitespace.
        self.skip_input_whitespace();
        if self.i != self.inp.len() {
            return Err(err!(
                "expected to consume the entire input, but \
                 {remaining:?} remains unparsed",
                remaining = Bytes(&self.inp[self.i..]),
            ));
        }

        // %s overrides everything else.
        if self.saw_percent_s {
            return Ok(Timestamp::from_second_saturating(i128::from(
                self.percent_s,
            )));
        }

        // With an explicit offset the civil fields are in UTC, shifted
        // afterwards. Without one they are directly in `tz`.
        let (ptz, mut offset) = match self.offset {
            Some(seconds) => (TimeZone::UTC, i64::from(seconds)),
            None => (tz.clone(), 0),
        };

        // A leap second of :60 normalizes forward to :00 of the next
        // minute, with the fraction discarded.
        let mut subsec_nanos = self.subsec_nanos;
        if self.tm.tm_sec == 60 {
            self.tm.tm_sec -= 1;
            offset -= 1;
            subsec_nanos = 0;
        }

        let year = i64::from(self.tm.tm_year).saturating_add(1900);
        let ti = ptz.to_time_info(
            year,
            self.tm.tm_mon.saturating_add(1),
            self.tm.tm_mday,
            self.tm.tm_hour,
            self.tm.tm_min,
            self.tm.tm_sec,
        );

        // Strict mode: parsing "Sep 31" does not produce Oct 1.
        if ti.normalized {
            return Err(err!(
                "parsed civil fields required normalization \
                 (out-of-range day for the month)",
            ));
        }

        Ok(ti
            .pre
            .saturating_sub(SignedDuration::from_secs(offset))
            .saturating_add(SignedDuration::from_nanos(i128::from(
                subsec_nanos,
            ))))
    }

    fn rest(&self) -> &'i [u8] {
        &self.inp[self.i..]
    }

    fn skip_input_whitespace(&mut self) {
        while self.i < self.inp.len()
            && self.inp[self.i].is_ascii_whitespace()
        {
            self.i += 1;
        }
    }

    /// Matches one non-whitespace literal byte of the format exactly.
    fn match_literal(&mut self) -> Result<(), Error> {
        let expect = self.fmt[self.f];
        let Some(&found) = self.inp.get(self.i) else {
            return Err(err!(
                "expected literal byte {expect:?} from the format \
                 string, but found end of input",
                expect = Byte(expect),
            ));
        };
        if found != expect {
            return Err(err!(
                "expected literal byte {expect:?} from the format \
                 string, but found {found:?} in the input",
                expect = Byte(expect),
                found = Byte(found),
            ));
        }
        self.i += 1;
        self.f += 1;
        Ok(())
    }

    /// Parses a bounded decimal field of up to `width` digits.
    fn parse_ranged(
        &mut self,
        what: &str,
        width: usize,
        min: i64,
        max: i64,
    ) -> Result<i32, Error> {
        let (v, n) =
            parse_int(self.rest(), width, min, max).ok_or_else(|| {
                err!(
                    "failed to parse {what} in the range {min}..={max} \
                     at {input:?}",
                    input = Bytes(self.rest()),
                )
            })?;
        self.i += n;
        Ok(v as i32)
    }

    /// %Y is more liberal than the four digit year the host handles, but
    /// the intermediate value still carries a 1900 excess in an i32.
    fn parse_year(&mut self) -> Result<(), Error> {
        let (v, n) = parse_int(
            self.rest(),
            0,
            i64::from(i32::MIN) + 1900,
            i64::from(i32::MAX),
        )
        .ok_or_else(|| err!("failed to parse year"))?;
        self.tm.tm_year = (v - 1900) as i32;
        self.i += n;
        Ok(())
    }

    /// %E4Y consumes exactly four characters, including any sign.
    fn parse_year4(&mut self) -> Result<(), Error> {
        let (v, n) = parse_int(self.rest(), 4, -999, 9999)
            .ok_or_else(|| err!("failed to parse four character year"))?;
        if n != 4 {
            return Err(err!(
                "expected exactly four characters of year, \
                 but only {n} matched",
            ));
        }
        self.tm.tm_year = (v - 1900) as i32;
        self.i += n;
        Ok(())
    }

    /// Dispatches on the character following %E. Returns false when the
    /// directive is not one of ours and should go to the host.
    fn parse_extension(&mut self) -> Result<bool, Error> {
        match self.fmt.get(self.f).copied() {
            Some(b'z') => {
                // A literal Z means Zulu time, offset zero.
                if self.rest().first() == Some(&b'Z') {
                    self.offset = Some(0);
                    self.i += 1;
                } else {
                    self.parse_offset_directive(b':')
                        .context("%Ez failed")?;
                }
                self.f += 1;
                Ok(true)
            }
            Some(b'*') if self.fmt.get(self.f + 1) == Some(&b'S') => {
                self.parse_seconds_with_subseconds(true)
                    .context("%E*S failed")?;
                self.f += 2;
                Ok(true)
            }
            Some(b'4') if self.fmt.get(self.f + 1) == Some(&b'Y') => {
                self.parse_year4().context("%E4Y failed")?;
                self.f += 2;
                Ok(true)
            }
            Some(byte) if byte.is_ascii_digit() => {
                if let Some((n, used)) =
                    parse_int(&self.fmt[self.f..], 0, 0, 1024)
                {
                    if self.fmt.get(self.f + used) == Some(&b'S') {
                        // The requested digit count is otherwise ignored;
                        // the fraction consumed is data driven.
                        self.parse_seconds_with_subseconds(n > 0)
                            .context("%E#S failed")?;
                        self.f += used + 1;
                        return Ok(true);
                    }
                }
                self.unknown_extension();
                Ok(false)
            }
            _ => {
                self.unknown_extension();
                Ok(false)
            }
        }
    }

    /// An unrecognized %E<x> goes to the host as a three character
    /// directive.
    fn unknown_extension(&mut self) {
        match self.fmt.get(self.f).copied() {
            Some(b'c') | Some(b'X') => self.twelve_hour = false,
            _ => {}
        }
        if self.f < self.fmt.len() {
            self.f += 1;
        }
    }

    /// Seconds (allowing a leap second) optionally followed by a dot and
    /// fractional digits.
    fn parse_seconds_with_subseconds(
        &mut self,
        with_fraction: bool,
    ) -> Result<(), Error> {
        self.tm.tm_sec = self.parse_ranged("second", 2, 0, 60)?;
        if with_fraction {
            let (nanos, n) =
                parse_subseconds(self.rest()).ok_or_else(|| {
                    err!("expected fractional digits after decimal point")
                })?;
            if n > 0 {
                self.subsec_nanos = nanos;
                self.i += n;
            }
        }
        Ok(())
    }

    /// %z (no separator) and %Ez (optional colon).
    fn parse_offset_directive(&mut self, sep: u8) -> Result<(), Error> {
        let (seconds, n) =
            parse_offset(self.rest(), sep).ok_or_else(|| {
                err!(
                    "failed to parse time zone offset at {input:?}",
                    input = Bytes(self.rest()),
                )
            })?;
        self.offset = Some(seconds);
        self.i += n;
        Ok(())
    }

    /// %Z reads a run of non-whitespace and ignores it: abbreviations
    /// are ambiguous, so they cannot influence the result.
    fn parse_zone_abbreviation(&mut self) -> Result<(), Error> {
        let start = self.i;
        while self.i < self.inp.len()
            && !self.inp[self.i].is_ascii_whitespace()
        {
            self.i += 1;
        }
        if self.i == start {
            return Err(err!("expected a time zone abbreviation"));
        }
        Ok(())
    }

    /// Hands one directive to the host's `strptime`, which writes into
    /// our `tm`.
    fn delegate_to_host(&mut self, percent: usize) -> Result<(), Error> {
        let spec = &self.fmt[percent..self.f];
        let consumed = sys::parse(self.rest(), spec, &mut self.tm)
            .ok_or_else(|| {
                err!(
                    "host strptime rejected directive {spec:?} \
                     at {input:?}",
                    spec = Bytes(spec),
                    input = Bytes(self.rest()),
                )
            })?;
        if spec == b"%p" {
            // %p on its own cannot move tm_hour, because the host only
            // couples it with an %I in the same call. Re-parse the
            // matched text with a known morning hour and see whether it
            // gets pushed into the afternoon.
            let mut probe = Vec::with_capacity(1 + consumed);
            probe.push(b'1');
            probe.extend_from_slice(&self.inp[self.i..self.i + consumed]);
            let mut tmp = sys::Tm::zeroed();
            let _ = sys::parse(&probe, b"%I%p", &mut tmp);
            self.afternoon = tmp.tm_hour == 13;
        }
        self.i += consumed;
        Ok(())
    }
}

/// Parses `[+-]HH[MM]`, with an optional separator byte between the
/// hours and minutes when `sep` is non-zero. The minutes may be omitted
/// entirely.
fn parse_offset(data: &[u8], sep: u8) -> Option<(i32, usize)> {
    let sign = match data.first() {
        Some(b'+') => 1,
        Some(b'-') => -1,
        _ => return None,
    };
    let (hours, n) = parse_int(&data[1..], 2, 0, 23)?;
    if n != 2 {
        return None;
    }
    let mut pos = 1 + n;

    let mut after_sep = pos;
    if sep != 0 && data.get(pos) == Some(&sep) {
        after_sep += 1;
    }
    let mut minutes = 0;
    if let Some((m, n)) = parse_int(&data[after_sep..], 2, 0, 59) {
        if n == 2 {
            minutes = m;
            pos = after_sep + 2;
        }
    }

    let offset = (hours * 60 + minutes) * 60;
    Some(((sign * offset) as i32, pos))
}

/// Parses an optional `.` followed by fractional second digits.
///
/// Only the first nine digits are significant; the rest are consumed and
/// dropped. Without a leading dot this succeeds having consumed nothing,
/// but a dot with no digits after it is an error.
fn parse_subseconds(data: &[u8]) -> Option<(i64, usize)> {
    if data.first() != Some(&b'.') {
        return Some((0, 0));
    }
    let mut pos = 1;
    let mut value: i64 = 0;
    let mut exp = 0usize;
    while let Some(&byte) = data.get(pos) {
        if !byte.is_ascii_digit() {
            break;
        }
        if exp < 9 {
            exp += 1;
            value = value * 10 + i64::from(byte - b'0');
        }
        pos += 1;
    }
    if pos == 1 {
        return None;
    }
    Some((value * EXP10[9 - exp], pos))
}
