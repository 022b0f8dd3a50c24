/*!
Zone loading and the process wide zone cache.

Loading is the only operation that can observe zone identity, so loads of
the same name must hand back the same backend allocation. A simple map
from name to handle, filled on first use, is all that takes.
*/

use std::{
    collections::HashMap,
    sync::{Mutex, OnceLock},
};

use crate::{
    error::{err, Error, ErrorContext},
    tz::{Offset, TimeZone},
    util::escape::Bytes,
};

static CACHE: OnceLock<Mutex<HashMap<String, TimeZone>>> = OnceLock::new();

/// Looks up a zone by name, constructing and caching it on first use.
pub(crate) fn get(name: &str) -> Result<TimeZone, Error> {
    // Every spelling of UTC maps to the one true UTC handle, which needs
    // no cache entry because all UTC handles are already equal.
    if name.is_empty() || name == "UTC" {
        return Ok(TimeZone::UTC);
    }
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = match cache.lock() {
        Ok(guard) => guard,
        // A panic while holding the lock can't leave the map in a bad
        // state; keep serving lookups.
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(tz) = cache.get(name) {
        return Ok(tz.clone());
    }
    let tz = build(name)?;
    debug!("time zone {name:?} loaded and cached");
    cache.insert(name.to_string(), tz.clone());
    Ok(tz)
}

fn build(name: &str) -> Result<TimeZone, Error> {
    if name == "localtime" {
        return Ok(TimeZone::new_system());
    }
    if let Some(rest) = name.strip_prefix("UTC") {
        let offset = parse_fixed_offset(rest).with_context(|| {
            err!("failed to parse fixed offset zone name {name:?}")
        })?;
        return Ok(TimeZone::fixed(offset));
    }
    Err(err!(
        "unrecognized time zone name {name:?} (expected \"UTC\", \
         \"localtime\", or a fixed offset like \"UTC+05:30\")",
    ))
}

/// Parses the `±HH`, `±HHMM` or `±HH:MM` tail of a fixed offset zone
/// name.
fn parse_fixed_offset(rest: &str) -> Result<Offset, Error> {
    let bytes = rest.as_bytes();
    let sign = match bytes.first() {
        Some(b'+') => 1,
        Some(b'-') => -1,
        _ => {
            return Err(err!(
                "expected '+' or '-' after \"UTC\", but found {found:?}",
                found = Bytes(bytes),
            ))
        }
    };

    let mut pos = 1;
    let hours = parse_two_digits(bytes, &mut pos)
        .ok_or_else(|| err!("expected hours after the offset sign"))?;
    let minutes = match bytes.get(pos) {
        None => 0,
        Some(b':') => {
            pos += 1;
            parse_two_digits(bytes, &mut pos).ok_or_else(|| {
                err!("expected minutes after ':' in offset")
            })?
        }
        Some(_) => parse_two_digits(bytes, &mut pos)
            .ok_or_else(|| err!("expected minutes after hours in offset"))?,
    };
    if pos != bytes.len() {
        return Err(err!(
            "unexpected trailing input {found:?} in offset",
            found = Bytes(&bytes[pos..]),
        ));
    }
    if hours > 23 {
        return Err(err!(
            "offset hours must be in the range 0..=23, but got {hours}",
        ));
    }
    if minutes > 59 {
        return Err(err!(
            "offset minutes must be in the range 0..=59, but got {minutes}",
        ));
    }
    Offset::from_seconds(sign * (hours * 3_600 + minutes * 60))
}

/// Consumes one or two ASCII digits at `*pos`, preferring two.
fn parse_two_digits(bytes: &[u8], pos: &mut usize) -> Option<i32> {
    let mut value: i32 = 0;
    let mut digits = 0;
    while digits < 2 {
        match bytes.get(*pos) {
            Some(byte) if byte.is_ascii_digit() => {
                value = value * 10 + i32::from(byte - b'0');
                *pos += 1;
                digits += 1;
            }
            _ => break,
        }
    }
    if digits == 0 {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_names() {
        let _ = env_logger::builder().is_test(true).try_init();

        assert_eq!(get("").unwrap(), TimeZone::UTC);
        assert_eq!(get("UTC").unwrap(), TimeZone::UTC);
        assert_eq!(get("UTC+00:00").unwrap(), TimeZone::UTC);
        assert!(get("localtime").is_ok());

        let tz = get("UTC+05:30").unwrap();
        let bd = tz.to_breakdown(crate::Timestamp::UNIX_EPOCH);
        assert_eq!(bd.offset.seconds(), 5 * 3_600 + 30 * 60);
        assert_eq!(bd.abbreviation, "+05:30");

        assert_eq!(
            get("UTC-8").unwrap().to_breakdown(crate::Timestamp::UNIX_EPOCH)
                .offset
                .seconds(),
            -8 * 3_600,
        );
        assert_eq!(
            get("UTC+0530")
                .unwrap()
                .to_breakdown(crate::Timestamp::UNIX_EPOCH)
                .offset
                .seconds(),
            5 * 3_600 + 30 * 60,
        );
    }

    #[test]
    fn rejected_names() {
        assert!(get("America/Los_Angeles").is_err());
        assert!(get("PST").is_err());
        assert!(get("UTC+24").is_err());
        assert!(get("UTC+05:60").is_err());
        assert!(get("UTC+05:301").is_err());
        assert!(get("UTC~05").is_err());
    }

    #[test]
    fn loads_are_identical() {
        let a = get("UTC-07:00").unwrap();
        let b = get("UTC-07:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fallback_is_utc() {
        assert_eq!(
            TimeZone::get_or_utc("Mars/Olympus_Mons"),
            TimeZone::UTC,
        );
    }
}
