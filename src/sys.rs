/*!
Thin bindings to the host's time facilities.

The system time zone backend routes through `localtime_r(3)` and
`mktime(3)`, and the format/parse machinery delegates the conversion
specifiers it does not handle itself to `strftime(3)` and `strptime(3)`.
This module is the only place the crate touches libc.

On non-Unix targets the bindings are stubbed out: local time conversions
report failure (the system zone then behaves as UTC), host formatting
emits nothing and host parsing fails.
*/

use std::os::raw::{c_char, c_int, c_long};

/// A mirror of the host's `struct tm`, including the BSD/GNU `tm_gmtoff`
/// and `tm_zone` extensions present on every supported Unix.
#[repr(C)]
#[derive(Clone, Copy)]
pub(crate) struct Tm {
    pub(crate) tm_sec: c_int,
    pub(crate) tm_min: c_int,
    pub(crate) tm_hour: c_int,
    pub(crate) tm_mday: c_int,
    pub(crate) tm_mon: c_int,
    pub(crate) tm_year: c_int,
    pub(crate) tm_wday: c_int,
    pub(crate) tm_yday: c_int,
    pub(crate) tm_isdst: c_int,
    pub(crate) tm_gmtoff: c_long,
    pub(crate) tm_zone: *const c_char,
}

impl Tm {
    /// Returns a `tm` with every field zero and `tm_zone` null.
    pub(crate) fn zeroed() -> Tm {
        // OK because Tm is all integers plus one nullable raw pointer.
        unsafe { std::mem::zeroed() }
    }

    /// Returns the abbreviation the host attached to this `tm`, if any.
    pub(crate) fn zone(&self) -> Option<&str> {
        if self.tm_zone.is_null() {
            return None;
        }
        // OK because the host guarantees tm_zone points at a NUL
        // terminated string that outlives the call (it aliases static
        // zone data).
        let cstr = unsafe { std::ffi::CStr::from_ptr(self.tm_zone) };
        cstr.to_str().ok()
    }
}

#[cfg(unix)]
extern "C" {
    fn localtime_r(t: *const i64, tm: *mut Tm) -> *mut Tm;
    fn mktime(tm: *mut Tm) -> i64;
    fn strftime(
        buf: *mut c_char,
        max: usize,
        fmt: *const c_char,
        tm: *const Tm,
    ) -> usize;
    fn strptime(
        input: *const c_char,
        fmt: *const c_char,
        tm: *mut Tm,
    ) -> *mut c_char;
}

/// Converts a count of Unix seconds to civil time in the host's local
/// time zone.
#[cfg(unix)]
pub(crate) fn localtime(t: i64) -> Option<Tm> {
    let mut tm = Tm::zeroed();
    let ret = unsafe { localtime_r(&t, &mut tm) };
    if ret.is_null() {
        return None;
    }
    Some(tm)
}

#[cfg(not(unix))]
pub(crate) fn localtime(_t: i64) -> Option<Tm> {
    None
}

/// Converts civil time in the host's local time zone to Unix seconds,
/// normalizing the fields of `tm` in place.
///
/// `tm.tm_isdst` should be `-1` so the host picks the offset itself.
#[cfg(unix)]
pub(crate) fn make_time(tm: &mut Tm) -> Option<i64> {
    // mktime returns -1 both for errors and for the instant one second
    // before the epoch in some zones. There is no way to tell these
    // apart, so the value is taken at face value.
    Some(unsafe { mktime(tm) })
}

#[cfg(not(unix))]
pub(crate) fn make_time(_tm: &mut Tm) -> Option<i64> {
    None
}

/// Formats `tm` with the host's `strftime`.
///
/// `strftime` reports failure and empty output the same way, so the
/// buffer is regrown a few times before giving up and returning nothing.
#[cfg(unix)]
pub(crate) fn format(fmt: &[u8], tm: &Tm) -> Vec<u8> {
    let Ok(fmt) = std::ffi::CString::new(fmt) else {
        return Vec::new();
    };
    let mut factor = 2;
    while factor <= 16 {
        let size = fmt.as_bytes().len() * factor + 1;
        let mut buf = vec![0u8; size];
        let len = unsafe {
            strftime(buf.as_mut_ptr().cast::<c_char>(), size, fmt.as_ptr(), tm)
        };
        if len > 0 {
            buf.truncate(len);
            return buf;
        }
        factor *= 2;
    }
    trace!(
        "host strftime produced no output for format {:?}",
        crate::util::escape::Bytes(fmt.as_bytes()),
    );
    Vec::new()
}

#[cfg(not(unix))]
pub(crate) fn format(_fmt: &[u8], _tm: &Tm) -> Vec<u8> {
    Vec::new()
}

/// Parses the front of `input` with the host's `strptime`, writing any
/// parsed fields into `tm`.
///
/// Returns the number of input bytes consumed, or `None` if the host
/// rejected the input.
#[cfg(unix)]
pub(crate) fn parse(input: &[u8], fmt: &[u8], tm: &mut Tm) -> Option<usize> {
    let input = std::ffi::CString::new(input).ok()?;
    let fmt = std::ffi::CString::new(fmt).ok()?;
    let ret = unsafe { strptime(input.as_ptr(), fmt.as_ptr(), tm) };
    if ret.is_null() {
        return None;
    }
    // OK because strptime returns a pointer into the input string.
    Some(unsafe { ret.cast_const().offset_from(input.as_ptr()) } as usize)
}

#[cfg(not(unix))]
pub(crate) fn parse(
    _input: &[u8],
    _fmt: &[u8],
    _tm: &mut Tm,
) -> Option<usize> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn strftime_roundtrips_epoch_fields() {
        let mut tm = Tm::zeroed();
        tm.tm_year = 70;
        tm.tm_mon = 0;
        tm.tm_mday = 1;
        tm.tm_wday = 4;
        let out = format(b"%Y/%m/%d %a", &tm);
        assert_eq!(out, b"1970/01/01 Thu");
    }

    #[test]
    fn strptime_reports_consumed_bytes() {
        let mut tm = Tm::zeroed();
        let n = parse(b"03:04 tail", b"%H:%M", &mut tm).unwrap();
        assert_eq!(n, 5);
        assert_eq!((tm.tm_hour, tm.tm_min), (3, 4));
    }
}
