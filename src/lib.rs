/*!
civtz is a library for translating between absolute instants
([`Timestamp`]) and civil times (year, month, day, hour, minute, second)
using the rules defined by a time zone ([`TimeZone`]), with
`strftime`/`strptime` style formatting and parsing on top.

# Example

```
use civtz::{fmt, TimeZone};

let tz = TimeZone::get("UTC-08:00")?;
let ts = tz.to_timestamp(2015, 1, 2, 3, 4, 5);

let bd = tz.to_breakdown(ts);
assert_eq!(bd.year, 2015);
assert_eq!(bd.month, 1);
assert_eq!(bd.hour, 3);

let s = fmt::format("%Y-%m-%d %H:%M:%S %Ez", ts, &tz);
assert_eq!(s, "2015-01-02 03:04:05 -08:00");

let parsed = fmt::parse("%Y-%m-%d %H:%M:%S %Ez", &s, &tz)?;
assert_eq!(parsed, ts);

# Ok::<(), civtz::Error>(())
```

# Instants and civil time

A [`Timestamp`] is a signed count of nanoseconds from the Unix epoch,
wide enough (128 bits, bounded to ±10^18 seconds) that civil times with
absurd years still convert without wrapping. Civil time is what a human
in a zone writes down: the [`Breakdown`] type carries the calendar
fields along with the weekday, day of year, UTC offset, DST flag and
zone abbreviation in effect.

Converting civil time to an instant is not always one-to-one: around
zone transitions, civil times can be skipped or repeated. The
[`TimeInfo`] returned by [`TimeZone::to_time_info`] describes the
mapping in full; the plain [`TimeZone::to_timestamp`] convenience picks
the pre-transition interpretation.

# Time zones

Zones are loaded by name with [`TimeZone::get`]. This crate bundles two
backends: fixed offsets from UTC (`"UTC"`, `"UTC+05:30"`, ...) and the
host's local time under the name `"localtime"`. Handles are small values
that share their backend when cloned; loading the same name twice hands
back the same backend, so `==` means "the same zone", not "rules that
happen to coincide".

# Crate features

* **std** (required) - this crate relies on the host's libc time
  facilities for the local time zone and for locale dependent format
  directives.
* **logging** (enabled by default) - emits `log` crate messages around
  zone loading and local time fallbacks.
*/

#![deny(rustdoc::broken_intra_doc_links)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub use crate::{
    civil::Weekday,
    duration::SignedDuration,
    error::Error,
    timestamp::Timestamp,
    tz::{Breakdown, TimeInfo, TimeInfoKind, TimeZone},
};

/// The number of nanoseconds in one second.
pub(crate) const NANOS_PER_SECOND: i128 = 1_000_000_000;

#[macro_use]
mod logging;

pub mod civil;
mod duration;
mod error;
pub mod fmt;
mod sys;
mod timestamp;
pub mod tz;
mod util;
