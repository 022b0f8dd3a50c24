/*!
Routines for interacting with time zones.

The main type in this module is [`TimeZone`]: a small value type that maps
between absolute instants ([`Timestamp`](crate::Timestamp)) and civil
time. Zones are loaded by name:

```
use civtz::TimeZone;

let tz = TimeZone::get("UTC-08:00")?;
let bd = tz.to_breakdown(tz.to_timestamp(2015, 1, 2, 3, 4, 5));
assert_eq!((bd.year, bd.month, bd.day), (2015, 1, 2));

# Ok::<(), civtz::Error>(())
```

Two backends are bundled: fixed offsets from UTC (including plain UTC)
and the host's local time zone under the name `"localtime"`. Full IANA
zone rules are deliberately out of scope here; a backend carrying them
would satisfy the same [`TimeInfo`] contract, reporting skipped and
repeated civil times around its transitions.
*/

pub use self::{
    offset::{offset, Offset},
    timezone::{Breakdown, TimeInfo, TimeInfoKind, TimeZone},
};
pub use crate::util::abbrev::Abbreviation;

pub(crate) mod db;
mod offset;
mod system;
mod timezone;
