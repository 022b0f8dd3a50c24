/// A fixed capacity string for time zone abbreviations, stored inline.
///
/// Abbreviations are tiny ("UTC", "PST", "+05:30"), so there is no reason
/// to heap allocate one every time an instant is broken down. The capacity
/// is generous enough for every abbreviation in the wild, including the
/// long-form spellings some systems use.
///
/// If a string longer than the capacity is pushed, the excess is dropped.
#[derive(Clone, Copy)]
pub struct Abbreviation {
    /// Always valid UTF-8 in `0..len`.
    bytes: [u8; Abbreviation::CAPACITY],
    len: u8,
}

impl Abbreviation {
    const CAPACITY: usize = 30;

    /// Creates an abbreviation from a string, truncating at capacity.
    ///
    /// Truncation is done at a `char` boundary, so the result is always
    /// valid UTF-8.
    pub(crate) fn new(string: &str) -> Abbreviation {
        let mut abbrev =
            Abbreviation { bytes: [0; Abbreviation::CAPACITY], len: 0 };
        for ch in string.chars() {
            let mut buf = [0; 4];
            let encoded = ch.encode_utf8(&mut buf);
            let len = usize::from(abbrev.len);
            if len + encoded.len() > Abbreviation::CAPACITY {
                break;
            }
            abbrev.bytes[len..len + encoded.len()]
                .copy_from_slice(encoded.as_bytes());
            abbrev.len += encoded.len() as u8;
        }
        abbrev
    }

    /// Returns this abbreviation as a string slice.
    pub fn as_str(&self) -> &str {
        // OK because construction only ever copies whole UTF-8 sequences.
        core::str::from_utf8(&self.bytes[..usize::from(self.len)])
            .expect("abbreviation is always valid UTF-8")
    }
}

impl Default for Abbreviation {
    fn default() -> Abbreviation {
        Abbreviation::new("")
    }
}

impl Eq for Abbreviation {}

impl PartialEq for Abbreviation {
    fn eq(&self, rhs: &Abbreviation) -> bool {
        self.as_str() == rhs.as_str()
    }
}

impl PartialEq<str> for Abbreviation {
    fn eq(&self, rhs: &str) -> bool {
        self.as_str() == rhs
    }
}

impl PartialEq<&str> for Abbreviation {
    fn eq(&self, rhs: &&str) -> bool {
        self.as_str() == *rhs
    }
}

impl core::fmt::Debug for Abbreviation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Debug::fmt(self.as_str(), f)
    }
}

impl core::fmt::Display for Abbreviation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(self.as_str(), f)
    }
}

impl core::fmt::Write for Abbreviation {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        // Overlong abbreviations are truncated rather than rejected. The
        // only writer is the offset renderer, which always fits.
        *self = Abbreviation::new(&format!("{}{}", self.as_str(), s));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_at_capacity() {
        let abbrev = Abbreviation::new("x".repeat(64).as_str());
        assert_eq!(abbrev.as_str().len(), 30);
    }

    #[test]
    fn empty() {
        assert_eq!(Abbreviation::default(), "");
    }
}
