/*!
Convenience types for escaping raw bytes in error messages.

Parsing in this crate works on raw bytes, so when something doesn't match,
the offending bytes need to be shown to a human without assuming they are
valid UTF-8.
*/

/// Provides a convenient `Display` and `Debug` implementation for a `u8`.
///
/// Printable ASCII is emitted as-is. Everything else is emitted as an
/// escape sequence.
#[derive(Clone, Copy)]
pub(crate) struct Byte(pub(crate) u8);

impl core::fmt::Display for Byte {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if self.0 == b' ' {
            return write!(f, " ");
        }
        for ch in core::ascii::escape_default(self.0) {
            write!(f, "{}", char::from(ch))?;
        }
        Ok(())
    }
}

impl core::fmt::Debug for Byte {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

/// Provides a convenient `Display` and `Debug` implementation for `&[u8]`.
///
/// This works for any bytes, but is most readable when they are mostly
/// ASCII.
pub(crate) struct Bytes<'a>(pub(crate) &'a [u8]);

impl<'a> core::fmt::Display for Bytes<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        for &byte in self.0.iter() {
            write!(f, "{}", Byte(byte))?;
        }
        Ok(())
    }
}

impl<'a> core::fmt::Debug for Bytes<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes() {
        assert_eq!(format!("{:?}", Bytes(b"abc")), r#""abc""#);
        assert_eq!(format!("{:?}", Bytes(b"a\xFFc")), r#""a\xffc""#);
        assert_eq!(format!("{}", Byte(b'\n')), r"\n");
    }
}
