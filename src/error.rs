/// An error that can occur in this crate.
///
/// There is exactly one error type for every fallible operation. The main
/// reasons an error can occur are:
///
/// * A time zone name was not recognized by [`TimeZone::get`](crate::TimeZone::get).
/// * Parsing failed, either because the format string was malformed or
///   because the input didn't match it.
/// * A value given to a constructor was out of range.
///
/// # Design
///
/// An error is a message and an optional cause, itself an `Error`. The
/// `Display` implementation renders the entire causal chain, so callers
/// generally don't need to walk it themselves.
#[derive(Clone)]
pub struct Error {
    /// Boxed so that `Error` stays a single word and `Result<T, Error>` stays
    /// small for the common `T`s in this crate.
    inner: Box<ErrorInner>,
}

#[derive(Clone, Debug)]
struct ErrorInner {
    message: Box<str>,
    cause: Option<Error>,
}

impl Error {
    /// Creates a new ad hoc error with no cause.
    pub(crate) fn adhoc(message: impl core::fmt::Display) -> Error {
        let message = message.to_string().into_boxed_str();
        Error { inner: Box::new(ErrorInner { message, cause: None }) }
    }

    /// Attaches `consequent` as the user facing message for this error, with
    /// this error as its cause. That is, "consequent is caused by self."
    pub(crate) fn context(self, consequent: impl Into<Error>) -> Error {
        let mut err = consequent.into();
        // An error constructed by this crate never has a cause before context
        // is attached. The chain is a linked list, not a tree.
        debug_assert!(err.inner.cause.is_none());
        err.inner.cause = Some(self);
        err
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut err = self;
        write!(f, "{}", err.inner.message)?;
        while let Some(ref cause) = err.inner.cause {
            err = cause;
            write!(f, ": {}", err.inner.message)?;
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if f.alternate() {
            f.debug_struct("Error").field("inner", &self.inner).finish()
        } else {
            core::fmt::Display::fmt(self, f)
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error {
    fn from(message: String) -> Error {
        Error::adhoc(message)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Error {
        Error::adhoc(message)
    }
}

/// Creates a new ad hoc error from `format!` style arguments.
macro_rules! err {
    ($($tt:tt)*) => {
        crate::error::Error::adhoc(format_args!($($tt)*))
    }
}

pub(crate) use err;

/// A convenience trait for contextualizing the error of a `Result`.
pub(crate) trait ErrorContext<T> {
    /// Attach `consequent` as the message of the error, if there is one.
    fn context(self, consequent: impl Into<Error>) -> Result<T, Error>;

    /// Like `context`, but hides error construction behind a closure so the
    /// happy path doesn't pay for it.
    fn with_context<E: Into<Error>>(
        self,
        consequent: impl FnOnce() -> E,
    ) -> Result<T, Error>;
}

impl<T> ErrorContext<T> for Result<T, Error> {
    fn context(self, consequent: impl Into<Error>) -> Result<T, Error> {
        self.map_err(|err| err.context(consequent))
    }

    fn with_context<E: Into<Error>>(
        self,
        consequent: impl FnOnce() -> E,
    ) -> Result<T, Error> {
        self.map_err(|err| err.context(consequent()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_chain() {
        let err: Result<(), Error> = Err(err!("inner problem"));
        let err = err.context("outer context").unwrap_err();
        assert_eq!(err.to_string(), "outer context: inner problem");
    }

    #[test]
    fn error_is_small() {
        assert_eq!(
            core::mem::size_of::<Error>(),
            core::mem::size_of::<usize>(),
        );
    }
}
