use error_stack::Report;
use thiserror::Error;

/// Errors coming back from the hosted service.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured base URL cannot be parsed or joined with an
    /// endpoint path.
    #[error("invalid backend url")]
    InvalidUrl,
    /// The store accepted the request and answered with an error of its
    /// own (constraint violation, permission denial, bad credentials).
    /// The message is the store's, meant to be shown to the user.
    #[error("request rejected by the backing store: {0}")]
    Rejected(String),
    /// The service could not be reached at all.
    #[error("backing store is unreachable")]
    Unavailable,
    /// The response arrived but its payload did not have the expected
    /// shape.
    #[error("could not decode response payload")]
    Decode,
    /// Any other transport or decoding failure.
    #[error("received a transport error: {0}")]
    Internal(reqwest::Error),
}

/// Lazily typed [`std::result::Result`] but the error generic is filled
/// up with [a backend error](Error).
pub type Result<T> = error_stack::Result<T, Error>;

/// Converts from a generic [`reqwest`] result into a
/// [backend compatible error](Error).
pub trait ErrorExt<T> {
    fn into_backend_error(self) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, reqwest::Error> {
    fn into_backend_error(self) -> Result<T> {
        self.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                Report::new(e).change_context(Error::Unavailable)
            } else {
                Report::new(Error::Internal(e))
            }
        })
    }
}

/// Deals with `error_stack::Report<Error>` directly so call sites do not
/// have to downcast by hand every time they branch on the error class.
pub trait ErrorExt2 {
    fn is_unavailable(&self) -> bool;
    /// The store-reported message, if the store rejected the request.
    fn rejection(&self) -> Option<&str>;
}

impl ErrorExt2 for Report<Error> {
    fn is_unavailable(&self) -> bool {
        self.downcast_ref::<Error>()
            .map(|v| matches!(v, Error::Unavailable))
            .unwrap_or_default()
    }

    fn rejection(&self) -> Option<&str> {
        self.downcast_ref::<Error>().and_then(|v| match v {
            Error::Rejected(message) => Some(message.as_str()),
            _ => None,
        })
    }
}
