use std::fmt;

/// Internal transport failures. None of `JobberClient`'s public methods
/// propagate this — every operation classifies failures into its own result
/// shape instead.
#[derive(Debug)]
pub(crate) enum TransportError {
    Timeout,
    Http(reqwest::Error),
    Decode(reqwest::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout => write!(f, "timeout submitting to jobber"),
            TransportError::Http(e) => write!(f, "jobber transport error: {e}"),
            TransportError::Decode(e) => write!(f, "invalid jobber response: {e}"),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Http(e)
        }
    }
}
