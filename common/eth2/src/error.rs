use std::fmt;

/// Errors the beacon-node client contract can surface to the proposal
/// pipeline or registration scheduler. Never retried internally; callers
/// decide whether and when to retry.
#[derive(Debug)]
pub enum Error {
    /// Network or HTTP failure reaching the beacon node.
    TransportError(String),
    /// The beacon node returned a null envelope where a payload was expected.
    EmptyResponse,
    /// A versioned proposal failed its structural invariant (missing body,
    /// execution payload, or execution payload header).
    MalformedResponse(String),
    /// The response's fork version is not one this build recognizes.
    UnsupportedVersion(String),
    /// The server responded with a non-success HTTP status.
    ServerError { status: u16, message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TransportError(msg) => write!(f, "transport error: {msg}"),
            Error::EmptyResponse => write!(f, "beacon node returned an empty response"),
            Error::MalformedResponse(msg) => write!(f, "malformed response: {msg}"),
            Error::UnsupportedVersion(v) => write!(f, "unsupported fork version: {v}"),
            Error::ServerError { status, message } => {
                write!(f, "beacon node returned {status}: {message}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::TransportError(e.to_string())
    }
}
