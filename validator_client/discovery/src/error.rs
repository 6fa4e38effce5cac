#[derive(Debug)]
pub enum Error {
    /// UDP bind failure at startup; fatal for the service.
    BindFailed(String),
    /// ENR mutation rejected (e.g. value too large to encode).
    EnrMutationFailed(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::BindFailed(e) => write!(f, "failed to bind discovery socket: {e}"),
            Error::EnrMutationFailed(e) => write!(f, "failed to mutate local ENR: {e}"),
        }
    }
}

impl std::error::Error for Error {}
