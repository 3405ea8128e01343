pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced to the host dispatcher. Store and decode failures carry
/// the offending key. Nothing below this level retries; a failed call is
/// discarded wholesale by the host's per-call transaction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read key {0:?} from the store")]
    StoreRead(String, #[source] anyhow::Error),

    #[error("failed to write key {0:?} to the store")]
    StoreWrite(String, #[source] anyhow::Error),

    #[error("malformed record under key {0:?}")]
    Decode(String, #[source] anyhow::Error),

    #[error("view {0:?} already exists")]
    AlreadyExists(String),

    #[error("view {0:?} is in the catalog but has no record")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn store_read(key: &[u8], source: anyhow::Error) -> Self {
        Error::StoreRead(printable(key), source)
    }

    pub(crate) fn store_write(key: &[u8], source: anyhow::Error) -> Self {
        Error::StoreWrite(printable(key), source)
    }

    pub(crate) fn decode(key: &[u8], source: anyhow::Error) -> Self {
        Error::Decode(printable(key), source)
    }
}

fn printable(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}
