#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("no item id found in {0}")]
    NotFound(String),
    #[error("invalid item id: {0}")]
    Malformed(String),
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    #[error("parse failed: {0}")]
    ParseFailed(String),
    #[error("no provider recognizes {0}")]
    UnsupportedSource(String),
}

pub type Result<T> = std::result::Result<T, Error>;
