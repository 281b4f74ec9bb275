use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("bad response: {0}")]
    BadResponse(String),
}

pub type Result<T> = std::result::Result<T, LinkError>;
