use std::io;
use thiserror::Error;

/// Failures the lightbox core can report. None of them are fatal to the host.
#[derive(Debug, Error)]
pub enum Error {
    #[error("network failure: {0}")]
    Network(String),
    #[error("server answered {status} for {url}")]
    Status { status: u16, url: String },
    #[error("no media item at position {0}")]
    InvalidPosition(usize),
    #[error("degenerate media dimensions {width}x{height}")]
    DegenerateMedia { width: f64, height: f64 },
    #[error("viewport {width}x{height} cannot display media")]
    DegenerateViewport { width: f64, height: f64 },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for failures that came from talking to the album server.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Status { .. } | Error::Decode(_))
    }
}
