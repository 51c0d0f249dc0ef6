//! Background requests against the album server.
//!
//! Requests run on worker threads so the UI loop never blocks; their results
//! come back over a channel and are applied on the next poll.

pub mod manager;

use std::time::Instant;

use crate::api::{AlbumSummary, ContentData};
use crate::error::Error;

pub use manager::RequestManager;

/// Unique identifier for a background request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        RequestId(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of background request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    LoadAlbums,
    LoadContents,
    SaveEdit,
    DeleteContent,
    Download,
}

impl RequestKind {
    /// Short display name for status bar.
    pub fn short_name(&self) -> &'static str {
        match self {
            RequestKind::LoadAlbums => "A",
            RequestKind::LoadContents => "L",
            RequestKind::SaveEdit => "S",
            RequestKind::DeleteContent => "D",
            RequestKind::Download => "G",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RequestKind::LoadAlbums => "Album list",
            RequestKind::LoadContents => "Album contents",
            RequestKind::SaveEdit => "Save properties",
            RequestKind::DeleteContent => "Delete",
            RequestKind::Download => "Download",
        }
    }
}

/// Successful result of a background request.
#[derive(Debug)]
pub enum RequestOutcome {
    Albums(Vec<AlbumSummary>),
    Contents {
        album_id: String,
        contents: Vec<ContentData>,
    },
    Saved {
        source: String,
    },
    Deleted {
        source: String,
    },
    Downloaded {
        filename: String,
        bytes: Vec<u8>,
    },
}

/// A finished request, tagged with the generation it was issued under.
#[derive(Debug)]
pub struct Completion {
    pub id: RequestId,
    pub kind: RequestKind,
    pub generation: u64,
    pub result: Result<RequestOutcome, Error>,
}

/// A request still in flight.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: RequestId,
    pub kind: RequestKind,
    pub generation: u64,
    pub started_at: Instant,
}

impl PendingRequest {
    /// Get elapsed time since the request was issued.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}
