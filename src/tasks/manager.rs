//! Request manager for tracking in-flight background requests.

use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Instant;

use crate::error::{Error, Result};

use super::{Completion, PendingRequest, RequestId, RequestKind, RequestOutcome};

/// Spawns request jobs on worker threads and collects their completions.
pub struct RequestManager {
    sender: mpsc::Sender<Completion>,
    receiver: mpsc::Receiver<Completion>,
    pending: HashMap<RequestId, PendingRequest>,
    /// Order in which requests were issued.
    order: Vec<RequestId>,
}

impl Default for RequestManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestManager {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            pending: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Run `job` on a worker thread. Its result is delivered by a later
    /// `poll_completions` call, tagged with `generation`.
    pub fn spawn<F>(&mut self, kind: RequestKind, generation: u64, job: F) -> RequestId
    where
        F: FnOnce() -> Result<RequestOutcome> + Send + 'static,
    {
        let id = RequestId::new();
        self.pending.insert(
            id,
            PendingRequest {
                id,
                kind,
                generation,
                started_at: Instant::now(),
            },
        );
        self.order.push(id);

        let sender = self.sender.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("kalbum-{}", kind.short_name().to_lowercase()))
            .spawn(move || {
                let result = job();
                // Receiver gone means the controller was dropped; nothing to report to.
                let _ = sender.send(Completion {
                    id,
                    kind,
                    generation,
                    result,
                });
            });

        if let Err(e) = spawned {
            tracing::error!(request = kind.display_name(), error = %e, "Failed to spawn request thread");
            let _ = self.sender.send(Completion {
                id,
                kind,
                generation,
                result: Err(Error::Io(e)),
            });
        }

        id
    }

    /// Drain every completion that has arrived since the last poll.
    pub fn poll_completions(&mut self) -> Vec<Completion> {
        let mut completed = Vec::new();
        while let Ok(completion) = self.receiver.try_recv() {
            self.pending.remove(&completion.id);
            self.order.retain(|id| *id != completion.id);
            completed.push(completion);
        }
        completed
    }

    /// In-flight requests, oldest first.
    pub fn pending_requests(&self) -> Vec<&PendingRequest> {
        self.order
            .iter()
            .filter_map(|id| self.pending.get(id))
            .collect()
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.pending.values().any(|r| r.kind == kind)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
