//! Background flusher for async durability.
//!
//! Under [`Durability::Async`] a commit writes the snapshot and returns;
//! the flusher performs the durability sync afterwards. Requests are
//! processed in order, and shutdown drains the queue before joining, so a
//! clean close never leaves a commit unsynced.
//!
//! [`Durability::Async`]: crate::durability::Durability::Async

use covault_storage::StoreBackend;
use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::warn;

use crate::error::StoreResult;

pub(crate) type SharedBackend = Arc<Mutex<Box<dyn StoreBackend>>>;

enum FlushRequest {
    Sync,
    Shutdown,
}

/// Owns the background sync thread for one store handle.
pub(crate) struct Flusher {
    sender: Sender<FlushRequest>,
    handle: Option<JoinHandle<()>>,
}

impl Flusher {
    /// Spawns the flusher thread over a shared backend handle.
    pub(crate) fn spawn(backend: SharedBackend) -> StoreResult<Self> {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("covault-flusher".into())
            .spawn(move || Self::run(&backend, &receiver))?;

        Ok(Self {
            sender,
            handle: Some(handle),
        })
    }

    fn run(backend: &SharedBackend, receiver: &Receiver<FlushRequest>) {
        while let Ok(request) = receiver.recv() {
            match request {
                FlushRequest::Sync => {
                    if let Err(error) = backend.lock().sync() {
                        warn!(%error, "background snapshot sync failed");
                    }
                }
                FlushRequest::Shutdown => break,
            }
        }
    }

    /// Queues a durability sync for the last written snapshot.
    pub(crate) fn request_sync(&self) {
        // The receiver only disappears after shutdown; a send failure
        // then is unreachable from a live handle.
        let _ = self.sender.send(FlushRequest::Sync);
    }

    /// Drains queued syncs and joins the thread.
    pub(crate) fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.sender.send(FlushRequest::Shutdown);
            let _ = handle.join();
        }
    }
}

impl Drop for Flusher {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covault_storage::MemoryBackend;

    fn shared_memory_backend() -> SharedBackend {
        Arc::new(Mutex::new(
            Box::new(MemoryBackend::new()) as Box<dyn StoreBackend>
        ))
    }

    #[test]
    fn spawn_and_shutdown() {
        let flusher = Flusher::spawn(shared_memory_backend()).unwrap();
        flusher.shutdown();
    }

    #[test]
    fn queued_syncs_complete_before_shutdown_returns() {
        let backend = shared_memory_backend();
        let flusher = Flusher::spawn(Arc::clone(&backend)).unwrap();

        backend.lock().write_snapshot(b"image").unwrap();
        for _ in 0..16 {
            flusher.request_sync();
        }

        // Shutdown drains the queue; afterwards nothing holds the backend.
        flusher.shutdown();
        assert_eq!(backend.lock().load().unwrap(), b"image");
    }

    #[test]
    fn drop_joins_thread() {
        let flusher = Flusher::spawn(shared_memory_backend()).unwrap();
        flusher.request_sync();
        drop(flusher);
    }
}
