//! Background flushing of a shared [`Tracker`].

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::tracker::Tracker;

/// Flushes a tracker every `interval`, and once more on shutdown.
///
/// Failures are logged and retried on the next tick; they never bring down
/// the host. Dropping the worker stops it.
#[derive(Debug)]
pub struct FlushWorker {
    stop: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FlushWorker {
    pub fn spawn(tracker: Arc<Mutex<Tracker>>, interval: Duration) -> io::Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("ustats-flush".to_string())
            .spawn(move || {
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => flush_once(&tracker),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                            flush_once(&tracker);
                            break;
                        }
                    }
                }
                tracing::debug!("flush worker stopped");
            })?;

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// Stops the worker after a final flush.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("flush worker panicked");
            }
        }
    }
}

impl Drop for FlushWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn flush_once(tracker: &Mutex<Tracker>) {
    let mut tracker = tracker
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if tracker.pending() == 0 {
        return;
    }
    if let Err(e) = tracker.flush() {
        tracing::warn!(
            error = %e,
            pending = tracker.pending(),
            "background flush failed; will retry"
        );
    }
}
