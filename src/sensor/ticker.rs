//! Cancellable periodic timer used by the adapters to drive their feed.

use crossbeam_channel::{bounded, select, tick, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A background thread that calls a closure once per interval.
///
/// The closure returns `false` to stop ticking on its own. Stopping is
/// synchronous: `stop()` returns only after the thread has exited, and it is a
/// no-op on a ticker that already stopped.
pub struct Ticker {
    cancel: Option<Sender<()>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking every `interval`. The first call happens one interval
    /// after spawning.
    pub fn spawn<F>(interval: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = bounded::<()>(0);

        let handle = thread::spawn(move || {
            let ticks = tick(interval);
            loop {
                select! {
                    // Fires on disconnect, which is how `stop()` signals.
                    recv(cancel_rx) -> _ => break,
                    recv(ticks) -> _ => {
                        if !on_tick() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("ticker thread exiting");
        });

        Self {
            cancel: Some(cancel_tx),
            thread_handle: Some(handle),
        }
    }

    /// Stop ticking and wait for the thread to exit.
    pub fn stop(&mut self) {
        drop(self.cancel.take());
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                tracing::warn!("ticker thread panicked");
            }
        }
    }

    /// Check if the ticker thread is still alive.
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
