use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, Sender};

/// Runs a callback on a dedicated thread at a fixed interval until cancelled.
///
/// The first run happens one full interval after spawning. Cancelling stops
/// future runs; a run already in progress finishes first.
pub struct PeriodicTask {
    stop_tx: Option<Sender<()>>,
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn spawn<F>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let cancelled_clone = cancelled.clone();

        let handle = thread::spawn(move || {
            let ticker = crossbeam_channel::tick(interval);
            loop {
                select! {
                    recv(ticker) -> _ => {
                        if cancelled_clone.load(Ordering::Relaxed) {
                            break;
                        }
                        tick();
                    }
                    recv(stop_rx) -> _ => break,
                }
            }
        });

        Self {
            stop_tx: Some(stop_tx),
            cancelled,
            handle: Some(handle),
        }
    }

    /// Stops scheduling and waits for the timer thread to exit. Idempotent.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        // Dropping the sender disconnects the stop channel and wakes the select.
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                log::warn!("Periodic task thread panicked");
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
