//! Cancellable periodic background task.
//!
//! The TTL decorator, the sharded engine and the durable adapter all expire
//! entries with the same loop: wait `interval`, run one tick under the
//! engine's lock, repeat until told to stop.
//!
//! ```text
//!   owner thread                         sweep thread ("evictkit-sweep")
//!   ────────────                         ───────────────────────────────
//!   start_sweep(interval) ──spawn──────► loop {
//!                                          wait_until(deadline) on Condvar
//!                                          stopped? ──yes──► exit
//!                                          tick() ──Break──► exit
//!                                        }
//!   stop() ── stopped = true, notify ──►  (wakes immediately)
//!          ── join ◄─────────────────────  exit
//! ```
//!
//! `stop()` returns only after the thread has exited, so no tick runs after
//! it. Stopping twice, or stopping an idle handle, is a no-op. Dropping the
//! handle stops the sweep.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::error::CacheError;

#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    /// Sleeps until `deadline`; returns `true` if a stop was requested.
    fn wait_until(&self, deadline: Instant) -> bool {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.wake.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }

    fn raise(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }
}

/// Handle to a background sweep.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::ops::ControlFlow;
/// use std::time::Duration;
///
/// use evictkit::sweep::Sweeper;
///
/// let ticks = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&ticks);
/// let mut sweeper = Sweeper::spawn("demo-sweep", Duration::from_millis(5), move || {
///     counter.fetch_add(1, Ordering::Relaxed);
///     ControlFlow::Continue(())
/// })
/// .unwrap();
///
/// std::thread::sleep(Duration::from_millis(50));
/// sweeper.stop();
/// let seen = ticks.load(Ordering::Relaxed);
/// assert!(seen > 0);
///
/// std::thread::sleep(Duration::from_millis(20));
/// assert_eq!(ticks.load(Ordering::Relaxed), seen);
/// ```
#[derive(Debug)]
#[must_use = "dropping a Sweeper stops the sweep"]
pub struct Sweeper {
    signal: Option<Arc<StopSignal>>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// A handle with no task behind it.
    pub fn idle() -> Self {
        Self {
            signal: None,
            handle: None,
        }
    }

    /// Runs `tick` every `interval` on a named thread.
    ///
    /// A zero `interval` disables sweeping and returns [`Sweeper::idle`].
    /// Returning [`ControlFlow::Break`] from `tick` ends the task.
    ///
    /// # Errors
    ///
    /// [`CacheError::Spawn`] if the OS refuses the thread.
    pub fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> Result<Self, CacheError>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        if interval.is_zero() {
            debug!(name, "sweep disabled (zero interval)");
            return Ok(Self::idle());
        }

        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);
        let task_name = name.to_owned();
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                debug!(name = %task_name, ?interval, "sweep started");
                loop {
                    if thread_signal.wait_until(Instant::now() + interval) {
                        break;
                    }
                    if tick().is_break() {
                        debug!(name = %task_name, "sweep target dropped");
                        break;
                    }
                }
                debug!(name = %task_name, "sweep exited");
            })
            .map_err(CacheError::Spawn)?;

        Ok(Self {
            signal: Some(signal),
            handle: Some(handle),
        })
    }

    /// `true` while a sweep thread is attached and has not exited.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the sweep and waits for the thread to exit.
    pub fn stop(&mut self) {
        if let Some(signal) = self.signal.take() {
            signal.raise();
        }
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            debug!("sweep thread panicked");
        }
    }
}

impl Default for Sweeper {
    fn default() -> Self {
        Self::idle()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
