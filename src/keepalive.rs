//! Keep the host awake while a batch runs.
//!
//! Resizing a large archive can take minutes. Callers wrap the processing and
//! packaging phases in a [`ProtectedRegion`], which calls
//! [`KeepAlive::begin`] once on entry and [`KeepAlive::end`] once on drop, so
//! the resource is released on every exit path including early `?` returns
//! and panics.
//!
//! [`Heartbeat`] is the CLI implementation: a background thread that ticks at
//! a fixed interval while the region is open. Failing to start it is logged
//! and never aborts the batch.

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A resource held for the duration of a batch.
pub trait KeepAlive: Sync {
    fn begin(&self);
    fn end(&self);
}

/// Scoped hold on a [`KeepAlive`]. Released on drop.
pub struct ProtectedRegion<'a> {
    keep_alive: &'a dyn KeepAlive,
}

impl Drop for ProtectedRegion<'_> {
    fn drop(&mut self) {
        self.keep_alive.end();
    }
}

/// Acquire `keep_alive` until the returned guard is dropped.
pub fn protect(keep_alive: &dyn KeepAlive) -> ProtectedRegion<'_> {
    keep_alive.begin();
    ProtectedRegion { keep_alive }
}

/// Does nothing. For library callers and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoKeepAlive;

impl KeepAlive for NoKeepAlive {
    fn begin(&self) {}
    fn end(&self) {}
}

struct Ticker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Background heartbeat thread.
pub struct Heartbeat {
    interval: Duration,
    active: Arc<AtomicBool>,
    beats: Arc<AtomicU64>,
    ticker: Mutex<Option<Ticker>>,
}

impl Heartbeat {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            active: Arc::new(AtomicBool::new(false)),
            beats: Arc::new(AtomicU64::new(0)),
            ticker: Mutex::new(None),
        }
    }

    /// True while a protected region is open.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Ticks since construction.
    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::Relaxed)
    }
}

impl KeepAlive for Heartbeat {
    fn begin(&self) {
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if ticker.is_some() {
            return;
        }

        let (stop, stopped) = mpsc::channel::<()>();
        let beats = Arc::clone(&self.beats);
        let interval = self.interval;
        let spawned = thread::Builder::new()
            .name("keep-alive".into())
            .spawn(move || {
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let n = beats.fetch_add(1, Ordering::Relaxed) + 1;
                            debug!("keep-alive heartbeat {n}");
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            });

        match spawned {
            Ok(handle) => {
                *ticker = Some(Ticker { stop, handle });
                self.active.store(true, Ordering::Relaxed);
            }
            Err(e) => warn!("Could not start keep-alive heartbeat: {e}"),
        }
    }

    fn end(&self) {
        let ticker = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Ticker { stop, handle }) = ticker else {
            return;
        };
        // A send error means the thread already exited.
        let _ = stop.send(());
        if handle.join().is_err() {
            warn!("Keep-alive heartbeat thread panicked");
        }
        self.active.store(false, Ordering::Relaxed);
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.end();
    }
}
