//! Tick Runner - background thread that advances the simulation at regular intervals

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

use crate::world::{SimulationWorld, TickReport};

/// Drives a shared `SimulationWorld` from a background thread, one tick per
/// interval. This is the single logical tick thread: all schedule mutation
/// happens on it.
pub struct TickRunner {
    is_running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl TickRunner {
    pub fn new() -> Self {
        Self {
            is_running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start ticking at the specified interval.
    ///
    /// # Arguments
    /// * `world` - Shared reference to the simulation world
    /// * `interval_ms` - Milliseconds between ticks
    /// * `ticks_per_step` - Ticks advanced per interval (catch-up handles the gap)
    /// * `callback` - Invoked with each step's report
    pub fn start<F>(
        &mut self,
        world: Arc<Mutex<SimulationWorld>>,
        interval_ms: u64,
        ticks_per_step: u64,
        callback: F,
    ) where
        F: Fn(TickReport) + Send + 'static,
    {
        if self.is_running.load(Ordering::Relaxed) {
            warn!("tick runner already running");
            return;
        }

        info!(interval_ms, ticks_per_step, "starting tick runner");
        self.is_running.store(true, Ordering::Relaxed);
        let running = Arc::clone(&self.is_running);
        let step = ticks_per_step.max(1);

        let handle = thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                let report = {
                    let mut w = world.lock().unwrap();
                    let target = w.tick + step;
                    w.advance_to(target)
                };

                callback(report);

                thread::sleep(Duration::from_millis(interval_ms));
            }
            info!("tick runner thread stopped");
        });

        self.thread_handle = Some(handle);
    }

    /// Stop ticking.
    pub fn stop(&mut self) {
        if !self.is_running.load(Ordering::Relaxed) {
            return;
        }

        info!("stopping tick runner");
        self.is_running.store(false, Ordering::Relaxed);

        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join(); // Thread panic result intentionally ignored during shutdown
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }
}

impl Default for TickRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TickRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_tick_runner() {
        let world = Arc::new(Mutex::new(SimulationWorld::new()));
        world.lock().unwrap().seed_pawns(10);

        let step_count = Arc::new(AtomicU32::new(0));
        let step_count_clone = Arc::clone(&step_count);

        let mut runner = TickRunner::new();
        runner.start(
            Arc::clone(&world),
            50, // 50ms between steps
            100,
            move |_report| {
                step_count_clone.fetch_add(1, Ordering::Relaxed);
            },
        );
        assert!(runner.is_running());

        thread::sleep(Duration::from_millis(275));
        runner.stop();
        assert!(!runner.is_running());

        let steps = step_count.load(Ordering::Relaxed);
        assert!(steps >= 3, "expected several steps, got {}", steps);
        assert!(world.lock().unwrap().tick >= 300);
    }
}
