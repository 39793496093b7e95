//! Motion executor task.
//!
//! Ticks at a nominal 100 Hz and integrates real elapsed time, so jitter
//! in tick delivery does not distort feed rates. Each tick advances the
//! machine under the shared lock and publishes a fresh status snapshot.

use super::machine::Machine;
use super::state::StatusSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::{Instant, MissedTickBehavior};

/// Nominal executor tick period (10 ms).
pub const TICK_INTERVAL_MS: u64 = 10;

/// Runs the tick loop until the shutdown flag is raised or dropped.
pub(crate) async fn run_executor(
    machine: Arc<Mutex<Machine>>,
    status_tx: watch::Sender<StatusSnapshot>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(TICK_INTERVAL_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;

        let mut machine = machine.lock().await;
        machine.tick(dt);
        let _ = status_tx.send(machine.snapshot());
    }
}
