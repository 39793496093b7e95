//! Homing coordinator.
//!
//! Drives the five-phase homing sequence: seek Z to its limit, pull off
//! and re-seek, then the same for X and Y together. While the sequence
//! runs it owns the executor setpoint (`homing_target`); the executor
//! moves the machine, this task only watches position and retargets.
//!
//! Each `$H` bumps the homing epoch. Every poll re-checks the epoch, so a
//! soft reset (or a superseding `$H`) makes a stale coordinator exit
//! without touching the machine again.

use super::machine::Machine;
use super::state::{MachineState, Position};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Arrival tolerance while seeking a limit (mm).
pub const SEEK_TOLERANCE_MM: f64 = 0.1;

/// Pull-off distance after reaching a limit (mm).
pub const BACKOFF_MM: f64 = 2.0;

/// Dwell after commanding a pull-off.
pub const BACKOFF_DWELL: Duration = Duration::from_millis(500);

/// Poll granularity while waiting on the executor.
const POLL: Duration = Duration::from_millis(10);

fn cancelled(machine: &Machine, epoch: u64) -> bool {
    !machine.homing_active || machine.homing_epoch != epoch
}

/// Moves the setpoint, then polls until `done` holds. Returns false when
/// the sequence was cancelled.
async fn seek<S, D>(machine: &Arc<Mutex<Machine>>, epoch: u64, set: S, done: D) -> bool
where
    S: Fn(&mut Position),
    D: Fn(&Machine) -> bool,
{
    {
        let mut m = machine.lock().await;
        if cancelled(&m, epoch) {
            return false;
        }
        set(&mut m.homing_target);
    }
    loop {
        tokio::time::sleep(POLL).await;
        let m = machine.lock().await;
        if cancelled(&m, epoch) {
            return false;
        }
        if done(&m) {
            return true;
        }
    }
}

/// Commands a pull-off, dwells, then snaps the live position onto the
/// pull-off point so the re-seek starts from a known spot.
async fn back_off<S, P>(machine: &Arc<Mutex<Machine>>, epoch: u64, set: S, snap: P) -> bool
where
    S: Fn(&mut Position),
    P: Fn(&mut Machine),
{
    {
        let mut m = machine.lock().await;
        if cancelled(&m, epoch) {
            return false;
        }
        set(&mut m.homing_target);
    }
    tokio::time::sleep(BACKOFF_DWELL).await;
    let mut m = machine.lock().await;
    if cancelled(&m, epoch) {
        return false;
    }
    snap(&mut m);
    true
}

/// Runs one homing sequence for the given epoch.
pub(crate) async fn run_homing(machine: Arc<Mutex<Machine>>, epoch: u64) {
    let home = machine.lock().await.settings.max_travel();
    debug!(?home, epoch, "homing sequence begin");

    // Z to its limit, pull off, re-seek.
    if !seek(
        &machine,
        epoch,
        |t| t.z = home.z,
        |m| (m.mpos.z - home.z).abs() <= SEEK_TOLERANCE_MM,
    )
    .await
    {
        return;
    }
    if !back_off(
        &machine,
        epoch,
        |t| t.z = home.z - BACKOFF_MM,
        |m| m.mpos.z = home.z - BACKOFF_MM,
    )
    .await
    {
        return;
    }
    if !seek(
        &machine,
        epoch,
        |t| t.z = home.z,
        |m| (m.mpos.z - home.z).abs() <= SEEK_TOLERANCE_MM,
    )
    .await
    {
        return;
    }

    // X and Y together, same pattern.
    if !seek(
        &machine,
        epoch,
        |t| {
            t.x = home.x;
            t.y = home.y;
        },
        |m| {
            (m.mpos.x - home.x).abs() <= SEEK_TOLERANCE_MM
                && (m.mpos.y - home.y).abs() <= SEEK_TOLERANCE_MM
        },
    )
    .await
    {
        return;
    }
    if !back_off(
        &machine,
        epoch,
        |t| {
            t.x = home.x - BACKOFF_MM;
            t.y = home.y - BACKOFF_MM;
        },
        |m| {
            m.mpos.x = home.x - BACKOFF_MM;
            m.mpos.y = home.y - BACKOFF_MM;
        },
    )
    .await
    {
        return;
    }
    if !seek(
        &machine,
        epoch,
        |t| {
            t.x = home.x;
            t.y = home.y;
        },
        |m| {
            (m.mpos.x - home.x).abs() <= SEEK_TOLERANCE_MM
                && (m.mpos.y - home.y).abs() <= SEEK_TOLERANCE_MM
        },
    )
    .await
    {
        return;
    }

    let mut m = machine.lock().await;
    if cancelled(&m, epoch) {
        return;
    }
    m.mpos = home;
    m.wco = Position::ZERO;
    m.target = home;
    m.queue.clear();
    m.homing_active = false;
    m.state = MachineState::Idle;
    info!(?home, "homing complete");
}
