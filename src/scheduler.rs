// SPDX-License-Identifier: MPL-2.0

//! Repeating timer driving wallpaper rotation.
//!
//! At most one timer task is alive per [`RotationTimer`]. Starting a new one
//! aborts the previous task before spawning, so ticks from an old interval
//! can never interleave with the new one.

use std::time::Duration;

use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::error::{BackdropError, Result};

/// Rotation interval used when none is configured.
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_millis(30_000);

/// Whether a rotation timer is running.
///
/// `Idle` is the initial state. Starting moves to `Rotating`, restarting stays
/// in `Rotating` with the new interval, and stopping returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    /// No timer task exists
    Idle,
    /// A timer task fires every `interval`
    Rotating {
        /// Time between two ticks
        interval: Duration,
    },
}

/// A spawned timer task together with the interval it was started with
#[derive(Debug)]
struct ActiveTimer {
    /// Handle used to abort the task
    handle: JoinHandle<()>,
    /// Interval the task ticks at
    interval: Duration,
}

/// Owner of the single rotation task.
///
/// The task is aborted when the timer is stopped, restarted or dropped, so a
/// `RotationTimer` going out of scope never leaves a task behind.
#[derive(Debug, Default)]
pub struct RotationTimer {
    /// Currently running task, if any
    active: Option<ActiveTimer>,
}

impl RotationTimer {
    /// Create an idle timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any running timer with one calling `tick` every `interval`.
    ///
    /// The first tick fires one full interval after this call. Ticks that fall
    /// behind (a stalled runtime, a suspended machine) are delayed rather than
    /// fired in a burst.
    ///
    /// # Errors
    ///
    /// - [`BackdropError::InvalidInterval`] for a zero interval; the current
    ///   timer keeps running.
    /// - [`BackdropError::NoRuntime`] when called outside a tokio runtime.
    pub fn start<F>(&mut self, interval: Duration, mut tick: F) -> Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        if interval.is_zero() {
            return Err(BackdropError::InvalidInterval);
        }

        let runtime = Handle::try_current().map_err(|_| BackdropError::NoRuntime {
            what: "wallpaper rotation",
        })?;

        self.stop();

        let handle = runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let span = tracing::debug_span!("RotationTimer::tick");
                let _handle = span.enter();
                tick();
            }
        });

        tracing::debug!(interval_ms = interval.as_millis(), "Rotation timer started");

        self.active = Some(ActiveTimer { handle, interval });
        Ok(())
    }

    /// Cancel the running timer.
    ///
    /// Returns whether one was running. Calling this on an idle timer is a
    /// no-op, so it can be called any number of times.
    pub fn stop(&mut self) -> bool {
        match self.active.take() {
            Some(timer) => {
                timer.handle.abort();
                tracing::debug!(
                    interval_ms = timer.interval.as_millis(),
                    "Rotation timer stopped"
                );
                true
            }
            None => false,
        }
    }

    /// Current state of the timer
    pub fn state(&self) -> RotationState {
        match &self.active {
            Some(timer) => RotationState::Rotating {
                interval: timer.interval,
            },
            None => RotationState::Idle,
        }
    }

    /// Check if a timer task is running
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for RotationTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
