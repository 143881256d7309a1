//! Idle gap synthesis.
//!
//! An operator pause has no closing key event, so after every release a
//! timer emits `LongGap` ticks at a fixed period until the next press or
//! until the tick limit is reached.
//!
//! Each restart or cancel bumps a generation counter. Ticks carry the
//! generation they were scheduled under and the sink drops stale ones.
//! When the synthesizer lives behind the same lock the sink takes to
//! deliver, no tick can be delivered once `cancel` has returned.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Receives synthetic gap ticks.
pub trait GapSink: Send + Sync + 'static {
    /// Deliver one tick scheduled under `generation`.
    ///
    /// Returns `false` if the tick is stale, which ends the timer task.
    fn deliver_tick(&self, generation: u64) -> bool;
}

/// Cancellable repeating `LongGap` timer.
#[derive(Debug)]
pub struct IdleGapSynthesizer {
    period: Duration,
    tick_limit: u32,
    runtime: Handle,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl IdleGapSynthesizer {
    /// `period` must be non-zero.
    pub fn new(period: Duration, tick_limit: u32, runtime: Handle) -> Self {
        Self {
            period,
            tick_limit,
            runtime,
            generation: 0,
            task: None,
        }
    }

    /// Generation that ticks must carry to be delivered.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.task.is_some() && self.generation == generation
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel any running timer and start a new one.
    ///
    /// The first tick fires one full period from now.
    pub fn restart(&mut self, sink: Arc<dyn GapSink>) {
        self.cancel();
        if self.tick_limit == 0 {
            return;
        }

        let generation = self.generation;
        let period = self.period;
        let limit = self.tick_limit;
        let start = Instant::now() + period;

        self.task = Some(self.runtime.spawn(async move {
            let mut ticks = time::interval_at(start, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            for n in 1..=limit {
                ticks.tick().await;
                if !sink.deliver_tick(generation) {
                    tracing::trace!(generation, "Stale idle tick dropped");
                    return;
                }
                tracing::trace!(generation, tick = n, limit, "Idle tick delivered");
            }
        }));
    }

    /// Stop the running timer, if any. Pending ticks are suppressed.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for IdleGapSynthesizer {
    fn drop(&mut self) {
        self.cancel();
    }
}
