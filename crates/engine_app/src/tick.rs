//! Simulation tick loop.
//!
//! Each tick:
//!
//! 1. Drain the event queue and apply every event to the registry.
//! 2. Run all systems in registration order.
//! 3. Apply deferred commands and clean up dead entities.
//!
//! Steps 2 and 3 are [`Registry::run_systems`]. The registry never leaves
//! the thread running this loop; the queue is the only shared state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, ensure};
use engine_ecs::{Registry, TickReport};
use engine_net::{Event, EventQueue};
use tracing::{debug, info, warn};

/// Slowest accepted tick rate, in ticks per second.
pub const MIN_TICK_RATE: f64 = 0.001;

/// Fastest accepted tick rate, in ticks per second.
pub const MAX_TICK_RATE: f64 = 10_000.0;

/// Configuration for the tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl TickConfig {
    /// Time budget of one tick.
    ///
    /// # Errors
    ///
    /// Fails if the rate is not a positive number small enough to give a
    /// representable duration.
    pub fn tick_duration(&self) -> anyhow::Result<Duration> {
        ensure!(
            self.tick_rate > 0.0,
            "tick rate must be positive, got {}",
            self.tick_rate
        );
        Duration::try_from_secs_f64(1.0 / self.tick_rate)
            .with_context(|| format!("tick rate {} has no usable period", self.tick_rate))
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

/// Result of applying one batch of drained events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventsApplied {
    /// Events the handler accepted.
    pub applied: usize,
    /// Events the handler rejected; each was logged and skipped.
    pub failed: usize,
}

/// Owns the registry and drives it from the event queue.
pub struct TickLoop<P, H> {
    tick_id: u64,
    config: TickConfig,
    registry: Registry,
    queue: Arc<EventQueue<Event<P>>>,
    handler: H,
}

impl<P, H> TickLoop<P, H>
where
    H: FnMut(&mut Registry, Event<P>) -> anyhow::Result<()>,
{
    /// `handler` applies a single event; its errors are logged and skipped.
    #[must_use]
    pub fn new(
        config: TickConfig,
        registry: Registry,
        queue: Arc<EventQueue<Event<P>>>,
        handler: H,
    ) -> Self {
        Self {
            tick_id: 0,
            config,
            registry,
            queue,
            handler,
        }
    }

    /// Number of ticks run so far.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Drain the queue and apply everything in it, in arrival order.
    pub fn apply_pending_events(&mut self) -> EventsApplied {
        let mut outcome = EventsApplied::default();
        for event in self.queue.drain_all() {
            let (tag, sender, packet_id) = (event.type_tag, event.sender, event.packet_id);
            match (self.handler)(&mut self.registry, event) {
                Ok(()) => outcome.applied += 1,
                Err(e) => {
                    outcome.failed += 1;
                    warn!(tick_id = self.tick_id, tag, %sender, packet_id, error = %e, "failed to apply event");
                }
            }
        }
        outcome
    }

    /// Run one full tick.
    pub fn tick(&mut self) -> TickReport {
        self.tick_id += 1;
        let events = self.apply_pending_events();
        let report = self.registry.run_systems();
        debug!(
            tick_id = self.tick_id,
            events = events.applied,
            failed = events.failed,
            fired = report.total_fired(),
            cleaned = report.entities_cleaned,
            entities = self.registry.entity_count(),
            "tick complete"
        );
        report
    }

    /// Run at the configured rate until `max_ticks` is reached, or forever.
    ///
    /// # Errors
    ///
    /// Fails before the first tick if the tick rate is unusable.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let tick_duration = self.config.tick_duration()?;
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            systems = self.registry.system_count(),
            "starting tick loop"
        );

        loop {
            let start = Instant::now();
            self.tick();

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                return Ok(());
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}

impl<P, H> std::fmt::Debug for TickLoop<P, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickLoop")
            .field("tick_id", &self.tick_id)
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("queued_events", &self.queue.len())
            .finish_non_exhaustive()
    }
}
