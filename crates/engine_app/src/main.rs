//! # engine_app
//!
//! Runs the ECS simulation on its own thread and feeds it from a UDP
//! transport running on tokio.
//!
//! ## Startup Sequence
//!
//! 1. Parse [`AppConfig`] from flags and `ENGINE_*` variables.
//! 2. Start the simulation thread; it builds the registry and enters the
//!    fixed-timestep tick loop.
//! 3. Bind the transport and receive until interrupted, or until the
//!    simulation finishes its configured tick count.

mod components;
mod config;
mod messages;
mod tick;

use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use engine_ecs::Registry;
use engine_net::{Event, EventQueue, Reassembler, Transport};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use messages::Payload;
use tick::{TickConfig, TickLoop};

const DEFAULT_LOG_FILTER: &str = "engine_app=info,engine_net=info";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = AppConfig::parse();
    config.validate()?;
    info!(?config, "engine starting");

    let queue = Arc::new(EventQueue::new());
    let finished = spawn_simulation(config.tick_config(), Arc::clone(&queue))?;

    let transport = Transport::bind(
        config.bind_addr,
        messages::decoders(),
        Reassembler::new(config.max_pending_fragments)
            .with_max_fragments(config.max_fragments)
            .with_max_buffered_bytes(config.max_reassembly_bytes),
        queue,
    )
    .await
    .with_context(|| format!("binding {}", config.bind_addr))?;

    tokio::select! {
        result = transport.run() => result.context("transport failed")?,
        result = finished => {
            result.context("simulation thread panicked")??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for ctrl-c")?;
            info!("shutdown requested");
        }
    }

    info!("engine shut down");
    Ok(())
}

/// Start the tick loop on a dedicated thread. The receiver resolves when
/// the loop returns.
fn spawn_simulation(
    config: TickConfig,
    queue: Arc<EventQueue<Event<Payload>>>,
) -> Result<oneshot::Receiver<Result<()>>> {
    let (done_tx, done_rx) = oneshot::channel();
    thread::Builder::new()
        .name("simulation".into())
        .spawn(move || {
            let mut registry = Registry::new();
            components::install(&mut registry);

            let mut tick_loop = TickLoop::new(config, registry, queue, messages::apply);
            let outcome = tick_loop.run();

            if done_tx.send(outcome).is_err() {
                warn!("simulation finished after shutdown");
            }
        })
        .context("spawning simulation thread")?;
    Ok(done_rx)
}
