//! # engine_ecs
//!
//! The entity-component registry and its system scheduler.
//!
//! This crate provides:
//!
//! - [`Registry`]: owns one component table per type, the system list and
//!   the deferred-death queue.
//! - [`ComponentSet`], [`SystemFn`], [`EntitySystemFn`]: how closures over
//!   `(T1, …, Tn)` become systems.
//! - [`Commands`]: deferred mutations recorded by systems.
//! - [`TickReport`]: per-tick fire counts and cleanup totals.
//! - [`RegistryError`]: fallible lookup errors.

pub mod commands;
pub mod error;
pub mod query;
pub mod registry;
pub mod scheduler;
pub mod tables;

pub use commands::Commands;
pub use error::RegistryError;
pub use query::{ComponentSet, EntitySystemFn, SystemFn};
pub use registry::Registry;
pub use scheduler::{SystemEntry, SystemRun, TickReport};
pub use tables::ComponentTables;

pub use engine_component::{Component, ComponentTypeId, Entity, SparseArray};
