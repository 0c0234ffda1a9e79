//! System entries and per-tick reporting.
//!
//! Systems run strictly in registration order. There is no removal and no
//! conflict analysis: a system is bound once to a fixed signature and runs
//! on every call to [`Registry::run_systems`](crate::Registry::run_systems).

use engine_component::ComponentTypeId;

use crate::commands::Commands;
use crate::tables::ComponentTables;

pub(crate) type Runner = Box<dyn FnMut(&mut ComponentTables, &mut Commands) -> usize>;

/// One registered update routine bound to a fixed signature.
pub struct SystemEntry {
    /// Human-readable system name (e.g. `"movement"`).
    pub name: String,
    /// Component types the routine requires, in declaration order.
    pub signature: Vec<ComponentTypeId>,
    runner: Runner,
}

impl SystemEntry {
    pub(crate) fn new(name: String, signature: Vec<ComponentTypeId>, runner: Runner) -> Self {
        Self {
            name,
            signature,
            runner,
        }
    }

    /// Returns `true` if this system was registered with exactly `signature`.
    #[must_use]
    pub fn matches(&self, signature: &[ComponentTypeId]) -> bool {
        self.signature == signature
    }

    pub(crate) fn run(&mut self, tables: &mut ComponentTables, commands: &mut Commands) -> SystemRun {
        let fired = (self.runner)(tables, commands);
        SystemRun {
            name: self.name.clone(),
            fired,
        }
    }
}

impl std::fmt::Debug for SystemEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemEntry")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// How often one system fired during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemRun {
    /// The system name.
    pub name: String,
    /// Number of entities the routine was invoked for.
    pub fired: usize,
}

/// Summary of one [`Registry::run_systems`](crate::Registry::run_systems) call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The tick number this report belongs to (1-based).
    pub tick: u64,
    /// One entry per system, in execution order.
    pub systems: Vec<SystemRun>,
    /// Deferred commands applied after the systems ran.
    pub commands_applied: usize,
    /// Entities whose slots were cleared and whose indices were freed.
    pub entities_cleaned: usize,
}

impl TickReport {
    /// Fire count of the first system named `name`.
    #[must_use]
    pub fn fired(&self, name: &str) -> Option<usize> {
        self.systems
            .iter()
            .find(|run| run.name == name)
            .map(|run| run.fired)
    }

    /// Total invocations across all systems.
    #[must_use]
    pub fn total_fired(&self) -> usize {
        self.systems.iter().map(|run| run.fired).sum()
    }
}
