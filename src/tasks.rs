//! Post-migration apt maintenance tasks.
//!
//! After the sources file has been switched, apt is driven through a
//! fixed cleanup/upgrade sequence. The subcommands are independently
//! useful, so a single failing task (say, a network hiccup during
//! `update`) is logged and the runner carries on with the rest.

use std::sync::Arc;

use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::{info, warn};

use crate::executor::{CommandExecutor, CommandSpec};

/// One apt maintenance subcommand, executed for side effect only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum MaintenanceTask {
    Autoclean,
    Clean,
    Update,
    DistUpgrade,
    Autoremove,
}

impl MaintenanceTask {
    /// The full migration sequence, in execution order.
    pub fn sequence() -> Vec<MaintenanceTask> {
        MaintenanceTask::iter().collect()
    }
}

/// Executes maintenance tasks strictly in order, tolerating per-task
/// failure.
pub struct TaskRunner {
    executor: Arc<dyn CommandExecutor>,
}

impl TaskRunner {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Runs every task in the given order.
    ///
    /// A non-zero exit or a failed spawn is logged and the next task is
    /// attempted anyway; every task is reported as finished regardless
    /// of its outcome.
    pub fn run(&self, tasks: &[MaintenanceTask]) {
        for task in tasks {
            let spec = CommandSpec::new("apt", ["-y".to_string(), task.to_string()]);
            let result = self.executor.run(&spec);
            if !result.success() {
                match result.code() {
                    Some(code) => {
                        warn!("apt {} failed with exit code {}, but continuing", task, code);
                    }
                    None => warn!("apt {} could not be run, but continuing", task),
                }
            }
            info!("finished task: {}", task);
        }
    }
}
