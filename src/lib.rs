pub mod checks;
pub mod cli;
pub mod config;
pub mod confirm;
pub mod error;
pub mod executor;
pub mod migrate;
pub mod tasks;

use std::io::BufRead;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{FmtSubscriber, filter::LevelFilter};

use crate::checks::PreflightChecker;
use crate::config::{AptPaths, HostFacts};
use crate::executor::CommandExecutor;
use crate::migrate::SourceMigrator;
use crate::tasks::{MaintenanceTask, TaskRunner};

pub use crate::error::RhinoError;

pub fn init_logging(log_level: cli::LogLevel) -> Result<()> {
    let filter = match log_level {
        cli::LogLevel::Trace => LevelFilter::TRACE,
        cli::LogLevel::Debug => LevelFilter::DEBUG,
        cli::LogLevel::Info => LevelFilter::INFO,
        cli::LogLevel::Warn => LevelFilter::WARN,
        cli::LogLevel::Error => LevelFilter::ERROR,
    };

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_max_level(filter).finish(),
    )
    .context("failed to set global default tracing subscriber")
}

/// One migration run: preflight checks, confirmation, sources swap and
/// the apt maintenance sequence, strictly in that order.
///
/// Paths and host facts are plain data so integration tests can point a
/// run at a temporary directory with synthetic facts and a fake executor.
pub struct Migration {
    pub paths: AptPaths,
    pub facts: HostFacts,
    /// Bypass the confirmation prompt.
    pub force: bool,
    /// Bypass the desktop package scan.
    pub skip_desktop_check: bool,
}

impl Migration {
    /// Builds a migration against the live host from parsed CLI flags.
    pub fn from_cli(args: &cli::Cli) -> Self {
        Self {
            paths: AptPaths::default(),
            facts: HostFacts::current(),
            force: args.force,
            skip_desktop_check: args.docker,
        }
    }

    /// Drives the whole workflow.
    ///
    /// Each stage runs only if the previous one did not halt. Any `Err`
    /// before the migrate stage guarantees that nothing on disk has been
    /// mutated; see [`RhinoError`] for the one exception.
    pub fn run(
        &self,
        executor: Arc<dyn CommandExecutor>,
        input: &mut dyn BufRead,
    ) -> Result<(), RhinoError> {
        let checker = PreflightChecker::new(
            executor.as_ref(),
            self.facts.clone(),
            self.paths.clone(),
            self.skip_desktop_check,
        );
        let snapshot = checker.run()?;

        confirm::confirm(self.force, input)?;

        info!("switching to the devel series");
        let migrator = SourceMigrator::new(self.paths.sources_list.clone());
        migrator.migrate(&snapshot.sources_content, &snapshot.codename)?;

        TaskRunner::new(executor).run(&MaintenanceTask::sequence());

        info!("your rolling rhino is ready");
        Ok(())
    }
}
