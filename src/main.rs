use std::io;
use std::process;
use std::sync::Arc;

use anyhow::Result;
use tracing::error;

use rolling_rhino::executor::RealCommandExecutor;
use rolling_rhino::{Migration, cli, init_logging};

fn main() -> Result<()> {
    let args = cli::parse_args()?;
    init_logging(args.log_level)?;

    println!("Rolling Rhino 🦏");

    let migration = Migration::from_cli(&args);
    let executor = Arc::new(RealCommandExecutor);
    let mut input = io::stdin().lock();

    if let Err(e) = migration.run(executor, &mut input) {
        error!("{}", e);
        process::exit(1);
    }

    Ok(())
}
