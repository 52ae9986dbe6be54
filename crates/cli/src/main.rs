//! `pkgscope`: inspect the package manager and workspaces of a JavaScript monorepo.

// Command output is the point of this binary
#![allow(clippy::print_stdout)]

mod cli;
mod commands;
mod tracing;

use crate::commands::Context;
use crate::tracing::TracingConfig;

fn main() -> miette::Result<()> {
    let cli = cli::parse();

    crate::tracing::init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
    })?;

    let ctx = Context::new(&cli)?;
    let output = commands::execute(cli.command, &ctx)?;

    if !output.is_empty() {
        println!("{output}");
    }

    Ok(())
}
