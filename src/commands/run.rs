use clap::Args;
use serde::Serialize;

use catalog_rename::engine::{self, BatchReport};

use super::{CmdResult, GlobalArgs};

#[derive(Args, Default)]
pub struct RunArgs {
    /// Compute every edit and move and validate the result, but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Ignore git: walk the tree for documents and move with the filesystem
    #[arg(long)]
    pub no_git: bool,
}

#[derive(Serialize)]
pub struct RunOutput {
    command: &'static str,
    table: String,
    #[serde(flatten)]
    report: BatchReport,
}

pub fn run(args: RunArgs, global: &GlobalArgs) -> CmdResult<RunOutput> {
    let table = global.table()?;
    let options = global.batch_options(args.dry_run, !args.no_git)?;

    let report = engine::run(&table, &options)?;
    let exit_code = if report.passed() { 0 } else { 1 };

    Ok((
        RunOutput {
            command: "run",
            table: global.table_source(),
            report,
        },
        exit_code,
    ))
}
