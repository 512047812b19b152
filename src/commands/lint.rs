use clap::Args;
use serde::Serialize;

use catalog_rename::docs_audit::LintReport;
use catalog_rename::engine;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct LintArgs {
    /// Walk the tree instead of asking git for the document list
    #[arg(long)]
    no_git: bool,

    /// Show only errors, suppress warnings
    #[arg(long)]
    errors_only: bool,
}

#[derive(Serialize)]
pub struct LintOutput {
    command: &'static str,
    passed: bool,
    #[serde(flatten)]
    report: LintReport,
}

pub fn run(args: LintArgs, global: &GlobalArgs) -> CmdResult<LintOutput> {
    let table = global.table()?;
    let options = global.batch_options(true, !args.no_git)?;

    let mut report = engine::lint(&table, &options)?;
    if args.errors_only {
        report.retain_errors();
    }
    let passed = report.passed();

    Ok((
        LintOutput {
            command: "lint",
            passed,
            report,
        },
        if passed { 0 } else { 1 },
    ))
}
