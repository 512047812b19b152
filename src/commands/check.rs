use clap::Args;
use serde::Serialize;

use catalog_rename::docs_audit::{AuditSummary, Violation};
use catalog_rename::engine;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct CheckArgs {
    /// Walk the tree instead of asking git for the document list
    #[arg(long)]
    no_git: bool,
}

#[derive(Serialize)]
pub struct CheckOutput {
    command: &'static str,
    passed: bool,
    summary: AuditSummary,
    violations: Vec<Violation>,
}

pub fn run(args: CheckArgs, global: &GlobalArgs) -> CmdResult<CheckOutput> {
    let table = global.table()?;
    let options = global.batch_options(true, !args.no_git)?;

    let (summary, violations) = engine::check(&table, &options)?;
    let passed = violations.is_empty();

    Ok((
        CheckOutput {
            command: "check",
            passed,
            summary,
            violations,
        },
        if passed { 0 } else { 1 },
    ))
}
