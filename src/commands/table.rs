use clap::Args;
use serde::Serialize;

use catalog_rename::catalog::{ChainedRecord, MappingTable};
use catalog_rename::error::PreconditionProblem;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct TableArgs {}

#[derive(Serialize)]
pub struct TableOutput {
    command: &'static str,
    source: String,
    valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    problems: Vec<PreconditionProblem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    chained: Vec<ChainedRecord>,
    table: MappingTable,
}

/// Print the effective table. Only the table's own invariants are checked;
/// the tree is not read.
pub fn run(_args: TableArgs, global: &GlobalArgs) -> CmdResult<TableOutput> {
    let table = global.table()?;
    let problems = table.problems();
    let chained = table.chained_records();
    let valid = problems.is_empty();

    Ok((
        TableOutput {
            command: "table",
            source: global.table_source(),
            valid,
            problems,
            chained,
            table,
        },
        if valid { 0 } else { 3 },
    ))
}
