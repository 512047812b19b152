use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;

use commands::{check, lint, run, table};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "catalog-rename")]
#[command(version = VERSION)]
#[command(about = "Rename patterns and antipatterns across a markdown catalog")]
struct Cli {
    /// Catalog root directory
    #[arg(long, global = true, default_value = ".")]
    root: String,

    /// Mapping table override (JSON with `records` and `directories`)
    #[arg(long, global = true, value_name = "FILE")]
    table: Option<String>,

    /// Documents to leave alone (glob, repeatable); defaults to the migration guide and naming convention docs
    #[arg(long, global = true, value_name = "GLOB")]
    exempt: Vec<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite documents, move directories, then validate (default)
    Run(run::RunArgs),
    /// Validate the tree against the table without changing anything
    Check(check::CheckArgs),
    /// Print the effective mapping table and its precondition status
    Table(table::TableArgs),
    /// Lint new names against the naming convention
    Lint(lint::LintArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs {
        root: cli.root,
        table: cli.table,
        exempt: cli.exempt,
    };
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Run(run::RunArgs::default()));

    let (json_result, exit_code) = commands::run_json(command, &global);
    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
