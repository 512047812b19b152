use std::path::{Path, PathBuf};

use catalog_rename::catalog::MappingTable;
use catalog_rename::docs_audit::DEFAULT_EXEMPT;
use catalog_rename::engine::BatchOptions;

pub type CmdResult<T> = catalog_rename::Result<(T, i32)>;

/// Flags shared by every subcommand.
pub(crate) struct GlobalArgs {
    pub root: String,
    pub table: Option<String>,
    pub exempt: Vec<String>,
}

impl GlobalArgs {
    /// The catalog root, `~` expanded. Must be an existing directory.
    pub fn root(&self) -> catalog_rename::Result<PathBuf> {
        let root = PathBuf::from(shellexpand::tilde(&self.root).to_string());
        if !root.is_dir() {
            return Err(catalog_rename::Error::validation_invalid_argument(
                "root",
                format!("Not a directory: {}", root.display()),
                None,
                None,
            ));
        }
        Ok(root)
    }

    /// The `--table` override, or the embedded table.
    pub fn table(&self) -> catalog_rename::Result<MappingTable> {
        match &self.table {
            Some(path) => {
                let expanded = shellexpand::tilde(path).to_string();
                MappingTable::load(Some(Path::new(&expanded)))
            }
            None => MappingTable::load(None),
        }
    }

    pub fn table_source(&self) -> String {
        self.table.clone().unwrap_or_else(|| "builtin".to_string())
    }

    /// `--exempt` globs; the defaults apply only when none are given.
    pub fn exempt(&self) -> Vec<String> {
        if self.exempt.is_empty() {
            DEFAULT_EXEMPT.iter().map(|s| s.to_string()).collect()
        } else {
            self.exempt.clone()
        }
    }

    pub fn batch_options(&self, dry_run: bool, use_git: bool) -> catalog_rename::Result<BatchOptions> {
        Ok(BatchOptions {
            root: self.root()?,
            dry_run,
            use_git,
            exempt: self.exempt(),
        })
    }
}

pub mod check;
pub mod lint;
pub mod run;
pub mod table;

macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (catalog_rename::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Check(args) => dispatch!(args, global, check),
        crate::Commands::Table(args) => dispatch!(args, global, table),
        crate::Commands::Lint(args) => dispatch!(args, global, lint),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(root: &str) -> GlobalArgs {
        GlobalArgs {
            root: root.to_string(),
            table: None,
            exempt: Vec::new(),
        }
    }

    #[test]
    fn default_exempt_applies_when_none_given() {
        assert_eq!(
            global(".").exempt(),
            vec!["PATTERN_MIGRATION_GUIDE.md", "pattern-spec.md"]
        );

        let mut custom = global(".");
        custom.exempt = vec!["docs/legacy/*.md".to_string()];
        assert_eq!(custom.exempt(), vec!["docs/legacy/*.md"]);
    }

    #[test]
    fn missing_root_is_a_validation_error() {
        let err = global("/definitely/not/here").root().unwrap_err();
        assert_eq!(err.code, catalog_rename::ErrorCode::ValidationInvalidArgument);
    }

    #[test]
    fn builtin_table_is_used_without_override() {
        let table = global(".").table().unwrap();
        assert_eq!(table, MappingTable::builtin());
        assert_eq!(global(".").table_source(), "builtin");
    }
}
