/// Macro for prefixed status logging to stderr.
///
/// Usage:
/// ```ignore
/// log_status!("rename", "Moving {} -> {}", from, to);
/// log_status!("check", "{} violations", count);
/// ```
#[macro_export]
macro_rules! log_status {
    ($prefix:expr, $($arg:tt)*) => {
        eprintln!(concat!("[", $prefix, "] {}"), format_args!($($arg)*))
    };
}

pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `catalog_rename::engine` instead of `catalog_rename::core::engine`
pub use core::*;
