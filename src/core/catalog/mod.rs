//! The rename catalog: the mapping table and heading anchors.

pub mod anchor;
mod builtin;
mod table;

pub use anchor::{extract_headings, heading_anchor, Heading};
pub use table::{ChainedRecord, DirectoryRenameRecord, MappingTable, RecordKind, RenameRecord};

pub(crate) use table::contains_word;
