//! `sitekit_io_fs`:
//! directory-tree copy engine used to assemble deployment bundles.
//!
//! - `copy`   : traversal and copy orchestration
//! - `spec`   : strategies, options and errors
//! - `report` : per-run report model
//! - `util`   : pattern matching, path safety and file helpers

pub mod copy;
pub mod report;
pub mod spec;
mod util;

pub use copy::copy_tree;
pub use report::ReportCopy;
pub use spec::{
    CopyTreeError, EnumCopyDirectoryConflictStrategy, EnumCopyFileConflictStrategy,
    EnumCopyPatternMode, EnumCopySymlinkStrategy, SpecCopyError, SpecCopyOptions,
};
pub use util::copy_file_with_metadata;
