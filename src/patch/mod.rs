//! Source and manifest patching.
//!
//! Patch functions are pure: they take the current text and return the
//! new text plus a summary. [`write_file`] is the only step that touches
//! disk, so every patch can be previewed first.

pub mod manifest;
pub mod presets;
pub mod source;

pub use manifest::{
    bump_version, update_manifest, Bump, ManifestOutcome, ManifestUpdate, VersionChange,
};
pub use source::{add_tool_blocks, insert_before_anchor, CaseSpec, PatchOutcome, ToolPatch};

use crate::error::Result;
use std::path::Path;

/// Overwrite `path` with `text`.
///
/// Not transactional and not read back: a failure partway through can
/// leave the file truncated.
pub fn write_file(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text)?;
    tracing::info!(path = %path.display(), bytes = text.len(), "File written");
    Ok(())
}

/// Line counts of `before` and `after`, for dry-run previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeStats {
    pub lines_before: usize,
    pub lines_after: usize,
}

impl ChangeStats {
    pub fn between(before: &str, after: &str) -> Self {
        Self {
            lines_before: before.lines().count(),
            lines_after: after.lines().count(),
        }
    }

    pub fn lines_added(&self) -> isize {
        self.lines_after as isize - self.lines_before as isize
    }
}
