//! Tool name → [`ToolKind`] lookup.

use crate::models::tool_call::ToolKind;

/// Classify a tool by name for client iconography.
///
/// Matching is exact and case-sensitive. Unrecognised names map to
/// [`ToolKind::Other`].
#[must_use]
pub fn classify(tool_name: &str) -> ToolKind {
    match tool_name {
        "terminal" | "execute_bash" | "bash" | "shell" | "execute_ipython_cell" => {
            ToolKind::Execute
        }
        "file_editor" | "str_replace_editor" | "edit_file" | "write_file" | "apply_patch" => {
            ToolKind::Edit
        }
        "read_file" | "view" | "list_directory" => ToolKind::Read,
        "grep" | "glob" | "find" | "search" => ToolKind::Search,
        _ => ToolKind::Other,
    }
}
