//! `write_file`: create or overwrite a file with the given content.

use std::path::Path;

use fixloop_core::error::ToolError;
use fixloop_core::tool::WriteFileArgs;

use crate::resolve_path;

/// Fixed acknowledgement returned to the model after a successful write.
pub const WRITE_ACK: &str = "File written successfully.";

pub async fn write_file(root: &Path, args: &WriteFileArgs) -> Result<String, ToolError> {
    let path = resolve_path(root, &args.path);
    let file_error = |reason: String| ToolError::File {
        path: args.path.clone(),
        reason,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| file_error(format!("Failed to create directory: {e}")))?;
    }

    tokio::fs::write(&path, &args.content)
        .await
        .map_err(|e| file_error(format!("Failed to write file: {e}")))?;

    Ok(WRITE_ACK.to_string())
}
