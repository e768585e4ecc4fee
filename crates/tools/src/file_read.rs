//! `read_file`: return a file's contents as text.

use std::path::Path;

use fixloop_core::error::ToolError;
use fixloop_core::tool::ReadFileArgs;

use crate::resolve_path;

pub async fn read_file(root: &Path, args: &ReadFileArgs) -> Result<String, ToolError> {
    let path = resolve_path(root, &args.path);
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ToolError::File {
            path: args.path.clone(),
            reason: format!("Failed to read file: {e}"),
        })
}
