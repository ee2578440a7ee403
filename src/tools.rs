use std::path::{Path, PathBuf};

/// Finds an external tool by name on PATH, or checks it directly when given as a path.
pub fn locate(tool: &str) -> Option<PathBuf> {
    let tool = tool.trim();
    if tool.is_empty() {
        return None;
    }
    match which::which(tool) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::debug!(tool, error = %e, "tool lookup failed");
            None
        }
    }
}

/// True when the setting names a file rather than a bare program name.
pub fn is_explicit_path(tool: &str) -> bool {
    let p = Path::new(tool);
    p.is_absolute() || p.components().count() > 1
}
