//! Workspace-confined path validation

use std::path::{Path, PathBuf};

/// A path that escaped the workspace
#[derive(Debug, Clone)]
pub struct PathValidationError {
    pub path: String,
    pub workspace: String,
}

impl std::fmt::Display for PathValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "path {} is outside workspace {}",
            self.path, self.workspace
        )
    }
}

impl std::error::Error for PathValidationError {}

/// Resolve a tool-supplied path and require it to stay inside the
/// workspace.
///
/// Relative paths are joined to the workspace root, `~/` expands to the
/// home directory, existing paths are canonicalized (resolving
/// symlinks), and non-existent targets are resolved through their
/// nearest existing ancestor so a write into a fresh subdirectory still
/// validates.
pub async fn validate_workspace_path(
    path: &str,
    workspace_root: &Path,
) -> Result<PathBuf, PathValidationError> {
    let expanded = if !path.starts_with('/') && !path.starts_with('~') {
        workspace_root.join(path)
    } else {
        expand_tilde(path)
    };

    let absolute = if expanded.exists() {
        tokio::fs::canonicalize(&expanded)
            .await
            .unwrap_or_else(|_| expanded.clone())
    } else {
        resolve_through_ancestor(&expanded).await
    };

    let canonical_root = tokio::fs::canonicalize(workspace_root)
        .await
        .unwrap_or_else(|_| workspace_root.to_path_buf());

    if absolute.starts_with(&canonical_root) || absolute.starts_with(workspace_root) {
        Ok(absolute)
    } else {
        Err(PathValidationError {
            path: path.to_string(),
            workspace: workspace_root.display().to_string(),
        })
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Canonicalize the nearest existing ancestor and re-attach the
/// remaining components.
async fn resolve_through_ancestor(path: &Path) -> PathBuf {
    let mut ancestor = path.to_path_buf();
    let mut tail: Vec<std::ffi::OsString> = Vec::new();

    while !ancestor.exists() {
        match (ancestor.file_name(), ancestor.parent()) {
            (Some(name), Some(parent)) => {
                tail.push(name.to_os_string());
                ancestor = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }

    let mut resolved = tokio::fs::canonicalize(&ancestor)
        .await
        .unwrap_or(ancestor);
    for component in tail.iter().rev() {
        resolved.push(component);
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_relative_path_joins_workspace() {
        let dir = TempDir::new().unwrap();
        let resolved = validate_workspace_path("notes.txt", dir.path())
            .await
            .unwrap();
        assert!(resolved.ends_with("notes.txt"));
        assert!(resolved.starts_with(
            tokio::fs::canonicalize(dir.path())
                .await
                .unwrap_or_else(|_| dir.path().to_path_buf())
        ) || resolved.starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_nested_new_path_validates() {
        let dir = TempDir::new().unwrap();
        let resolved = validate_workspace_path("a/b/c.txt", dir.path())
            .await
            .unwrap();
        assert!(resolved.ends_with("a/b/c.txt"));
    }

    #[tokio::test]
    async fn test_absolute_path_outside_workspace_rejected() {
        let workspace = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("secret.txt");
        std::fs::write(&target, "x").unwrap();

        let result = validate_workspace_path(target.to_str().unwrap(), workspace.path()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("outside workspace"));
    }

    #[tokio::test]
    async fn test_parent_traversal_rejected() {
        let workspace = TempDir::new().unwrap();
        let result = validate_workspace_path("../escape.txt", workspace.path()).await;
        assert!(result.is_err());
    }
}
