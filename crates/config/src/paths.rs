//! Path helpers for OpenCoder data

use std::path::PathBuf;

/// Data directory (~/.opencoder)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".opencoder")
}

/// Configuration file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Fallback tool workspace when not running inside a project directory
pub fn workspace_path() -> PathBuf {
    data_dir().join("workspace")
}

/// Persistent memory store location
pub fn memory_path() -> PathBuf {
    data_dir().join("memory.json")
}

/// Ensure directory exists
pub async fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_rooted_in_data_dir() {
        let root = data_dir();
        assert!(config_path().starts_with(&root));
        assert!(workspace_path().starts_with(&root));
        assert!(memory_path().starts_with(&root));
    }
}
