//! CLI commands.

pub mod init;
pub mod run;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plinth_pipeline::Config;

/// Directory relative config paths are resolved against.
pub fn project_root(config_path: &Path) -> PathBuf {
    let root = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::canonicalize(&root).unwrap_or(root)
}

/// Load configuration from `config_path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(config_path: &Path) -> Result<Config> {
    let root = project_root(config_path);

    if !config_path.exists() {
        tracing::debug!("No {} found, using defaults", config_path.display());
        return Ok(Config::default().with_root(&root));
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let config = Config::from_toml(&content)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    tracing::info!("Loaded config from {}", config_path.display());

    Ok(config.with_root(&root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults_next_to_it() {
        let temp = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap();

        let config = load_config(&temp.path().join("plinth.toml")).unwrap();

        assert_eq!(config.paths.src, root.join("src"));
        assert_eq!(config.paths.dist, root.join("dist"));
    }

    #[test]
    fn reads_config_relative_to_its_directory() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("plinth.toml");
        fs::write(&path, "[paths]\ndist = \"public\"\n").unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.paths.dist, fs::canonicalize(temp.path()).unwrap().join("public"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("plinth.toml");
        fs::write(&path, "[server]\nport = \"not a port\"\n").unwrap();

        let err = load_config(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn bare_file_name_resolves_to_current_directory() {
        let root = project_root(Path::new("plinth.toml"));

        assert_eq!(root, fs::canonicalize(".").unwrap());
    }
}
