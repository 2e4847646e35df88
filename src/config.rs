use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub backend: BackendConfig,
  /// Custom title for the dashboard header. Read by the embedding view
  /// layer, not by this crate; it defaults to the backend domain there.
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
  /// Base url of the hosted table store, e.g. https://xyz.supabase.co
  pub url: String,
  /// Table holding the classes collection
  #[serde(default = "default_classes_table")]
  pub classes_table: String,
}

fn default_classes_table() -> String {
  "classes".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./classdeck.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/classdeck/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/classdeck/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("classdeck.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("classdeck").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the backend API key from environment variables.
  ///
  /// Checks CLASSDECK_API_KEY first, then SUPABASE_ANON_KEY as fallback.
  pub fn get_api_key() -> Result<String> {
    std::env::var("CLASSDECK_API_KEY")
      .or_else(|_| std::env::var("SUPABASE_ANON_KEY"))
      .map_err(|_| {
        eyre!("Backend API key not found. Set CLASSDECK_API_KEY or SUPABASE_ANON_KEY environment variable.")
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_minimal_config() {
    let config: Config = serde_yaml::from_str(
      "backend:\n  url: https://example.supabase.co\n",
    )
    .unwrap();
    assert_eq!(config.backend.url, "https://example.supabase.co");
    assert_eq!(config.backend.classes_table, "classes");
    assert!(config.title.is_none());
  }

  #[test]
  fn table_name_can_be_overridden() {
    let config: Config = serde_yaml::from_str(
      "backend:\n  url: https://example.supabase.co\n  classes_table: my_classes\ntitle: Homeroom\n",
    )
    .unwrap();
    assert_eq!(config.backend.classes_table, "my_classes");
    assert_eq!(config.title.as_deref(), Some("Homeroom"));
  }
}
