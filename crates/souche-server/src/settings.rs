//! Server configuration: an optional TOML file overlaid by `SOUCHE_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use souche_core::{gesture::EditCapability, layout::LayoutConfig, recorder::ActorPolicy};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  pub can_edit:         bool,
  pub synthetic_actors: Vec<String>,
  pub layout:           LayoutConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "127.0.0.1".to_string(),
      port:             8080,
      store_path:       PathBuf::from("souche.db"),
      can_edit:         true,
      synthetic_actors: vec!["test-user".to_string()],
      layout:           LayoutConfig::default(),
    }
  }
}

impl ServerConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SOUCHE")
          .separator("__")
          .list_separator(",")
          .with_list_parse_key("synthetic_actors")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn capability(&self) -> EditCapability { EditCapability::from_flag(self.can_edit) }

  pub fn actor_policy(&self) -> ActorPolicy {
    ActorPolicy::new(self.synthetic_actors.iter().cloned())
  }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn from_toml(src: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(src, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_yields_defaults() {
    let cfg = from_toml("");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.store_path, PathBuf::from("souche.db"));
    assert!(cfg.capability().can_edit());
    assert_eq!(cfg.layout, LayoutConfig::default());
  }

  #[test]
  fn partial_layout_keeps_other_defaults() {
    let cfg = from_toml(
      r#"
      can_edit = false
      synthetic_actors = ["bot", "test-user"]

      [layout]
      node_spacing = 240.0
      "#,
    );
    assert!(!cfg.capability().can_edit());
    assert_eq!(cfg.layout.node_spacing, 240.0);
    assert_eq!(cfg.layout.level_height, LayoutConfig::default().level_height);
    assert!(cfg.actor_policy().is_synthetic(&"bot".into()));
  }

  #[test]
  fn missing_file_is_not_an_error() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/souche.toml")).unwrap();
    assert_eq!(cfg.port, 8080);
  }

  #[test]
  fn relative_path_is_unchanged() {
    assert_eq!(expand_tilde(Path::new("data/souche.db")), PathBuf::from("data/souche.db"));
  }
}
