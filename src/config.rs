use crate::error::CanopyError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the tree controller. Loaded from TOML by the embedding
/// application; defaults match the original client behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// How long the user must stay on a path before the visit is committed
    /// to the server-side recent-notes list. Rapid navigation within this
    /// window supersedes the pending recording.
    pub recent_note_delay_ms: u64,
    /// Title given to freshly created notes before the user renames them.
    pub new_note_title: String,
}

impl Default for TreeConfig {
    fn default() -> TreeConfig {
        TreeConfig {
            recent_note_delay_ms: 1500,
            new_note_title: "new note".to_string(),
        }
    }
}

impl TreeConfig {
    pub fn from_toml(content: &str) -> Result<TreeConfig, CanopyError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, CanopyError> {
        Ok(toml::to_string(self)?)
    }

    pub fn recent_note_delay(&self) -> Duration {
        Duration::from_millis(self.recent_note_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let config = TreeConfig::default();
        let serialized = config.to_toml().unwrap();
        assert_eq!(TreeConfig::from_toml(&serialized).unwrap(), config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = TreeConfig::from_toml("recent_note_delay_ms = 200\n").unwrap();
        assert_eq!(config.recent_note_delay(), Duration::from_millis(200));
        assert_eq!(config.new_note_title, "new note");
    }
}
