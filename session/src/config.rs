//! Session configuration.

use crate::SessionResult;
use serde::Deserialize;

/// Settings of one session.
///
/// ```toml
/// base_url = "http://localhost:7474"
/// load_depth = 1
/// save_depth = -1
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Server root; the transactional endpoint lives below it.
    pub base_url: String,
    /// Depth of `load` and `load_all` when none is given.
    pub load_depth: i32,
    /// Depth of `save` when none is given. -1 saves everything reachable.
    pub save_depth: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7474".to_string(),
            load_depth: 1,
            save_depth: 1,
        }
    }
}

impl SessionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_load_depth(mut self, depth: i32) -> Self {
        self.load_depth = depth;
        self
    }

    pub fn with_save_depth(mut self, depth: i32) -> Self {
        self.save_depth = depth;
        self
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> SessionResult<Self> {
        Ok(toml::from_str(text)?)
    }
}
