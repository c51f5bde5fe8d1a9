//! Extension configuration loaded via OrthoConfig.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::DEFAULT_NOTICE_TTL;

/// Settings shared by every execution context of the extension.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TAG_HELPER")]
pub struct ExtensionSettings {
    /// Directory for the JSON file store; in-memory storage when unset.
    pub storage_dir: Option<PathBuf>,
    /// How long notices stay visible, in milliseconds.
    pub notice_ttl_ms: Option<u64>,
    /// Emit logs as JSON lines instead of human-readable text.
    #[ortho_config(default = false)]
    pub json_logs: bool,
}

impl ExtensionSettings {
    /// Configured notice lifetime, falling back to three seconds.
    pub fn notice_ttl(&self) -> Duration {
        self.notice_ttl_ms
            .map_or(DEFAULT_NOTICE_TTL, Duration::from_millis)
    }
}
