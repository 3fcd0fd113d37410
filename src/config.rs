//! Environment-driven settings, read once at startup.

use std::path::PathBuf;

use anyhow::Context;

pub const DEFAULT_HTTP_PORT: u16 = 8501;

#[derive(Debug, Clone, PartialEq)]
pub struct DashConfig {
    pub http_port: u16,
    pub bind: String,
    pub data_dir: PathBuf,
    /// JSON catalog replacing the built-in pages.
    pub pages_file: Option<PathBuf>,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            bind: "0.0.0.0".to_string(),
            data_dir: PathBuf::from("data"),
            pages_file: None,
        }
    }
}

impl DashConfig {
    pub fn from_env() -> anyhow::Result<Self> { Self::from_lookup(|k| std::env::var(k).ok()) }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> anyhow::Result<Self> {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = Self::default();
        if let Some(port) = get("HEALTHDASH_HTTP_PORT") {
            cfg.http_port = port.parse().with_context(|| format!("HEALTHDASH_HTTP_PORT is not a port: '{}'", port))?;
        }
        if let Some(bind) = get("HEALTHDASH_BIND") {
            cfg.bind = bind;
        }
        if let Some(dir) = get("HEALTHDASH_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        cfg.pages_file = get("HEALTHDASH_PAGES").map(PathBuf::from);
        Ok(cfg)
    }

    pub fn addr(&self) -> String { format!("{}:{}", self.bind, self.http_port) }
}
