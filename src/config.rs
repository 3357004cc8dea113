use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// ConfigFile: deserialized from TOML (all fields optional)
// ---------------------------------------------------------------------------

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub spread: Option<bool>,
    pub fullscreen: Option<bool>,
    #[serde(default)]
    pub viewer: ViewerConfigFile,
    #[serde(default)]
    pub extract: ExtractConfigFile,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfigFile {
    pub scroll_step: Option<u32>,
    pub overlay_ms: Option<u64>,
    pub frame_budget_ms: Option<u64>,
    pub watch_interval_ms: Option<u64>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ExtractConfigFile {
    pub command: Option<String>,
}

// ---------------------------------------------------------------------------
// Config: resolved (all fields concrete)
// ---------------------------------------------------------------------------

pub struct Config {
    pub spread: bool,
    pub fullscreen: bool,
    pub viewer: ViewerConfig,
    pub extract_command: String,
}

pub struct ViewerConfig {
    pub scroll_step: u32,
    pub overlay_dwell: Duration,
    pub frame_budget: Duration,
    pub watch_interval: Duration,
}

impl ConfigFile {
    /// Merge CLI values (overwrites non-None fields).
    pub fn merge_cli(&mut self, spread: Option<bool>, fullscreen: Option<bool>) {
        if let Some(v) = spread {
            debug!("config: CLI override spread={v}");
            self.spread = spread;
        }
        if let Some(v) = fullscreen {
            debug!("config: CLI override fullscreen={v}");
            self.fullscreen = fullscreen;
        }
    }

    /// Resolve to a Config by applying defaults to missing fields.
    pub fn resolve(self) -> Config {
        let config = Config {
            spread: self.spread.unwrap_or(true),
            fullscreen: self.fullscreen.unwrap_or(true),
            viewer: ViewerConfig {
                scroll_step: self.viewer.scroll_step.unwrap_or(90).max(1),
                overlay_dwell: Duration::from_millis(self.viewer.overlay_ms.unwrap_or(900)),
                frame_budget: Duration::from_millis(
                    self.viewer.frame_budget_ms.unwrap_or(32),
                ),
                watch_interval: Duration::from_millis(
                    self.viewer.watch_interval_ms.unwrap_or(200),
                ),
            },
            extract_command: self
                .extract
                .command
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "qpdf".into()),
        };
        info!(
            "config: resolved spread={}, fullscreen={}, scroll_step={}, \
             overlay={}ms, frame_budget={}ms, watch_interval={}ms, extract={}",
            config.spread,
            config.fullscreen,
            config.viewer.scroll_step,
            config.viewer.overlay_dwell.as_millis(),
            config.viewer.frame_budget.as_millis(),
            config.viewer.watch_interval.as_millis(),
            config.extract_command,
        );
        config
    }
}

/// Resolve the XDG config path for encore.
fn config_path() -> Option<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config"))
        })?;
    Some(config_dir.join("encore").join("config.toml"))
}

/// Load config file. Returns `ConfigFile::default()` if no file exists.
/// Returns an error if the file exists but cannot be parsed.
pub fn load_config() -> anyhow::Result<ConfigFile> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            info!("config: no HOME or XDG_CONFIG_HOME set, using defaults");
            return Ok(ConfigFile::default());
        }
    };
    load_config_from(&path)
}

fn load_config_from(path: &std::path::Path) -> anyhow::Result<ConfigFile> {
    debug!("config: looking for {}", path.display());
    match std::fs::read_to_string(path) {
        Ok(text) => {
            info!("config: loaded from {}", path.display());
            let cfg: ConfigFile = toml::from_str(&text)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("config: {} not found, using defaults", path.display());
            Ok(ConfigFile::default())
        }
        Err(e) => Err(anyhow::anyhow!("failed to read {}: {e}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml() {
        let cfg: ConfigFile = toml::from_str("").unwrap();
        let resolved = cfg.resolve();
        assert!(resolved.spread);
        assert!(resolved.fullscreen);
        assert_eq!(resolved.viewer.scroll_step, 90);
        assert_eq!(resolved.viewer.overlay_dwell, Duration::from_millis(900));
        assert_eq!(resolved.viewer.frame_budget, Duration::from_millis(32));
        assert_eq!(resolved.extract_command, "qpdf");
    }

    #[test]
    fn partial_toml() {
        let text = r#"
            spread = false
            [viewer]
            overlay_ms = 1500
            [extract]
            command = "/opt/bin/qpdf"
        "#;
        let cfg: ConfigFile = toml::from_str(text).unwrap();
        let resolved = cfg.resolve();
        assert!(!resolved.spread);
        assert_eq!(resolved.viewer.overlay_dwell, Duration::from_millis(1500));
        assert_eq!(resolved.extract_command, "/opt/bin/qpdf");
        // Defaults for unspecified fields
        assert!(resolved.fullscreen);
        assert_eq!(resolved.viewer.scroll_step, 90);
        assert_eq!(resolved.viewer.watch_interval, Duration::from_millis(200));
    }

    #[test]
    fn invalid_toml() {
        let text = "this is not valid toml [[[";
        let result = toml::from_str::<ConfigFile>(text);
        assert!(result.is_err());
    }

    #[test]
    fn cli_overrides() {
        let mut cfg: ConfigFile = toml::from_str("spread = true\nfullscreen = true").unwrap();
        cfg.merge_cli(Some(false), None);
        let resolved = cfg.resolve();
        assert!(!resolved.spread); // CLI wins
        assert!(resolved.fullscreen);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert!(cfg.spread.is_none());
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "spread = maybe").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }
}
