use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Album opened on startup; the album picker is shown when unset.
    #[serde(default)]
    pub default_album: Option<String>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub viewer: ViewerConfig,

    #[serde(default)]
    pub downloads: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Cookie header sent with every request (e.g. "JSESSIONID=...").
    #[serde(default)]
    pub session_cookie: Option<String>,

    /// CSRF token to start with; read from the index page when unset.
    #[serde(default)]
    pub csrf_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_cookie: None,
            csrf_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageProtocol {
    #[default]
    Auto,
    Sixel,
    Kitty,
    ITerm2,
    Halfblocks,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Fraction of the viewport the lightbox may fill on each axis.
    #[serde(default = "default_fill_fraction")]
    pub fill_fraction: f64,

    /// Pause between tearing down a video and opening its neighbour.
    #[serde(default = "default_video_reopen_delay_ms")]
    pub video_reopen_delay_ms: u64,

    #[serde(default = "default_image_preview")]
    pub image_preview: bool,

    #[serde(default)]
    pub protocol: ImageProtocol,

    /// Terminal cell size in pixels, used to express the viewport in pixels.
    #[serde(default = "default_cell_width_px")]
    pub cell_width_px: u16,

    #[serde(default = "default_cell_height_px")]
    pub cell_height_px: u16,
}

fn default_fill_fraction() -> f64 {
    0.95
}

fn default_video_reopen_delay_ms() -> u64 {
    100
}

fn default_image_preview() -> bool {
    true
}

fn default_cell_width_px() -> u16 {
    10
}

fn default_cell_height_px() -> u16 {
    20
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fill_fraction: default_fill_fraction(),
            video_reopen_delay_ms: default_video_reopen_delay_ms(),
            image_preview: default_image_preview(),
            protocol: ImageProtocol::default(),
            cell_width_px: default_cell_width_px(),
            cell_height_px: default_cell_height_px(),
        }
    }
}

impl ViewerConfig {
    /// Fill fraction clamped to (0, 1]; out-of-range values fall back to the default.
    pub fn effective_fill_fraction(&self) -> f64 {
        if self.fill_fraction.is_finite() && self.fill_fraction > 0.0 && self.fill_fraction <= 1.0 {
            self.fill_fraction
        } else {
            default_fill_fraction()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_download_dir")]
    pub dir: PathBuf,
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: default_download_dir(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_album: None,
            server: ServerConfig::default(),
            viewer: ViewerConfig::default(),
            downloads: DownloadConfig::default(),
        }
    }
}

impl Config {
    /// Load from `KALBUM_CONFIG` or the default location, creating a default file if needed.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var_os("KALBUM_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(Self::config_path);
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Create default config
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kalbum")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            default_album = "summer"

            [server]
            base_url = "https://photos.example/"

            [viewer]
            video_reopen_delay_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.default_album.as_deref(), Some("summer"));
        assert_eq!(config.server.base_url, "https://photos.example/");
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.viewer.video_reopen_delay_ms, 0);
        assert_eq!(config.viewer.fill_fraction, 0.95);
        assert_eq!(config.viewer.protocol, ImageProtocol::Auto);
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.server.base_url, default_base_url());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.viewer.video_reopen_delay_ms, 100);
    }

    #[test]
    fn test_effective_fill_fraction_rejects_out_of_range() {
        let mut viewer = ViewerConfig::default();
        viewer.fill_fraction = 0.8;
        assert_eq!(viewer.effective_fill_fraction(), 0.8);
        viewer.fill_fraction = 1.5;
        assert_eq!(viewer.effective_fill_fraction(), 0.95);
        viewer.fill_fraction = 0.0;
        assert_eq!(viewer.effective_fill_fraction(), 0.95);
    }
}
