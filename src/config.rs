/// Configuration module for EntityTagger.
///
/// Handles loading, validating, and providing default configuration values.
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::palette::PaletteConfig;

/// Config file used when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

// ── Default value functions ──────────────────────────────────────────

fn default_title() -> String {
    "NER Annotation Tool".to_string()
}

fn default_text_files_dir() -> String {
    "text_files".to_string()
}

fn default_annotations_dir() -> String {
    "annotations".to_string()
}

fn default_auto_save_interval_ms() -> u64 {
    2000
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_file_list_width() -> String {
    "25%".to_string()
}

fn default_annotation_area_width() -> String {
    "75%".to_string()
}

fn default_body_font() -> String {
    "'Segoe UI', Roboto, 'Helvetica Neue', -apple-system, BlinkMacSystemFont, Arial, sans-serif"
        .to_string()
}

fn default_code_font() -> String {
    "Courier, monospace".to_string()
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_title")]
    pub title: String,

    /// Directory scanned for `*.txt` documents.
    #[serde(default = "default_text_files_dir")]
    pub text_files_dir: String,

    /// Directory holding one `<document>.json` file per annotated document.
    #[serde(default = "default_annotations_dir")]
    pub annotations_dir: String,

    /// Minimum time between auto-saves in the editor.
    #[serde(default = "default_auto_save_interval_ms")]
    pub auto_save_interval_ms: u64,

    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default)]
    pub palette: PaletteConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UiConfig {
    #[serde(default = "default_file_list_width")]
    pub file_list_width: String,

    #[serde(default = "default_annotation_area_width")]
    pub annotation_area_width: String,

    #[serde(default = "default_body_font")]
    pub body_font: String,

    #[serde(default = "default_code_font")]
    pub code_font: String,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            title: default_title(),
            text_files_dir: default_text_files_dir(),
            annotations_dir: default_annotations_dir(),
            auto_save_interval_ms: default_auto_save_interval_ms(),
            bind: default_bind(),
            palette: PaletteConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            file_list_width: default_file_list_width(),
            annotation_area_width: default_annotation_area_width(),
            body_font: default_body_font(),
            code_font: default_code_font(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    #[must_use]
    pub fn auto_save_interval(&self) -> Duration {
        Duration::from_millis(self.auto_save_interval_ms)
    }

    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and, for the
    /// default path only, writes a template file.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            DEFAULT_CONFIG_PATH
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            if path == DEFAULT_CONFIG_PATH {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.auto_save_interval_ms > 0,
            "auto_save_interval_ms must be positive"
        );
        anyhow::ensure!(
            !self.text_files_dir.is_empty(),
            "text_files_dir must not be empty"
        );
        anyhow::ensure!(
            !self.annotations_dir.is_empty(),
            "annotations_dir must not be empty"
        );
        anyhow::ensure!(
            !self.palette.classes.is_empty(),
            "at least one class must be specified"
        );

        let mut seen = HashSet::new();
        for class in &self.palette.classes {
            anyhow::ensure!(!class.is_empty(), "class names must not be empty");
            anyhow::ensure!(seen.insert(class.as_str()), "duplicate class: {class}");
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
