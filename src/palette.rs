/// Entity class palette: ordered class names with display colors.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Background/foreground color pair for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassColors {
    pub bg: String,
    pub text: String,
}

impl ClassColors {
    pub fn new(bg: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            bg: bg.into(),
            text: text.into(),
        }
    }
}

// ── Defaults ─────────────────────────────────────────────────────────

const DEFAULT_CLASSES: &[(&str, &str, &str)] = &[
    // Numbers and quantities
    ("CARDINAL", "#1f77b4", "white"),
    ("ORDINAL", "#c5b0d5", "black"),
    ("PERCENT", "#aec7e8", "black"),
    ("QUANTITY", "#9edae5", "black"),
    ("MONEY", "#17becf", "black"),
    // Time
    ("DATE", "#ff7f0e", "white"),
    ("TIME", "#ffbb78", "black"),
    // Places
    ("LOC", "#2ca02c", "white"),
    ("GPE", "#98df8a", "black"),
    ("FAC", "#bcbd22", "black"),
    // People and organizations
    ("PERSON", "#d62728", "white"),
    ("ORG", "#ff9896", "black"),
    ("NORP", "#c49c94", "black"),
    // Culture and creation
    ("LANGUAGE", "#9467bd", "white"),
    ("WORK_OF_ART", "#dbdb8d", "black"),
    ("LAW", "#8c564b", "white"),
    ("EVENT", "#e377c2", "black"),
    ("PRODUCT", "#f7b6d2", "black"),
    // Miscellaneous
    ("OTHER", "#7f7f7f", "white"),
];

fn default_classes() -> Vec<String> {
    DEFAULT_CLASSES.iter().map(|(name, _, _)| name.to_string()).collect()
}

fn default_colors() -> BTreeMap<String, ClassColors> {
    DEFAULT_CLASSES
        .iter()
        .map(|(name, bg, text)| (name.to_string(), ClassColors::new(*bg, *text)))
        .collect()
}

fn default_fallback() -> ClassColors {
    ClassColors::new("#c7c7c7", "black")
}

// ── Config section ───────────────────────────────────────────────────

/// Palette section of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteConfig {
    #[serde(default = "default_classes")]
    pub classes: Vec<String>,

    #[serde(default = "default_colors")]
    pub colors: BTreeMap<String, ClassColors>,

    #[serde(default = "default_fallback")]
    pub fallback: ClassColors,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            classes: default_classes(),
            colors: default_colors(),
            fallback: default_fallback(),
        }
    }
}

// ── Resolved palette ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteEntry {
    pub name: String,
    pub bg: String,
    pub text: String,
}

/// The process-wide class palette, resolved from [`PaletteConfig`].
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
    fallback: ClassColors,
}

impl Palette {
    #[must_use]
    pub fn from_config(config: &PaletteConfig) -> Self {
        let entries = config
            .classes
            .iter()
            .map(|name| {
                let colors = config.colors.get(name).unwrap_or(&config.fallback);
                PaletteEntry {
                    name: name.clone(),
                    bg: colors.bg.clone(),
                    text: colors.text.clone(),
                }
            })
            .collect();

        Self {
            entries,
            fallback: config.fallback.clone(),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn fallback(&self) -> &ClassColors {
        &self.fallback
    }

    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.entries.iter().any(|e| e.name == class)
    }

    /// `(bg, text)` for a class; unknown classes get the fallback pair.
    #[must_use]
    pub fn colors_for(&self, class: &str) -> (&str, &str) {
        self.entries
            .iter()
            .find(|e| e.name == class)
            .map(|e| (e.bg.as_str(), e.text.as_str()))
            .unwrap_or((self.fallback.bg.as_str(), self.fallback.text.as_str()))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_config(&PaletteConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette_order() {
        let palette = Palette::default();
        let names: Vec<&str> = palette.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names.len(), 19);
        assert_eq!(names[0], "CARDINAL");
        assert_eq!(names[18], "OTHER");
        assert_eq!(palette.colors_for("PERSON"), ("#d62728", "white"));
    }

    #[test]
    fn test_missing_color_uses_fallback() {
        let config = PaletteConfig {
            classes: vec!["GENE".to_string(), "PERSON".to_string()],
            ..PaletteConfig::default()
        };
        let palette = Palette::from_config(&config);
        assert_eq!(palette.colors_for("GENE"), ("#c7c7c7", "black"));
        assert_eq!(palette.colors_for("PERSON"), ("#d62728", "white"));
        assert!(!palette.contains("ORG"));
        assert_eq!(palette.colors_for("ORG"), ("#c7c7c7", "black"));
    }

    #[test]
    fn test_partial_json_section() {
        let json = r##"{"classes": ["A", "B"], "colors": {"A": {"bg": "#000", "text": "white"}}}"##;
        let config: PaletteConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.fallback, default_fallback());
        let palette = Palette::from_config(&config);
        assert_eq!(palette.colors_for("A"), ("#000", "white"));
        assert_eq!(palette.colors_for("B"), ("#c7c7c7", "black"));
    }
}
