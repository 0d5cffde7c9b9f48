//! Dashboard configuration.
//!
//! Stored as JSON. Every field has a default, so an empty object `{}` is a
//! valid file and reproduces the stock layout:
//!
//! | key | shows                |
//! |-----|----------------------|
//! | 4   | CPU temperature      |
//! | 9   | CPU history graph    |
//! | 3   | GPU temperature      |
//! | 8   | GPU history graph    |

use std::collections::HashSet;
use std::path::Path;

use embedded_graphics::pixelcolor::Rgb888;
use serde::{Deserialize, Serialize};

use crate::error::{DeckError, Result};
use crate::graph::{DEFAULT_BUCKET_WIDTH, GraphStyle, PartialBucket};
use crate::protocol::KEY_COUNT;

/// Default poll interval. Four samples per bar puts one bar every four seconds.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;
/// Default history length: 72 bars of 4 samples, just under five minutes.
pub const DEFAULT_HISTORY_CAPACITY: usize = 288;

/// One monitored metric and the keys it is shown on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Case-insensitive substring of the sensor name; `|` separates alternatives.
    pub metric: String,
    /// Text under the value on the reading key.
    pub label: String,
    /// Key showing the latest value, if any.
    #[serde(default)]
    pub reading_key: Option<u8>,
    /// Key showing the history graph, if any.
    #[serde(default)]
    pub graph_key: Option<u8>,
    #[serde(default = "default_graph_color")]
    pub graph_color: [u8; 3],
    #[serde(default = "default_text_color")]
    pub text_color: [u8; 3],
    /// Value drawn at full icon height. Unset means one pixel per unit.
    #[serde(default)]
    pub full_scale: Option<f32>,
}

fn default_graph_color() -> [u8; 3] {
    [0xff, 0x00, 0x00]
}

fn default_text_color() -> [u8; 3] {
    [0xff, 0xff, 0xff]
}

impl PanelConfig {
    pub fn new(metric: &str, label: &str, reading_key: Option<u8>, graph_key: Option<u8>) -> Self {
        Self {
            metric: metric.to_string(),
            label: label.to_string(),
            reading_key,
            graph_key,
            graph_color: default_graph_color(),
            text_color: default_text_color(),
            full_scale: None,
        }
    }

    pub fn text_rgb(&self) -> Rgb888 {
        let [r, g, b] = self.text_color;
        Rgb888::new(r, g, b)
    }

    pub fn graph_style(&self) -> GraphStyle {
        let [r, g, b] = self.graph_color;
        GraphStyle {
            color: Rgb888::new(r, g, b),
            full_scale: self.full_scale,
        }
    }

    fn keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.reading_key.into_iter().chain(self.graph_key)
    }
}

/// Everything the `run` loop needs besides the device itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub interval_ms: u64,
    pub history_capacity: usize,
    pub bucket_width: usize,
    pub partial_buckets: PartialBucket,
    /// Brightness percentage applied at startup.
    pub brightness: Option<u8>,
    pub reset_on_start: bool,
    pub panels: Vec<PanelConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            bucket_width: DEFAULT_BUCKET_WIDTH,
            partial_buckets: PartialBucket::Drop,
            brightness: None,
            reset_on_start: true,
            panels: vec![
                PanelConfig::new(
                    "coretemp.package|k10temp.tctl|k10temp|cpu_thermal",
                    "CPU",
                    Some(4),
                    Some(9),
                ),
                PanelConfig::new("amdgpu.edge|amdgpu|nouveau|radeon", "GPU", Some(3), Some(8)),
            ],
        }
    }
}

impl DashboardConfig {
    /// Load and validate a JSON configuration file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate a JSON configuration string.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check ranges and key assignments.
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(DeckError::Config("interval_ms must be positive".to_string()));
        }
        if self.history_capacity == 0 {
            return Err(DeckError::Config(
                "history_capacity must be positive".to_string(),
            ));
        }
        if self.bucket_width == 0 {
            return Err(DeckError::Config("bucket_width must be positive".to_string()));
        }
        if let Some(b) = self.brightness.filter(|&b| b > 100) {
            return Err(DeckError::Config(format!(
                "brightness {b} is above 100 percent"
            )));
        }
        if self.panels.is_empty() {
            return Err(DeckError::Config("at least one panel is required".to_string()));
        }

        let mut used = HashSet::new();
        for panel in &self.panels {
            if panel.metric.trim().is_empty() {
                return Err(DeckError::Config(format!(
                    "panel '{}' has an empty metric pattern",
                    panel.label
                )));
            }
            if panel.reading_key.is_none() && panel.graph_key.is_none() {
                return Err(DeckError::Config(format!(
                    "panel '{}' is not assigned to any key",
                    panel.label
                )));
            }
            for key in panel.keys() {
                if key >= KEY_COUNT {
                    return Err(DeckError::Config(format!(
                        "panel '{}' uses key {key}, device has {KEY_COUNT} keys",
                        panel.label
                    )));
                }
                if !used.insert(key) {
                    return Err(DeckError::Config(format!("key {key} is assigned twice")));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_is_valid_and_matches_stock_layout() {
        let config = DashboardConfig::default();
        config.validate().unwrap();
        assert_eq!(config.history_capacity, 288);
        assert_eq!(config.bucket_width, 4);
        assert_eq!(config.panels[0].reading_key, Some(4));
        assert_eq!(config.panels[0].graph_key, Some(9));
        assert_eq!(config.panels[1].reading_key, Some(3));
        assert_eq!(config.panels[1].graph_key, Some(8));
    }

    #[test]
    fn empty_object_gives_defaults() {
        let config = DashboardConfig::from_json("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let config = DashboardConfig::from_json(
            r#"{
                "interval_ms": 250,
                "partial_buckets": "average",
                "panels": [{ "metric": "nvme", "label": "SSD", "graph_key": 14 }]
            }"#,
        )
        .unwrap();
        assert_eq!(config.interval_ms, 250);
        assert_eq!(config.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(config.partial_buckets, PartialBucket::Average);
        assert_eq!(config.panels.len(), 1);
        assert_eq!(config.panels[0].reading_key, None);
        assert_eq!(config.panels[0].graph_color, [0xff, 0, 0]);
    }

    #[test]
    fn json_round_trip_preserves_config() {
        let config = DashboardConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(DashboardConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn rejects_out_of_range_key() {
        let mut config = DashboardConfig::default();
        config.panels[0].graph_key = Some(15);
        assert!(matches!(config.validate(), Err(DeckError::Config(_))));
    }

    #[test]
    fn rejects_duplicate_key() {
        let mut config = DashboardConfig::default();
        config.panels[1].graph_key = Some(9);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("assigned twice"));
    }

    #[test]
    fn rejects_out_of_range_values() {
        for patch in [
            r#"{"history_capacity": 0}"#,
            r#"{"bucket_width": 0}"#,
            r#"{"interval_ms": 0}"#,
            r#"{"brightness": 150}"#,
            r#"{"panels": []}"#,
            r#"{"panels": [{"metric": "x", "label": "X"}]}"#,
        ] {
            assert!(
                DashboardConfig::from_json(patch).is_err(),
                "expected {patch} to be rejected"
            );
        }
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(
            DashboardConfig::from_json("{not json"),
            Err(DeckError::Json(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"brightness": 60}}"#).unwrap();
        let config = DashboardConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.brightness, Some(60));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = DashboardConfig::load_from_path(Path::new("/nonexistent/deckstats.json"))
            .unwrap_err();
        assert!(matches!(err, DeckError::Io(_)));
    }
}
