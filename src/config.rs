use crate::error::Result;
use crate::model::Direction;
use crate::store::atomic;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "paperwork.json";

/// How a collection's human-readable document numbers are rendered.
///
/// Width and prefix are configuration, not derived data: `PO` is padded to
/// five digits, the smaller series to four.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NumberFormat {
    pub prefix: String,
    pub width: usize,
}

impl NumberFormat {
    pub fn new(prefix: &str, width: usize) -> Self {
        Self {
            prefix: prefix.to_string(),
            width,
        }
    }

    /// Render a counter value as a fixed-width, zero-padded code.
    pub fn render(&self, value: u64) -> String {
        format!("{}{:0width$}", self.prefix, value, width = self.width)
    }
}

/// Logo stamped into the header band of every composed page.
///
/// Raw JPEG bytes are embedded as-is (DCTDecode), so pixel dimensions must be
/// supplied alongside the path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogoConfig {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Stamp theming shared by every collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StampTheme {
    /// RGB accent color for the header/footer rules, each channel in 0..=1.
    #[serde(default = "default_accent")]
    pub accent: [f32; 3],
    #[serde(default)]
    pub logo: Option<LogoConfig>,
}

fn default_accent() -> [f32; 3] {
    [0.16, 0.25, 0.44]
}

impl Default for StampTheme {
    fn default() -> Self {
        Self {
            accent: default_accent(),
            logo: None,
        }
    }
}

/// Workspace configuration, stored as `paperwork.json` in the data directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceConfig {
    /// Directory holding collection files and the counter file.
    pub data_dir: PathBuf,
    /// Directory holding per-collection artifact subdirectories.
    pub artifacts_dir: PathBuf,
    /// Direction used when a record carries no classifiable text.
    #[serde(default = "default_direction")]
    pub fallback_direction: Direction,
    /// Number format keyed by counter name.
    #[serde(default = "default_formats")]
    pub formats: HashMap<String, NumberFormat>,
    #[serde(default)]
    pub stamp: StampTheme,
}

fn default_direction() -> Direction {
    Direction::Ltr
}

fn default_formats() -> HashMap<String, NumberFormat> {
    let mut formats = HashMap::new();
    formats.insert("PO".to_string(), NumberFormat::new("PO", 5));
    formats.insert("IMR".to_string(), NumberFormat::new("IMR", 4));
    formats.insert("ICS".to_string(), NumberFormat::new("ICS", 4));
    formats.insert("QTN".to_string(), NumberFormat::new("QTN", 4));
    formats.insert("RCT".to_string(), NumberFormat::new("RCT", 4));
    formats
}

impl WorkspaceConfig {
    /// Config rooted at a single base directory, with defaults everywhere else.
    pub fn rooted_at<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref();
        Self {
            data_dir: base.join("data"),
            artifacts_dir: base.join("artifacts"),
            fallback_direction: default_direction(),
            formats: default_formats(),
            stamp: StampTheme::default(),
        }
    }

    /// Load config from the given directory, or return defaults if not found.
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);
        if !config_path.exists() {
            return Ok(Self::rooted_at(config_dir));
        }
        let content = fs::read_to_string(&config_path)?;
        let config: WorkspaceConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the given directory.
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self)?;
        atomic::write_atomic(&config_path, content.as_bytes())
    }

    /// Number format for a counter name, falling back to a four-digit pad
    /// with the counter name as prefix.
    pub fn number_format(&self, counter: &str) -> NumberFormat {
        self.formats
            .get(counter)
            .cloned()
            .unwrap_or_else(|| NumberFormat::new(counter, 4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_number_format_zero_pads() {
        assert_eq!(NumberFormat::new("PO", 5).render(7), "PO00007");
        assert_eq!(NumberFormat::new("IMR", 4).render(1), "IMR0001");
        assert_eq!(NumberFormat::new("IMR", 4).render(12345), "IMR12345");
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let mut config = WorkspaceConfig::rooted_at(dir.path());
        config.fallback_direction = Direction::Rtl;
        config.save(dir.path()).unwrap();

        let loaded = WorkspaceConfig::load(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_config_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = WorkspaceConfig::load(dir.path()).unwrap();
        assert_eq!(config.fallback_direction, Direction::Ltr);
        assert_eq!(config.number_format("PO").render(7), "PO00007");
        // Unknown counters fall back to a four-digit pad
        assert_eq!(config.number_format("GRN").render(3), "GRN0003");
    }
}
