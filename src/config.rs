//! Configuration loading, validation and default file generation.
//!
//! shabbat-alert reads `shabbat-alert.toml` from `$XDG_CONFIG_HOME/shabbat-alert/`:
//!
//! ```toml
//! #[Location]
//! latitude = 31.768300               # Geographic latitude (-90 to 90)
//! longitude = 35.213700              # Geographic longitude (-180 to 180)
//!
//! #[Alerts]
//! candle_lighting_offset = 18        # Minutes before sunset (1-90)
//! check_interval = 6                 # Hours between background refreshes (1-24)
//! notify_command = "notify-send"     # Program run with title and body when an alert fires
//! ```
//!
//! An optional `geo.toml` next to it may hold `latitude`/`longitude` only; when
//! present its values override the main file, so the main file can be shared
//! without revealing the location.
//!
//! Missing files are created with a commented template. Out-of-range values are
//! rejected with a descriptive error rather than clamped.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::geo::{Coordinate, SolarError, SolarTimeCalculator};
use crate::logger::Log;

/// Contents of the optional geo.toml override file.
#[derive(Debug, Deserialize, Clone)]
struct GeoConfig {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Application settings.
///
/// Every field is optional in the file; [`Config::load_from_path`] fills in
/// defaults so the accessors below never fall back silently.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub candle_lighting_offset: Option<u64>, // minutes before sunset
    pub check_interval: Option<u64>,         // hours
    pub notify_command: Option<String>,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Path of geo.toml, in the same directory as the main config.
    pub fn get_geo_path() -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        geo_path_for(&config_path)
            .context("Could not determine geo.toml path from config path")
    }

    /// Write a commented template to `path`.
    ///
    /// The coordinates are left commented out: running with a placeholder
    /// location would produce confident but wrong candle lighting times.
    pub fn create_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_content = ConfigBuilder::new()
            .add_section("Location")
            .add_commented_setting(
                "latitude",
                "31.768300",
                "Geographic latitude (-90 to 90), or put it in geo.toml",
            )
            .add_commented_setting(
                "longitude",
                "35.213700",
                "Geographic longitude (-180 to 180)",
            )
            .add_section("Alerts")
            .add_setting(
                "candle_lighting_offset",
                &DEFAULT_CANDLE_LIGHTING_OFFSET.to_string(),
                &format!(
                    "Minutes before sunset ({}-{})",
                    MINIMUM_CANDLE_LIGHTING_OFFSET, MAXIMUM_CANDLE_LIGHTING_OFFSET
                ),
            )
            .add_setting(
                "check_interval",
                &DEFAULT_CHECK_INTERVAL.to_string(),
                &format!(
                    "Hours between background refreshes ({}-{})",
                    MINIMUM_CHECK_INTERVAL, MAXIMUM_CHECK_INTERVAL
                ),
            )
            .add_commented_setting(
                "notify_command",
                "\"notify-send\"",
                "Program run with title and body when an alert fires",
            )
            .build();

        fs::write(path, config_content).context("Failed to write default config file")?;
        Ok(())
    }

    fn apply_defaults_and_validate_fields(config: &mut Config) -> Result<()> {
        if let Some(offset) = config.candle_lighting_offset {
            if !(MINIMUM_CANDLE_LIGHTING_OFFSET..=MAXIMUM_CANDLE_LIGHTING_OFFSET).contains(&offset)
            {
                anyhow::bail!(
                    "Candle lighting offset must be between {} and {} minutes (got {})",
                    MINIMUM_CANDLE_LIGHTING_OFFSET,
                    MAXIMUM_CANDLE_LIGHTING_OFFSET,
                    offset
                );
            }
        } else {
            config.candle_lighting_offset = Some(DEFAULT_CANDLE_LIGHTING_OFFSET);
        }

        if let Some(interval) = config.check_interval {
            if !(MINIMUM_CHECK_INTERVAL..=MAXIMUM_CHECK_INTERVAL).contains(&interval) {
                anyhow::bail!(
                    "Check interval must be between {} and {} hours (got {})",
                    MINIMUM_CHECK_INTERVAL,
                    MAXIMUM_CHECK_INTERVAL,
                    interval
                );
            }
        } else {
            config.check_interval = Some(DEFAULT_CHECK_INTERVAL);
        }

        if let Some(command) = &config.notify_command {
            if command.trim().is_empty() {
                config.notify_command = None;
            }
        }

        Ok(())
    }

    /// Load and validate the config at `path`.
    ///
    /// Does not create a default file when `path` is missing.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Configuration file not found at specified path: {}",
                path.display()
            );
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        Self::apply_defaults_and_validate_fields(&mut config)?;

        Self::load_geo_override_from_path(&mut config, path);

        validate_config(&config)?;

        Ok(config)
    }

    /// Apply geo.toml coordinates if the file exists next to `config_path`.
    ///
    /// A missing file is normal. An unreadable or malformed one is reported
    /// and the main file's coordinates are kept.
    fn load_geo_override_from_path(config: &mut Config, config_path: &Path) {
        let Some(geo_path) = geo_path_for(config_path) else {
            return;
        };
        if !geo_path.exists() {
            return;
        }

        match fs::read_to_string(&geo_path) {
            Ok(content) => match toml::from_str::<GeoConfig>(&content) {
                Ok(geo_config) => {
                    if let Some(lat) = geo_config.latitude {
                        config.latitude = Some(lat);
                    }
                    if let Some(lon) = geo_config.longitude {
                        config.longitude = Some(lon);
                    }
                    Log::log_indented(&format!(
                        "Loaded geographic overrides from {}",
                        crate::utils::path_for_display(&geo_path)
                    ));
                }
                Err(e) => {
                    Log::log_warning(&format!(
                        "Failed to parse geo.toml: {}. Using coordinates from main config.",
                        e
                    ));
                }
            },
            Err(e) => {
                Log::log_warning(&format!(
                    "Failed to read geo.toml: {}. Using coordinates from main config.",
                    e
                ));
            }
        }
    }

    /// Load the user config, creating the template on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)
                .context("Failed to create default config during load")?;
            Log::log_block_start(&format!(
                "Created default configuration at {}",
                crate::utils::path_for_display(&config_path)
            ));
            Log::log_indented("Set latitude and longitude to enable alerts");
        }

        Self::load_from_path(&config_path).with_context(|| {
            format!(
                "Failed to load configuration from {}",
                config_path.display()
            )
        })
    }

    /// The configured location, if both coordinates are set.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon).ok(),
            _ => None,
        }
    }

    pub fn calculator(&self) -> Result<SolarTimeCalculator, SolarError> {
        SolarTimeCalculator::new(
            self.candle_lighting_offset
                .unwrap_or(DEFAULT_CANDLE_LIGHTING_OFFSET),
        )
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval.unwrap_or(DEFAULT_CHECK_INTERVAL) * 3600)
    }

    pub fn log_config(&self) {
        let config_path = Self::get_config_path()
            .unwrap_or_else(|_| PathBuf::from("~/.config/shabbat-alert/shabbat-alert.toml"));

        Log::log_block_start(&format!(
            "Loaded configuration from {}",
            crate::utils::path_for_display(&config_path)
        ));

        match self.coordinate() {
            Some(coordinate) => Log::log_indented(&format!("Location: {}", coordinate)),
            None => Log::log_indented("Location: not configured"),
        }
        Log::log_indented(&format!(
            "Candle lighting: {} minutes before sunset",
            self.candle_lighting_offset
                .unwrap_or(DEFAULT_CANDLE_LIGHTING_OFFSET)
        ));
        Log::log_indented(&format!(
            "Check interval: {} hours",
            self.check_interval.unwrap_or(DEFAULT_CHECK_INTERVAL)
        ));
        if let Some(command) = &self.notify_command {
            Log::log_indented(&format!("Notify command: {}", command));
        }
    }
}

/// Cross-field validation after defaults and overrides are applied.
pub fn validate_config(config: &Config) -> Result<()> {
    match (config.latitude, config.longitude) {
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) {
                anyhow::bail!("Latitude must be between -90 and 90 degrees (got {})", lat);
            }
            if !(-180.0..=180.0).contains(&lon) {
                anyhow::bail!(
                    "Longitude must be between -180 and 180 degrees (got {})",
                    lon
                );
            }
        }
        (None, None) => {}
        _ => anyhow::bail!("Latitude and longitude must be set together"),
    }

    Ok(())
}

fn geo_path_for(config_path: &Path) -> Option<PathBuf> {
    config_path.parent().map(|parent| parent.join(GEO_FILE_NAME))
}

/// Builds the aligned, commented TOML written for new configs.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{}]", title)));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{} = {}", key, value),
            comment: format!("# {}", comment),
        });
        self
    }

    /// A setting shown as an example but left disabled.
    fn add_commented_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("# {} = {}", key, value),
            comment: format!("# {}", comment),
        });
        self
    }

    fn build(self) -> String {
        // Align every comment one column after the longest setting
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !result.is_empty() {
                        result.push(String::new());
                    }
                    result.push(title);
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{}{}{}", line, padding, comment));
                }
            }
        }

        let mut content = result.join("\n");
        content.push('\n');
        content
    }
}
