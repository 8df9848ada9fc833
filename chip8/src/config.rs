use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use quirk8_core::constants::DEFAULT_IPS;
use quirk8_core::{Config, Quirks, StackPolicy};
use quirk8_display::Palette;

/// # Settings
/// Host settings as stored in `config.json`.
///
/// Keys that are missing from the file fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "IPS")]
    pub ips: u32,
    #[serde(flatten)]
    pub quirks: Quirks,
    pub stack_policy: StackPolicy,
    pub volume: u8,
    pub start_games_fullscreen: bool,
    #[serde(rename = "pixel_on_color_R")]
    pub pixel_on_r: u8,
    #[serde(rename = "pixel_on_color_G")]
    pub pixel_on_g: u8,
    #[serde(rename = "pixel_on_color_B")]
    pub pixel_on_b: u8,
    #[serde(rename = "pixel_off_color_R")]
    pub pixel_off_r: u8,
    #[serde(rename = "pixel_off_color_G")]
    pub pixel_off_g: u8,
    #[serde(rename = "pixel_off_color_B")]
    pub pixel_off_b: u8,
}

impl Default for Settings {
    fn default() -> Self {
        let palette = Palette::default();
        Settings {
            ips: DEFAULT_IPS,
            quirks: Quirks::default(),
            stack_policy: StackPolicy::default(),
            volume: 100,
            start_games_fullscreen: false,
            pixel_on_r: palette.on.0,
            pixel_on_g: palette.on.1,
            pixel_on_b: palette.on.2,
            pixel_off_r: palette.off.0,
            pixel_off_g: palette.off.1,
            pixel_off_b: palette.off.2,
        }
    }
}

impl Settings {
    /// Reads settings from `path`, writing the defaults there first if the file doesn't exist.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            let settings = Settings::default();
            let json = serde_json::to_string_pretty(&settings)?;
            fs::write(path, json)
                .with_context(|| format!("unable to write default settings to {}", path.display()))?;
            info!("wrote default settings to {}", path.display());
            return Ok(settings);
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read settings from {}", path.display()))?;
        Settings::parse(&text).with_context(|| format!("invalid settings in {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The interpreter configuration these settings describe.
    pub fn machine_config(&self) -> Config {
        Config {
            ips: self.ips,
            quirks: self.quirks,
            stack_policy: self.stack_policy,
        }
    }

    pub fn palette(&self) -> Palette {
        Palette {
            on: (self.pixel_on_r, self.pixel_on_g, self.pixel_on_b),
            off: (self.pixel_off_r, self.pixel_off_g, self.pixel_off_b),
        }
    }
}
