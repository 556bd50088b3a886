use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, bail};
use once_cell::sync::Lazy;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use strum::VariantNames;
use strum_macros::VariantNames as VariantNamesDerive;

use crate::sys::app::IconSize;
use crate::sys::hotkey::HotkeySpec;

pub fn config_file() -> PathBuf {
    dirs::home_dir().unwrap().join(".config").join("mantle").join("config.toml")
}

fn yes() -> bool {
    true
}

fn no() -> bool {
    false
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub enum ConfigCommand {
    SetOverlayHotkeyEnabled(bool),
    SetBackgroundSource(BackgroundSource),

    /// Generic setter for arbitrary config paths using dot-separated keys.
    /// Example: key = "desktop.background.source", value = "image"
    Set {
        key: String,
        value: Value,
    },

    ShowConfig,
    SaveConfig,
    ReloadConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "yes")]
    pub hot_reload: bool,
    #[serde(default)]
    pub desktop: DesktopSettings,
    #[serde(default)]
    pub taskbar: TaskbarSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hot_reload: yes(),
            desktop: DesktopSettings::default(),
            taskbar: TaskbarSettings::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DesktopSettings {
    /// Render the desktop surface (icons and background) at all.
    #[serde(default = "yes")]
    pub enable_desktop: bool,
    /// Whether mantle is the session shell. Only then does it own desktop
    /// bounds and background painting.
    #[serde(default = "yes")]
    pub run_as_shell: bool,
    #[serde(default = "no")]
    pub overlay_hotkey_enabled: bool,
    #[serde(default = "default_overlay_hotkey")]
    pub overlay_hotkey: HotkeySpec,
    #[serde(default)]
    pub background: BackgroundSettings,
}

impl Default for DesktopSettings {
    fn default() -> Self {
        Self {
            enable_desktop: yes(),
            run_as_shell: yes(),
            overlay_hotkey_enabled: no(),
            overlay_hotkey: default_overlay_hotkey(),
            background: BackgroundSettings::default(),
        }
    }
}

static DEFAULT_OVERLAY_HOTKEY: Lazy<HotkeySpec> =
    Lazy::new(|| "win+d".parse().expect("default overlay hotkey parses"));

fn default_overlay_hotkey() -> HotkeySpec {
    *DEFAULT_OVERLAY_HOTKEY
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BackgroundSettings {
    #[serde(default)]
    pub source: BackgroundSource,
    #[serde(default)]
    pub image_path: Option<PathBuf>,
    #[serde(default)]
    pub image_style: WallpaperStyle,
    #[serde(default = "default_background_color")]
    pub color: Color,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            source: BackgroundSource::default(),
            image_path: None,
            image_style: WallpaperStyle::default(),
            color: default_background_color(),
        }
    }
}

fn default_background_color() -> Color {
    // Cornflower blue, the traditional "nothing else worked" desktop color.
    Color::rgb(0x64, 0x95, 0xed)
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundSource {
    /// Follow the wallpaper the OS has configured for the session.
    SystemDefault,
    Image,
    #[default]
    Color,
}

#[derive(
    Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default, VariantNamesDerive,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WallpaperStyle {
    Tile,
    Center,
    Fit,
    Fill,
    Span,
    #[default]
    Stretch,
}

impl WallpaperStyle {
    /// Decode the WallpaperStyle/TileWallpaper value pair the OS theme
    /// settings store uses.
    pub fn from_system_codes(style: u32, tile: bool) -> WallpaperStyle {
        match (style, tile) {
            (0, true) => WallpaperStyle::Tile,
            (0, false) => WallpaperStyle::Center,
            (6, false) => WallpaperStyle::Fit,
            (10, false) => WallpaperStyle::Fill,
            (22, false) => WallpaperStyle::Span,
            _ => WallpaperStyle::Stretch,
        }
    }

    /// The style a renderer should actually draw.
    ///
    /// Span is accepted in configuration but renders like fill.
    // TODO: true multi-monitor span once per-monitor desktop surfaces exist
    pub fn effective(self) -> WallpaperStyle {
        match self {
            WallpaperStyle::Span => WallpaperStyle::Fill,
            other => other,
        }
    }

    pub fn names() -> &'static [&'static str] {
        WallpaperStyle::VARIANTS
    }
}

/// ARGB color, written in config files as `"#rrggbb"` or `"#aarrggbb"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Color {
        Color { a, r, g, b }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::argb(0xff, r, g, b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 0xff {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.a, self.r, self.g, self.b)
        }
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(hex) = s.strip_prefix('#') else {
            bail!("color {s:?} must start with '#'");
        };
        let digits = u32::from_str_radix(hex, 16)
            .with_context(|| format!("color {s:?} is not valid hex"))?;
        match hex.len() {
            6 => Ok(Color::rgb(
                (digits >> 16) as u8,
                (digits >> 8) as u8,
                digits as u8,
            )),
            8 => Ok(Color::argb(
                (digits >> 24) as u8,
                (digits >> 16) as u8,
                (digits >> 8) as u8,
                digits as u8,
            )),
            _ => bail!("color {s:?} must have 6 or 8 hex digits"),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TaskbarSettings {
    #[serde(default)]
    pub icon_size: IconSize,
    /// Collapse all windows of one application into a single taskbar entry.
    #[serde(default = "yes")]
    pub group_by_application: bool,
}

impl Default for TaskbarSettings {
    fn default() -> Self {
        Self {
            icon_size: IconSize::default(),
            group_by_application: yes(),
        }
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Non-fatal configuration problems, reported at startup and on reload.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.desktop.background.source == BackgroundSource::Image
            && self.desktop.background.image_path.is_none()
        {
            issues.push(
                "desktop.background.image_path must be set when source = \"image\"".to_string(),
            );
        }
        if self.desktop.overlay_hotkey_enabled && self.desktop.overlay_hotkey.modifiers.is_empty() {
            issues.push(
                "desktop.overlay_hotkey must include at least one modifier".to_string(),
            );
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.desktop.background.source = BackgroundSource::Image;
        config.desktop.background.image_path = Some(PathBuf::from("/tmp/wallpaper.png"));
        config.desktop.background.image_style = WallpaperStyle::Fit;
        config.taskbar.icon_size = IconSize::Small;

        let serialized = toml::to_string_pretty(&config).unwrap();
        let reparsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config, reparsed);
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = toml::from_str::<Config>("[desktop]\nwallpaper = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("wallpaper"), "{err}");
    }

    #[test]
    fn decodes_system_style_codes() {
        assert_eq!(WallpaperStyle::from_system_codes(0, true), WallpaperStyle::Tile);
        assert_eq!(WallpaperStyle::from_system_codes(0, false), WallpaperStyle::Center);
        assert_eq!(WallpaperStyle::from_system_codes(6, false), WallpaperStyle::Fit);
        assert_eq!(WallpaperStyle::from_system_codes(10, false), WallpaperStyle::Fill);
        assert_eq!(WallpaperStyle::from_system_codes(22, false), WallpaperStyle::Span);
        assert_eq!(WallpaperStyle::from_system_codes(2, false), WallpaperStyle::Stretch);
        assert_eq!(WallpaperStyle::from_system_codes(99, false), WallpaperStyle::Stretch);
    }

    #[test]
    fn span_renders_like_fill() {
        assert_eq!(WallpaperStyle::Span.effective(), WallpaperStyle::Fill);
        assert_eq!(WallpaperStyle::Tile.effective(), WallpaperStyle::Tile);
    }

    #[test]
    fn parses_colors() {
        assert_eq!("#6495ed".parse::<Color>().unwrap(), Color::rgb(0x64, 0x95, 0xed));
        assert_eq!(
            "#88000000".parse::<Color>().unwrap(),
            Color::argb(0x88, 0x00, 0x00, 0x00)
        );
        assert!("6495ed".parse::<Color>().is_err());
        assert!("#64".parse::<Color>().is_err());
        assert_eq!(Color::rgb(0x64, 0x95, 0xed).to_string(), "#6495ed");
    }

    #[test]
    fn validates_image_source_without_path() {
        let mut config = Config::default();
        config.desktop.background.source = BackgroundSource::Image;
        let issues = config.validate();
        assert_eq!(1, issues.len());
        assert!(issues[0].contains("image_path"), "{issues:?}");
    }
}
