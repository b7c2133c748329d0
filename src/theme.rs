use std::fs;
use std::io;
use std::path::Path;

use ratatui::style::Color;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub title_bg: Color,
    pub chat_bg: Color,
    pub input_bg: Color,
    pub status_bg: Color,
    pub popup_bg: Color,
    pub text_fg: Color,
    pub muted_fg: Color,
    pub active_fg: Color,
    pub alert_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            title_bg: Color::Rgb(36, 36, 36),
            chat_bg: Color::Rgb(52, 53, 65),
            input_bg: Color::Rgb(64, 65, 79),
            status_bg: Color::Rgb(36, 36, 36),
            popup_bg: Color::Rgb(32, 33, 35),
            text_fg: Color::Rgb(225, 225, 225),
            muted_fg: Color::Rgb(160, 160, 170),
            active_fg: Color::Rgb(255, 255, 255),
            alert_fg: Color::Rgb(240, 110, 100),
        }
    }
}

impl Theme {
    /// A missing file is the normal case and yields the defaults quietly;
    /// an unreadable or malformed one is logged and also yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path_ref = path.as_ref();
        match fs::read_to_string(path_ref) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(theme) => theme,
                Err(err) => {
                    tracing::warn!(
                        path = %path_ref.display(),
                        error = %err,
                        "failed to parse theme, using defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                tracing::warn!(
                    path = %path_ref.display(),
                    error = %err,
                    "failed to read theme, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Colors omitted from `[colors]` keep their default value.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let cfg: ThemeToml = toml::from_str(s)?;
        let colors = cfg.colors;
        let base = Self::default();
        Ok(Self {
            title_bg: RgbToml::or(colors.title_bg, base.title_bg),
            chat_bg: RgbToml::or(colors.chat_bg, base.chat_bg),
            input_bg: RgbToml::or(colors.input_bg, base.input_bg),
            status_bg: RgbToml::or(colors.status_bg, base.status_bg),
            popup_bg: RgbToml::or(colors.popup_bg, base.popup_bg),
            text_fg: RgbToml::or(colors.text_fg, base.text_fg),
            muted_fg: RgbToml::or(colors.muted_fg, base.muted_fg),
            active_fg: RgbToml::or(colors.active_fg, base.active_fg),
            alert_fg: RgbToml::or(colors.alert_fg, base.alert_fg),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ThemeToml {
    #[serde(default)]
    colors: ThemeColorsToml,
}

#[derive(Debug, Default, Deserialize)]
struct ThemeColorsToml {
    title_bg: Option<RgbToml>,
    chat_bg: Option<RgbToml>,
    input_bg: Option<RgbToml>,
    status_bg: Option<RgbToml>,
    popup_bg: Option<RgbToml>,
    text_fg: Option<RgbToml>,
    muted_fg: Option<RgbToml>,
    active_fg: Option<RgbToml>,
    alert_fg: Option<RgbToml>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RgbToml {
    r: u8,
    g: u8,
    b: u8,
}

impl RgbToml {
    fn or(value: Option<Self>, fallback: Color) -> Color {
        value
            .map(|rgb| Color::Rgb(rgb.r, rgb.g, rgb.b))
            .unwrap_or(fallback)
    }
}
