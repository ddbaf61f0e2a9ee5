//! Theme loading: btop-style `theme[key]="value"` files mapped onto the cell
//! palette and the sidebar colours.

use crate::grid::{Palette, Rgba};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Cell palette plus the colours of the frame around the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub palette: Palette,
    /// Board border and sidebar borders.
    pub div_line: Rgba,
    /// Text (score, speed).
    pub main_fg: Rgba,
    /// Titles and labels.
    pub title: Rgba,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// Pure red, green and blue forms on black with a white clear flash.
    pub fn classic() -> Self {
        Self {
            palette: Palette::default(),
            div_line: Rgba::from_rgb(0x3F, 0x44, 0x4F),
            main_fg: Rgba::from_rgb(0xAB, 0xB2, 0xBF),
            title: Rgba::from_rgb(0xE5, 0xC0, 0x7B),
        }
    }

    /// Load theme from a btop-style file. A missing path gives the classic theme;
    /// `palette` is applied on top either way.
    pub fn load(path: Option<&Path>, palette: crate::PaletteChoice) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))
            }
            None => Self::classic(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override the form colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::PaletteChoice) {
        let forms = match palette {
            crate::PaletteChoice::Normal => return,
            crate::PaletteChoice::HighContrast => [
                Rgba::from_rgb(0xFF, 0xFF, 0x00),
                Rgba::from_rgb(0x00, 0xFF, 0xFF),
                Rgba::from_rgb(0xFF, 0x00, 0xFF),
            ],
            // Blue / orange / teal stay distinct under the common deficiencies.
            crate::PaletteChoice::Colorblind => [
                Rgba::from_rgb(0x00, 0x77, 0xBB),
                Rgba::from_rgb(0xEE, 0x77, 0x33),
                Rgba::from_rgb(0x00, 0x99, 0x88),
            ],
        };
        self.palette.forms = forms;
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let base = Self::classic();
        Self {
            palette: Palette {
                forms: [
                    get("cpu_end")
                        .or_else(|| get("temp_end"))
                        .unwrap_or(base.palette.forms[0]),
                    get("mem_box")
                        .or_else(|| get("cpu_start"))
                        .unwrap_or(base.palette.forms[1]),
                    get("cpu_box").unwrap_or(base.palette.forms[2]),
                ],
                background: get("main_bg").unwrap_or(base.palette.background),
                highlight: get("hi_fg")
                    .or_else(|| get("selected_bg"))
                    .unwrap_or(base.palette.highlight),
            },
            div_line: get("div_line").unwrap_or(base.div_line),
            main_fg: get("main_fg").unwrap_or(base.main_fg),
            title: get("title").unwrap_or(base.title),
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB".
pub fn parse_hex(s: &str) -> Result<Rgba, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return Err(ThemeError::InvalidHex(s.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&s[range], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Rgba::from_rgb(r, g, b))
}
