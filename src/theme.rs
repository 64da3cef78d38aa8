//! Theme colors for the UI, optionally overridden from
//! ~/.config/friendmap/theme.toml

use ratatui::style::Color;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Active borders, highlights, selected point
    pub danger: Color,      // Delete confirmation, errors
    pub success: Color,     // Points on the map
    pub warning: Color,     // Status messages
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Dimmed text, hints
    pub bg_selected: Color, // Selection background
    pub inactive: Color,    // Inactive borders, grid lines
    pub header: Color,      // Table header text
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired fallback palette
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(250, 179, 135),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(243, 139, 168),
        }
    }
}

/// Optional user overrides, all hex strings like "#FFC107"
#[derive(Debug, Default, Deserialize)]
struct ThemeFile {
    accent: Option<String>,
    danger: Option<String>,
    success: Option<String>,
    warning: Option<String>,
    text: Option<String>,
    text_dim: Option<String>,
    bg_selected: Option<String>,
    inactive: Option<String>,
    header: Option<String>,
}

impl Theme {
    /// Load the theme, falling back to defaults for anything missing
    pub fn load() -> Self {
        Self::load_user_theme().unwrap_or_default()
    }

    fn load_user_theme() -> Option<Self> {
        let path = dirs::config_dir()?.join("friendmap/theme.toml");
        let content = fs::read_to_string(path).ok()?;
        let file: ThemeFile = match toml::from_str(&content) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("Failed to parse theme.toml: {}", e);
                return None;
            }
        };

        let base = Theme::default();
        let pick = |value: Option<String>, fallback: Color| {
            value
                .as_deref()
                .and_then(Self::parse_hex_color)
                .unwrap_or(fallback)
        };

        Some(Self {
            accent: pick(file.accent, base.accent),
            danger: pick(file.danger, base.danger),
            success: pick(file.success, base.success),
            warning: pick(file.warning, base.warning),
            text: pick(file.text, base.text),
            text_dim: pick(file.text_dim, base.text_dim),
            bg_selected: pick(file.bg_selected, base.bg_selected),
            inactive: pick(file.inactive, base.inactive),
            header: pick(file.header, base.header),
        })
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(
            Theme::parse_hex_color("#FFC107"),
            Some(Color::Rgb(255, 193, 7))
        );
        assert_eq!(
            Theme::parse_hex_color("333333"),
            Some(Color::Rgb(51, 51, 51))
        );
        assert_eq!(Theme::parse_hex_color("#fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(Theme::parse_hex_color("not-a-color"), None);
        assert_eq!(Theme::parse_hex_color("#12345"), None);
    }
}
