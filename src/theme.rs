//! The theme record produced by both synthesizers.

use serde::{Deserialize, Serialize};

/// Font stack used when a page gives no usable font information.
pub const FALLBACK_FONT_STACK: &str = "Inter, system-ui, -apple-system, sans-serif";

/// Accent used when nothing better was found.
pub const DEFAULT_ACCENT: &str = "#007bff";
pub const DEFAULT_HEADLINE: &str = "#212529";
pub const DEFAULT_TEXT: &str = "#343a40";
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Overall lightness of a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMood {
    Light,
    Dark,
    Neutral,
}

impl ColorMood {
    pub fn from_light(light: bool) -> Self {
        if light {
            ColorMood::Light
        } else {
            ColorMood::Dark
        }
    }
}

/// Colors and fonts that drive a UI's styling.
///
/// Built once per request by [`crate::pixel_theme`] or [`crate::dom_theme`]
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub accent_color: String,
    pub headline_color: String,
    pub text_color: String,
    pub background_color: String,
    pub card_background_color: String,
    pub card_icon_color: String,
    pub card_text_color: String,
    pub accent_color_contrast: String,
    pub font_family: String,
    pub heading_font_family: String,
    pub font_link: Option<String>,
    pub heading_font_link: Option<String>,
    pub default_gradient: String,
    pub color_mood: ColorMood,
    pub is_custom: bool,
    /// Only set on the DOM path.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub confidence: Option<f64>,
}

impl Theme {
    /// All color fields, for invariant checks.
    pub fn colors(&self) -> [&str; 8] {
        [
            &self.accent_color,
            &self.headline_color,
            &self.text_color,
            &self.background_color,
            &self.card_background_color,
            &self.card_icon_color,
            &self.card_text_color,
            &self.accent_color_contrast,
        ]
    }
}

/// `linear-gradient(120deg, from 0%, to 100%)`
pub fn linear_gradient(from: &str, to: &str) -> String {
    format!("linear-gradient(120deg, {} 0%, {} 100%)", from, to)
}
