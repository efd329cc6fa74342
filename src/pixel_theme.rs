//! Theme synthesis from a pixel palette.

use crate::color::{is_light, rgb_to_hex, scale_brightness, BLACK, WHITE};
use crate::palette::{extract_palette, rank_dominant_colors, ColorSwatch, DominantColorEntry, Palette};
use crate::theme::{
    linear_gradient, ColorMood, Theme, DEFAULT_ACCENT, DEFAULT_BACKGROUND, DEFAULT_HEADLINE, DEFAULT_TEXT,
    FALLBACK_FONT_STACK,
};
use crate::Result;
use serde::Serialize;

const DEFAULT_CARD_BACKGROUND: &str = "#f8f9fa";
const DEFAULT_CARD_TEXT: &str = "#495057";
const DEFAULT_GRADIENT: &str = "linear-gradient(120deg, rgb(35, 211, 211) 0%, rgb(30, 38, 109) 100%)";
const CARD_BRIGHTNESS: f64 = 0.95;

fn first<'a>(chain: &[Option<&'a ColorSwatch>]) -> Option<&'a ColorSwatch> {
    chain.iter().flatten().next().copied()
}

fn hex_or(swatch: Option<&ColorSwatch>, fallback: &str) -> String {
    swatch.map(|s| s.hex.clone()).unwrap_or_else(|| fallback.to_string())
}

/// Map palette roles onto theme roles. Missing roles fall back to constants.
pub fn synthesize_from_palette(palette: &Palette) -> Theme {
    let vibrant = palette.vibrant.as_ref();
    let dark_vibrant = palette.dark_vibrant.as_ref();
    let light_vibrant = palette.light_vibrant.as_ref();
    let dark_muted = palette.dark_muted.as_ref();
    let light_muted = palette.light_muted.as_ref();

    let accent = first(&[vibrant, dark_vibrant]);
    let background = first(&[light_muted, light_vibrant]);

    let accent_color = hex_or(accent, DEFAULT_ACCENT);
    let card_background_color = background
        .map(|s| rgb_to_hex(scale_brightness(s.rgb, CARD_BRIGHTNESS)))
        .unwrap_or_else(|| DEFAULT_CARD_BACKGROUND.to_string());
    let default_gradient = match (vibrant, dark_vibrant) {
        (Some(v), Some(dv)) => linear_gradient(&v.hex, &dv.hex),
        _ => DEFAULT_GRADIENT.to_string(),
    };
    // Mood and contrast follow Vibrant alone, even when DarkVibrant supplies the accent.
    let vibrant_is_light = vibrant.map(|s| is_light(s.rgb));
    let color_mood = vibrant_is_light.map_or(ColorMood::Neutral, ColorMood::from_light);
    let accent_color_contrast = if vibrant_is_light == Some(true) { BLACK } else { WHITE };

    Theme {
        accent_color_contrast: accent_color_contrast.to_string(),
        card_icon_color: accent_color.clone(),
        accent_color,
        headline_color: hex_or(first(&[dark_vibrant, dark_muted]), DEFAULT_HEADLINE),
        text_color: hex_or(first(&[dark_vibrant, dark_muted]), DEFAULT_TEXT),
        background_color: hex_or(background, DEFAULT_BACKGROUND),
        card_background_color,
        card_text_color: hex_or(first(&[dark_muted, dark_vibrant]), DEFAULT_CARD_TEXT),
        font_family: FALLBACK_FONT_STACK.to_string(),
        heading_font_family: FALLBACK_FONT_STACK.to_string(),
        font_link: None,
        heading_font_link: None,
        default_gradient,
        color_mood,
        is_custom: true,
        confidence: None,
    }
}

/// Pixel-path result: the theme plus the palette it came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelThemeReport {
    pub theme: Theme,
    pub original_palette: Palette,
    pub dominant_colors: Vec<DominantColorEntry>,
}

/// Decode a screenshot and synthesize its theme.
pub fn generate_ui_theme(bytes: &[u8]) -> Result<PixelThemeReport> {
    let palette = extract_palette(bytes)?;
    Ok(PixelThemeReport {
        theme: synthesize_from_palette(&palette),
        dominant_colors: rank_dominant_colors(&palette),
        original_palette: palette,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{hex_to_rgb, is_canonical_hex};
    use crate::palette::SwatchRole;

    fn swatch(hex: &str, population: u32) -> Option<ColorSwatch> {
        Some(ColorSwatch::new(hex_to_rgb(hex).unwrap(), population))
    }

    #[test]
    fn empty_palette_uses_every_fallback() {
        let theme = synthesize_from_palette(&Palette::default());
        assert_eq!(theme.accent_color, "#007bff");
        assert_eq!(theme.headline_color, "#212529");
        assert_eq!(theme.text_color, "#343a40");
        assert_eq!(theme.background_color, "#ffffff");
        assert_eq!(theme.card_background_color, "#f8f9fa");
        assert_eq!(theme.card_icon_color, "#007bff");
        assert_eq!(theme.card_text_color, "#495057");
        assert_eq!(theme.accent_color_contrast, "#ffffff");
        assert_eq!(theme.default_gradient, DEFAULT_GRADIENT);
        assert_eq!(theme.color_mood, ColorMood::Neutral);
        assert!(theme.is_custom);
        assert!(theme.confidence.is_none());
    }

    #[test]
    fn vibrant_pair_drives_accent_and_gradient() {
        let mut palette = Palette::default();
        palette.set(SwatchRole::Vibrant, swatch("#3366cc", 500));
        palette.set(SwatchRole::DarkVibrant, swatch("#112255", 300));
        let theme = synthesize_from_palette(&palette);

        assert_eq!(theme.accent_color, "#3366cc");
        assert_eq!(theme.headline_color, "#112255");
        assert_eq!(theme.text_color, "#112255");
        assert_eq!(theme.card_text_color, "#112255");
        assert_eq!(
            theme.default_gradient,
            "linear-gradient(120deg, #3366cc 0%, #112255 100%)"
        );
        assert_eq!(theme.color_mood, ColorMood::Dark);
        assert_eq!(theme.accent_color_contrast, "#ffffff");
        assert!(theme.colors().iter().all(|c| is_canonical_hex(c)));
    }

    #[test]
    fn card_background_scales_light_swatch() {
        let mut palette = Palette::default();
        palette.set(SwatchRole::LightVibrant, swatch("#c8c8c8", 10));
        let theme = synthesize_from_palette(&palette);
        assert_eq!(theme.background_color, "#c8c8c8");
        assert_eq!(theme.card_background_color, "#bebebe");
    }

    #[test]
    fn light_accent_gets_black_contrast() {
        let mut palette = Palette::default();
        palette.set(SwatchRole::Vibrant, swatch("#ffff00", 1));
        let theme = synthesize_from_palette(&palette);
        assert_eq!(theme.accent_color_contrast, "#000000");
        assert_eq!(theme.color_mood, ColorMood::Light);
    }

    #[test]
    fn dark_vibrant_stands_in_for_accent() {
        let mut palette = Palette::default();
        palette.set(SwatchRole::DarkVibrant, swatch("#112255", 1));
        palette.set(SwatchRole::DarkMuted, swatch("#333333", 1));
        let theme = synthesize_from_palette(&palette);
        assert_eq!(theme.accent_color, "#112255");
        assert_eq!(theme.card_text_color, "#333333");
        assert_eq!(theme.default_gradient, DEFAULT_GRADIENT);
        assert_eq!(theme.color_mood, ColorMood::Neutral);
        assert_eq!(theme.accent_color_contrast, "#ffffff");
    }

    #[test]
    fn light_dark_vibrant_accent_keeps_white_contrast() {
        let mut palette = Palette::default();
        palette.set(SwatchRole::DarkVibrant, swatch("#e0e000", 1));
        let theme = synthesize_from_palette(&palette);
        assert_eq!(theme.accent_color, "#e0e000");
        assert_eq!(theme.color_mood, ColorMood::Neutral);
        assert_eq!(theme.accent_color_contrast, "#ffffff");
    }

    #[test]
    fn report_serializes_flat_theme_fields() {
        let report = generate_ui_theme(&{
            let img = image::RgbImage::from_pixel(8, 8, image::Rgb([0x33, 0x66, 0xcc]));
            let mut out = std::io::Cursor::new(Vec::new());
            img.write_to(&mut out, image::ImageFormat::Png).unwrap();
            out.into_inner()
        })
        .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["theme"]["accentColor"], "#3366cc");
        assert_eq!(json["theme"]["isCustom"], true);
        assert!(json["theme"].get("confidence").is_none());
        assert_eq!(json["dominantColors"][0]["name"], "Vibrant");
        assert!(json["originalPalette"]["Muted"].is_null());
    }
}
