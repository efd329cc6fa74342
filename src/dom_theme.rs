//! Theme synthesis from DOM signals.

use crate::color::{contrast_color, is_light_hex, shift_brightness};
use crate::signals::{DomSignalSnapshot, FontInfo, FontLink, LogoCandidate};
use crate::theme::{
    linear_gradient, ColorMood, Theme, DEFAULT_ACCENT, DEFAULT_BACKGROUND, DEFAULT_HEADLINE, DEFAULT_TEXT,
    FALLBACK_FONT_STACK,
};
use serde::Serialize;

const ACCENT_VARIABLE_HINTS: [&str; 3] = ["primary", "accent", "brand"];
const CARD_SHIFT: f64 = 0.05;
const GRADIENT_SHIFT: f64 = -0.2;

/// Ranked logo candidates with the best one singled out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoInfo {
    pub logos: Vec<LogoCandidate>,
    pub primary_logo: Option<LogoCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFonts {
    pub heading_font: Option<FontInfo>,
    pub body_font: Option<FontInfo>,
    pub font_links: Vec<FontLink>,
}

/// DOM-path theme: the common [`Theme`] plus logo and font debug data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomTheme {
    #[serde(flatten)]
    pub theme: Theme,
    pub logo_info: LogoInfo,
    pub extracted_fonts: ExtractedFonts,
}

fn accent_color(signals: &DomSignalSnapshot) -> String {
    let from_variable = signals
        .css_variables
        .iter()
        .find(|v| ACCENT_VARIABLE_HINTS.iter().any(|h| v.name.contains(h)))
        .map(|v| v.value.clone());
    let from_button = || {
        signals
            .buttons
            .iter()
            .filter_map(|b| b.background_color.as_ref())
            .find(|bg| !is_light_hex(bg))
            .cloned()
    };
    from_variable
        .or_else(from_button)
        .unwrap_or_else(|| DEFAULT_ACCENT.to_string())
}

/// Heuristic signal reliability in `[0, 1]`.
pub fn calculate_confidence(signals: &DomSignalSnapshot) -> f64 {
    // tenths, so that a full score is exactly 1.0
    let mut score = 0u32;
    if !signals.css_variables.is_empty() {
        score += 4;
    }
    if signals.buttons.iter().any(|b| b.background_color.is_some()) {
        score += 3;
    }
    if !signals.navigation.is_empty() {
        score += 2;
    }
    if signals.headers.len() > 2 {
        score += 1;
    }
    score.min(10) as f64 / 10.0
}

/// Resolve each theme role from the signals; never fails.
pub fn synthesize_from_signals(signals: &DomSignalSnapshot) -> DomTheme {
    let accent_color = accent_color(signals);

    let background_color = signals
        .backgrounds
        .iter()
        .find(|b| b.selector == "body")
        .map(|b| b.background_color.clone())
        .unwrap_or_else(|| DEFAULT_BACKGROUND.to_string());

    let headline_color = signals
        .headers
        .first()
        .map(|h| h.color.clone())
        .unwrap_or_else(|| DEFAULT_HEADLINE.to_string());
    // second heading, else first link
    let text_color = signals
        .headers
        .get(1)
        .map(|h| h.color.clone())
        .or_else(|| signals.links.first().cloned())
        .unwrap_or_else(|| DEFAULT_TEXT.to_string());

    let background_is_light = is_light_hex(&background_color);
    let card_background_color = if background_is_light {
        shift_brightness(&background_color, -CARD_SHIFT)
    } else {
        shift_brightness(&background_color, CARD_SHIFT)
    };

    let fonts = &signals.fonts;
    let font_family = fonts
        .body_font
        .as_ref()
        .map(|f| f.font_family.clone())
        .unwrap_or_else(|| FALLBACK_FONT_STACK.to_string());
    let heading_font_family = fonts
        .heading_font
        .as_ref()
        .map(|f| f.font_family.clone())
        .unwrap_or_else(|| FALLBACK_FONT_STACK.to_string());
    let font_link = fonts.font_links.first().map(|l| l.href.clone());

    let theme = Theme {
        accent_color_contrast: contrast_color(&accent_color).to_string(),
        default_gradient: linear_gradient(&accent_color, &shift_brightness(&accent_color, GRADIENT_SHIFT)),
        card_icon_color: accent_color.clone(),
        card_text_color: text_color.clone(),
        accent_color,
        headline_color,
        text_color,
        background_color,
        card_background_color,
        font_family,
        heading_font_family,
        heading_font_link: font_link.clone(),
        font_link,
        color_mood: ColorMood::from_light(background_is_light),
        is_custom: true,
        confidence: Some(calculate_confidence(signals)),
    };

    DomTheme {
        theme,
        logo_info: LogoInfo {
            primary_logo: signals.logos.first().cloned(),
            logos: signals.logos.clone(),
        },
        extracted_fonts: ExtractedFonts {
            heading_font: fonts.heading_font.clone(),
            body_font: fonts.body_font.clone(),
            font_links: fonts.font_links.clone(),
        },
    }
}

/// DOM-path result: the theme plus the raw signals it came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomThemeReport {
    pub theme: DomTheme,
    pub raw_analysis: DomSignalSnapshot,
    /// RFC 3339 timestamp of the analysis.
    pub extracted_at: String,
}

impl DomThemeReport {
    pub fn new(signals: DomSignalSnapshot) -> Self {
        Self {
            theme: synthesize_from_signals(&signals),
            raw_analysis: signals,
            extracted_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::is_canonical_hex;
    use crate::signals::{
        BackgroundSignal, ButtonSignal, CssVariable, HeadingSignal, LogoPosition, LogoReason, LogoSource,
        NavigationSignal,
    };

    fn heading(color: &str) -> HeadingSignal {
        HeadingSignal {
            tag: "h2".into(),
            color: color.into(),
            text: String::new(),
        }
    }

    fn button(bg: Option<&str>) -> ButtonSignal {
        ButtonSignal {
            selector: "button".into(),
            background_color: bg.map(str::to_string),
            color: None,
            border_color: None,
            class_name: String::new(),
            text: String::new(),
        }
    }

    #[test]
    fn empty_snapshot_uses_fallbacks() {
        let dom = synthesize_from_signals(&DomSignalSnapshot::default());
        let t = &dom.theme;
        assert_eq!(t.accent_color, "#007bff");
        assert_eq!(t.background_color, "#ffffff");
        assert_eq!(t.headline_color, "#212529");
        assert_eq!(t.text_color, "#343a40");
        assert_eq!(t.card_background_color, "#f2f2f2");
        assert_eq!(t.accent_color_contrast, "#ffffff");
        assert_eq!(t.color_mood, ColorMood::Light);
        assert_eq!(t.confidence, Some(0.0));
        assert_eq!(t.font_family, FALLBACK_FONT_STACK);
        assert!(t.font_link.is_none());
        assert!(dom.logo_info.primary_logo.is_none());
        assert!(t.colors().iter().all(|c| is_canonical_hex(c)));
    }

    #[test]
    fn brand_variable_alone() {
        let signals = DomSignalSnapshot {
            css_variables: vec![CssVariable {
                name: "--brand-color".into(),
                value: "#ff0000".into(),
            }],
            ..Default::default()
        };
        let t = synthesize_from_signals(&signals).theme;
        assert_eq!(t.accent_color, "#ff0000");
        assert_eq!(t.confidence, Some(0.4));
        assert_eq!(t.default_gradient, "linear-gradient(120deg, #ff0000 0%, #cc0000 100%)");
    }

    #[test]
    fn accent_skips_light_button_backgrounds() {
        let signals = DomSignalSnapshot {
            css_variables: vec![CssVariable {
                name: "--text-color".into(),
                value: "#222222".into(),
            }],
            buttons: vec![button(None), button(Some("#fafafa")), button(Some("#0044aa"))],
            ..Default::default()
        };
        let t = synthesize_from_signals(&signals).theme;
        assert_eq!(t.accent_color, "#0044aa");
        assert_eq!(t.card_icon_color, "#0044aa");
    }

    #[test]
    fn text_color_prefers_second_heading_then_link() {
        let mut signals = DomSignalSnapshot {
            headers: vec![heading("#111111")],
            links: vec!["#0000ee".into()],
            ..Default::default()
        };
        let t = synthesize_from_signals(&signals).theme;
        assert_eq!(t.headline_color, "#111111");
        assert_eq!(t.text_color, "#0000ee");
        assert_eq!(t.card_text_color, "#0000ee");

        signals.headers.push(heading("#222222"));
        let t = synthesize_from_signals(&signals).theme;
        assert_eq!(t.text_color, "#222222");
    }

    #[test]
    fn dark_background_lightens_cards() {
        let signals = DomSignalSnapshot {
            backgrounds: vec![
                BackgroundSignal {
                    selector: "main".into(),
                    background_color: "#ffffff".into(),
                },
                BackgroundSignal {
                    selector: "body".into(),
                    background_color: "#141414".into(),
                },
            ],
            ..Default::default()
        };
        let t = synthesize_from_signals(&signals).theme;
        assert_eq!(t.background_color, "#141414");
        assert_eq!(t.card_background_color, "#151515");
        assert_eq!(t.color_mood, ColorMood::Dark);
    }

    #[test]
    fn full_signal_set_reaches_confidence_one() {
        let signals = DomSignalSnapshot {
            css_variables: vec![CssVariable {
                name: "--primary-color".into(),
                value: "#123456".into(),
            }],
            buttons: vec![button(Some("#123456"))],
            navigation: vec![NavigationSignal {
                selector: "nav".into(),
                background_color: None,
                color: Some("#000000".into()),
            }],
            headers: vec![heading("#010101"), heading("#020202"), heading("#030303")],
            ..Default::default()
        };
        assert_eq!(calculate_confidence(&signals), 1.0);
        let without_headings = DomSignalSnapshot {
            headers: vec![heading("#010101"), heading("#020202")],
            ..signals
        };
        assert_eq!(calculate_confidence(&without_headings), 0.9);
    }

    #[test]
    fn primary_logo_is_top_ranked_and_fonts_pass_through() {
        let logo = LogoCandidate {
            source: LogoSource::Image {
                src: "/logo.svg".into(),
                alt: "logo".into(),
            },
            score: 90,
            reason: LogoReason::HeaderImageGoodSize,
            width: 120.0,
            height: 40.0,
            position: LogoPosition::Header,
        };
        let mut signals = DomSignalSnapshot {
            logos: vec![logo.clone()],
            ..Default::default()
        };
        signals.fonts.body_font = Some(FontInfo {
            font_family: "Roboto, sans-serif".into(),
            font_size: "16px".into(),
            font_weight: "400".into(),
            source: "p".into(),
        });
        signals.fonts.font_links.push(FontLink {
            href: "https://fonts.googleapis.com/css?family=Roboto".into(),
            kind: "external".into(),
        });

        let dom = synthesize_from_signals(&signals);
        assert_eq!(dom.logo_info.primary_logo, Some(logo));
        assert_eq!(dom.theme.font_family, "Roboto, sans-serif");
        assert_eq!(dom.theme.heading_font_family, FALLBACK_FONT_STACK);
        assert_eq!(dom.theme.heading_font_link, dom.theme.font_link);

        let json = serde_json::to_value(&dom).unwrap();
        assert_eq!(json["fontLink"], "https://fonts.googleapis.com/css?family=Roboto");
        assert_eq!(json["logoInfo"]["primaryLogo"]["score"], 90);
        assert_eq!(json["confidence"], 0.0);
    }
}
