//! DOM signal extraction.
//!
//! [`collect_signals`] walks a [`PageSnapshot`] and records the colors of the
//! elements that usually carry a site's branding: CSS custom properties,
//! buttons, navigation bars, headings, links and page backgrounds, together
//! with logo candidates and the heading/body fonts. It is a pure function of
//! the snapshot; engines only have to produce the snapshot.

pub mod fonts;
pub mod logos;

pub use fonts::{FontInfo, FontLink, FontSignals};
pub use logos::{LogoCandidate, LogoPosition, LogoReason, LogoSource};

use crate::color::normalize_css_color;
use crate::page::PageSnapshot;
use crate::selector::static_selector;
use log::debug;
use serde::{Deserialize, Serialize};

const MAX_BUTTONS: usize = 10;
const MAX_HEADINGS: usize = 5;
const MAX_LINKS: usize = 20;
const BUTTON_TEXT_LEN: usize = 50;
const HEADING_TEXT_LEN: usize = 30;

const BUTTON_SELECTORS: [&str; 10] = [
    "button",
    ".btn",
    ".button",
    "[role=\"button\"]",
    ".btn-primary",
    ".primary-btn",
    ".cta",
    ".call-to-action",
    "input[type=\"submit\"]",
    "input[type=\"button\"]",
];

const NAVIGATION_SELECTORS: [&str; 8] = [
    "header",
    "nav",
    ".navbar",
    ".navigation",
    ".header",
    ".site-header",
    ".main-nav",
    ".top-bar",
];

const BACKGROUND_SELECTORS: [&str; 5] = ["body", "main", ".main", ".container", ".wrapper"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CssVariable {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonSignal {
    pub selector: String,
    pub background_color: Option<String>,
    pub color: Option<String>,
    pub border_color: Option<String>,
    pub class_name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSignal {
    pub selector: String,
    pub background_color: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingSignal {
    pub tag: String,
    pub color: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundSignal {
    pub selector: String,
    pub background_color: String,
}

/// Everything observed on one page render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomSignalSnapshot {
    pub css_variables: Vec<CssVariable>,
    pub buttons: Vec<ButtonSignal>,
    pub navigation: Vec<NavigationSignal>,
    pub headers: Vec<HeadingSignal>,
    pub links: Vec<String>,
    pub backgrounds: Vec<BackgroundSignal>,
    pub logos: Vec<LogoCandidate>,
    pub fonts: FontSignals,
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect()
}

/// Reduce a page snapshot to its theme signals.
pub fn collect_signals(page: &PageSnapshot) -> DomSignalSnapshot {
    let signals = DomSignalSnapshot {
        css_variables: css_variables(page),
        buttons: buttons(page),
        navigation: navigation(page),
        headers: headings(page),
        links: link_colors(page),
        backgrounds: backgrounds(page),
        logos: logos::find_logos(page),
        fonts: fonts::extract_fonts(page),
    };
    debug!(
        "signals for {}: {} vars, {} buttons, {} nav, {} headings, {} links, {} logos",
        page.url,
        signals.css_variables.len(),
        signals.buttons.len(),
        signals.navigation.len(),
        signals.headers.len(),
        signals.links.len(),
        signals.logos.len()
    );
    signals
}

fn css_variables(page: &PageSnapshot) -> Vec<CssVariable> {
    page.root_properties
        .iter()
        .filter(|(name, _)| name.starts_with("--") && name.contains("color"))
        .filter_map(|(name, value)| {
            normalize_css_color(value).map(|value| CssVariable {
                name: name.clone(),
                value,
            })
        })
        .collect()
}

fn buttons(page: &PageSnapshot) -> Vec<ButtonSignal> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for selector in BUTTON_SELECTORS {
        let list = static_selector(selector);
        for (index, el) in page.select(&list) {
            if out.len() >= MAX_BUTTONS {
                return out;
            }
            if seen.contains(&index) {
                continue;
            }
            let background_color = normalize_css_color(&el.style.background_color);
            let color = normalize_css_color(&el.style.color);
            let border_color = normalize_css_color(&el.style.border_color);
            if background_color.is_none() && color.is_none() && border_color.is_none() {
                continue;
            }
            seen.push(index);
            out.push(ButtonSignal {
                selector: selector.to_string(),
                background_color,
                color,
                border_color,
                class_name: el.class_name().to_string(),
                text: truncate(&el.text, BUTTON_TEXT_LEN),
            });
        }
    }
    out
}

fn navigation(page: &PageSnapshot) -> Vec<NavigationSignal> {
    let mut out = Vec::new();
    for selector in NAVIGATION_SELECTORS {
        let list = static_selector(selector);
        for (_, el) in page.select(&list) {
            let background_color = normalize_css_color(&el.style.background_color);
            let color = normalize_css_color(&el.style.color);
            if background_color.is_some() || color.is_some() {
                out.push(NavigationSignal {
                    selector: selector.to_string(),
                    background_color,
                    color,
                });
            }
        }
    }
    out
}

fn headings(page: &PageSnapshot) -> Vec<HeadingSignal> {
    let list = static_selector("h1, h2, h3");
    page.select(&list)
        .take(MAX_HEADINGS)
        .filter_map(|(_, el)| {
            normalize_css_color(&el.style.color).map(|color| HeadingSignal {
                tag: el.tag.clone(),
                color,
                text: truncate(&el.text, HEADING_TEXT_LEN),
            })
        })
        .collect()
}

fn link_colors(page: &PageSnapshot) -> Vec<String> {
    let list = static_selector("a");
    let mut colors: Vec<String> = Vec::new();
    for (_, el) in page.select(&list).take(MAX_LINKS) {
        if let Some(color) = normalize_css_color(&el.style.color) {
            if !colors.contains(&color) {
                colors.push(color);
            }
        }
    }
    colors
}

fn backgrounds(page: &PageSnapshot) -> Vec<BackgroundSignal> {
    BACKGROUND_SELECTORS
        .iter()
        .filter_map(|selector| {
            let list = static_selector(selector);
            let (_, el) = page.select_first(&list)?;
            normalize_css_color(&el.style.background_color).map(|background_color| BackgroundSignal {
                selector: selector.to_string(),
                background_color,
            })
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::PageBuilder;
    use super::*;

    #[test]
    fn empty_page_has_no_signals() {
        let signals = collect_signals(&PageSnapshot::default());
        assert_eq!(signals, DomSignalSnapshot::default());
    }

    #[test]
    fn keeps_only_color_variables_that_normalize() {
        let mut b = PageBuilder::new();
        b.page.root_properties = vec![
            ("--brand-color".into(), " #FF0000 ".into()),
            ("--spacing".into(), "4px".into()),
            ("--text-color".into(), "var(--x)".into()),
            ("--bg-color".into(), "rgb(250, 250, 250)".into()),
        ];
        let signals = collect_signals(&b.page);
        let names: Vec<_> = signals.css_variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["--brand-color", "--bg-color"]);
        assert_eq!(signals.css_variables[0].value, "#ff0000");
    }

    #[test]
    fn buttons_are_capped_and_recorded_once() {
        let mut b = PageBuilder::new();
        let body = b.body();
        for i in 0..12 {
            b.add(body, "button", &[("class", "btn cta")], |el| {
                el.style.background_color = format!("rgb({}, 0, 0)", i * 10);
                el.text = format!("  Buy now, offer number {} with a long trailing description  ", i);
            });
        }
        b.add(body, "a", &[("role", "button")], |el| el.style.color = "rgba(0,0,0,0)".into());
        let signals = collect_signals(&b.page);
        assert_eq!(signals.buttons.len(), 10);
        assert!(signals.buttons.iter().all(|btn| btn.selector == "button"));
        assert_eq!(signals.buttons[1].background_color.as_deref(), Some("#0a0000"));
        assert!(signals.buttons[0].text.chars().count() <= 50);
        assert!(signals.buttons[0].text.starts_with("Buy now"));
        assert_eq!(signals.buttons[0].class_name, "btn cta");
    }

    #[test]
    fn headings_take_first_five_in_document_order() {
        let mut b = PageBuilder::new();
        let body = b.body();
        for tag in ["h2", "h1", "h3", "h2", "h1", "h1"] {
            b.add(body, tag, &[], |el| {
                el.style.color = "rgb(17, 17, 17)".into();
                el.text = tag.to_uppercase();
            });
        }
        let signals = collect_signals(&b.page);
        let tags: Vec<_> = signals.headers.iter().map(|h| h.tag.as_str()).collect();
        assert_eq!(tags, vec!["h2", "h1", "h3", "h2", "h1"]);
        assert_eq!(signals.headers[0].color, "#111111");
    }

    #[test]
    fn link_colors_are_distinct_and_limited() {
        let mut b = PageBuilder::new();
        let body = b.body();
        for i in 0..25 {
            let color = if i % 2 == 0 { "rgb(0, 0, 255)" } else { "rgb(255, 0, 0)" };
            b.add(body, "a", &[], |el| el.style.color = color.into());
        }
        let last = b.add(body, "a", &[], |el| el.style.color = "rgb(0, 255, 0)".into());
        assert_eq!(last, 27);
        let signals = collect_signals(&b.page);
        assert_eq!(signals.links, vec!["#0000ff", "#ff0000"]);
    }

    #[test]
    fn navigation_and_backgrounds() {
        let mut b = PageBuilder::new();
        let body = b.body();
        b.page.elements[body].style.background_color = "rgb(255, 255, 255)".into();
        b.add(body, "header", &[("class", "header")], |el| {
            el.style.background_color = "rgb(0, 0, 0)".into();
        });
        b.add(body, "div", &[("class", "container")], |el| {
            el.style.background_color = "transparent".into();
        });
        let signals = collect_signals(&b.page);
        let selectors: Vec<_> = signals.navigation.iter().map(|n| n.selector.as_str()).collect();
        assert_eq!(selectors, vec!["header", ".header"]);
        assert_eq!(signals.backgrounds.len(), 1);
        assert_eq!(signals.backgrounds[0].selector, "body");
        assert_eq!(signals.backgrounds[0].background_color, "#ffffff");
    }
}
