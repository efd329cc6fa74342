//! Heading/body font probing and web-font link discovery.

use crate::page::{ElementSnapshot, PageSnapshot};
use crate::selector::static_selector;
use serde::{Deserialize, Serialize};

const FONT_LINKS: &str = "link[href*=\"fonts.googleapis.com\"], link[href*=\"fonts.gstatic.com\"], \
                          link[href*=\"typekit.net\"], link[href*=\"fonts.adobe.com\"]";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontInfo {
    /// Family list with quotes removed.
    pub font_family: String,
    pub font_size: String,
    pub font_weight: String,
    /// Tag the font was read from.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontLink {
    pub href: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSignals {
    pub heading_font: Option<FontInfo>,
    pub body_font: Option<FontInfo>,
    pub font_links: Vec<FontLink>,
}

fn font_of(el: &ElementSnapshot) -> Option<FontInfo> {
    let family = el.style.font_family.replace(['"', '\''], "");
    if family.trim().is_empty() {
        return None;
    }
    Some(FontInfo {
        font_family: family.trim().to_string(),
        font_size: el.style.font_size.clone(),
        font_weight: el.style.font_weight.clone(),
        source: el.tag.clone(),
    })
}

pub fn extract_fonts(page: &PageSnapshot) -> FontSignals {
    let links = static_selector(FONT_LINKS);
    let font_links = page
        .select(&links)
        .filter_map(|(_, el)| el.attr("href"))
        .map(|href| FontLink {
            href: href.to_string(),
            kind: "external".to_string(),
        })
        .collect();

    let heading_font = ["h1", "h2", "h3"].iter().find_map(|tag| {
        let list = static_selector(tag);
        page.select_first(&list).and_then(|(_, el)| font_of(el))
    });

    let body_font = ["p", "body"]
        .iter()
        .find_map(|tag| page.select_first(&static_selector(tag)).map(|(_, el)| el))
        .and_then(font_of);

    FontSignals {
        heading_font,
        body_font,
        font_links,
    }
}
