//! Logo candidate detection.
//!
//! Three strategies propose candidates, each with its own size window and
//! base score: images and SVGs inside header areas, elements matched by
//! explicit logo selectors, and keyword-named images near the top of the
//! viewport. Candidates are deduplicated by source, ranked by score and cut to
//! the top three.

use crate::page::{ElementSnapshot, PageSnapshot};
use crate::selector::static_selector;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const MAX_LOGOS: usize = 3;
const SVG_MARKUP_LEN: usize = 300;
const TOP_AREA_FRACTION: f64 = 0.3;
const LOGO_KEYWORDS: [&str; 4] = ["logo", "brand", "company", "site"];

const HEADER_AREAS: &str = "header, nav, .navbar, .header, .site-header, .top-bar";

const EXPLICIT_LOGO_SELECTORS: [&str; 11] = [
    "img[alt*=\"logo\" i]",
    "img[class*=\"logo\" i]",
    "img[id*=\"logo\" i]",
    ".logo img",
    ".brand img",
    ".site-logo img",
    ".company-logo img",
    "svg[class*=\"logo\" i]",
    "svg[id*=\"logo\" i]",
    ".logo svg",
    ".brand svg",
];

/// Where a candidate's pixels come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogoSource {
    Image {
        src: String,
        alt: String,
    },
    Svg {
        /// SHA-256 of `markup`, used as the candidate's identity.
        digest: String,
        #[serde(rename = "viewBox")]
        view_box: Option<String>,
        markup: String,
    },
}

impl LogoSource {
    fn from_element(el: &ElementSnapshot) -> Option<Self> {
        match el.tag.as_str() {
            "img" => Some(LogoSource::Image {
                src: el.attr("src").unwrap_or_default().to_string(),
                alt: el.attr("alt").unwrap_or_default().to_string(),
            }),
            "svg" => {
                let markup: String = el
                    .markup
                    .as_deref()
                    .unwrap_or_default()
                    .chars()
                    .take(SVG_MARKUP_LEN)
                    .collect();
                Some(LogoSource::Svg {
                    digest: hex::encode(Sha256::digest(markup.as_bytes())),
                    view_box: el.attr("viewbox").or_else(|| el.attr("viewBox")).map(str::to_string),
                    markup,
                })
            }
            _ => None,
        }
    }

    /// Identity used for de-duplication.
    pub fn identity(&self) -> (&'static str, &str) {
        match self {
            LogoSource::Image { src, .. } => ("image", src),
            LogoSource::Svg { digest, .. } => ("svg", digest),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogoReason {
    HeaderImageGoodSize,
    HeaderSvgGoodSize,
    ExplicitLogoSelector,
    LogoCharacteristics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogoPosition {
    Header,
    Explicit,
    TopArea,
}

/// An element hypothesized to be the site's brand mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoCandidate {
    #[serde(flatten)]
    pub source: LogoSource,
    pub score: u32,
    pub reason: LogoReason,
    pub width: f64,
    pub height: f64,
    pub position: LogoPosition,
}

fn candidate(el: &ElementSnapshot, score: u32, reason: LogoReason, position: LogoPosition) -> Option<LogoCandidate> {
    Some(LogoCandidate {
        source: LogoSource::from_element(el)?,
        score,
        reason,
        width: el.rect.width,
        height: el.rect.height,
        position,
    })
}

fn header_candidates(page: &PageSnapshot) -> Vec<LogoCandidate> {
    let areas = static_selector(HEADER_AREAS);
    let images = static_selector("img");
    let svgs = static_selector("svg");
    let fits = |el: &ElementSnapshot| {
        (80.0..=400.0).contains(&el.rect.width) && (20.0..=200.0).contains(&el.rect.height)
    };

    let mut out = Vec::new();
    for (area, _) in page.select(&areas) {
        out.extend(
            page.select_within(area, &images)
                .filter(|(_, el)| fits(el))
                .filter_map(|(_, el)| candidate(el, 90, LogoReason::HeaderImageGoodSize, LogoPosition::Header)),
        );
        out.extend(
            page.select_within(area, &svgs)
                .filter(|(_, el)| fits(el))
                .filter_map(|(_, el)| candidate(el, 85, LogoReason::HeaderSvgGoodSize, LogoPosition::Header)),
        );
    }
    out
}

fn explicit_candidates(page: &PageSnapshot) -> Vec<LogoCandidate> {
    EXPLICIT_LOGO_SELECTORS
        .iter()
        .flat_map(|selector| {
            let list = static_selector(selector);
            page.select(&list)
                .filter(|(_, el)| (60.0..=500.0).contains(&el.rect.width))
                .filter_map(|(_, el)| candidate(el, 80, LogoReason::ExplicitLogoSelector, LogoPosition::Explicit))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn keyword_candidates(page: &PageSnapshot) -> Vec<LogoCandidate> {
    let images = static_selector("img");
    let top_limit = page.viewport.height as f64 * TOP_AREA_FRACTION;
    page.select(&images)
        .filter(|(_, el)| {
            let src = el.attr("src").unwrap_or_default().to_lowercase();
            let alt = el.attr("alt").unwrap_or_default().to_lowercase();
            let named = LOGO_KEYWORDS.iter().any(|k| src.contains(k) || alt.contains(k));
            let rect = el.rect;
            named
                && rect.top <= top_limit
                && (80.0..=350.0).contains(&rect.width)
                && (25.0..=150.0).contains(&rect.height)
        })
        .filter_map(|(_, el)| candidate(el, 70, LogoReason::LogoCharacteristics, LogoPosition::TopArea))
        .collect()
}

/// Keep the first candidate per source, best score first, at most three.
pub fn rank_logos(candidates: Vec<LogoCandidate>) -> Vec<LogoCandidate> {
    let mut unique: Vec<LogoCandidate> = Vec::new();
    for c in candidates {
        if !unique.iter().any(|u| u.source.identity() == c.source.identity()) {
            unique.push(c);
        }
    }
    unique.sort_by(|a, b| b.score.cmp(&a.score));
    unique.truncate(MAX_LOGOS);
    unique
}

/// Run all three strategies and rank their candidates.
pub fn find_logos(page: &PageSnapshot) -> Vec<LogoCandidate> {
    let mut candidates = header_candidates(page);
    candidates.extend(explicit_candidates(page));
    candidates.extend(keyword_candidates(page));
    rank_logos(candidates)
}
