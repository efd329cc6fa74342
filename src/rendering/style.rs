//! Minimal stylesheet cascade for the simple engine.
//!
//! Rules come from a small user-agent sheet, `<style>` blocks and linked
//! stylesheets, in that order; inline `style` attributes win over all of them.
//! Only the properties the theme extractor reads are tracked. `color` and the
//! `font-*` properties inherit, backgrounds and borders do not. Custom
//! properties declared on `:root`/`html` are collected for the page snapshot
//! and substituted into `var()` references.

use crate::color::normalize_css_color;
use crate::page::{ComputedStyle, PageSnapshot};
use crate::selector::{Selector, SelectorList};
use log::debug;

/// Defaults a browser would apply before any author styles.
const USER_AGENT_CSS: &str = r#"
html { color: rgb(0, 0, 0); font-family: "Times New Roman"; font-size: 16px; font-weight: 400 }
h1 { font-size: 32px; font-weight: 700 }
h2 { font-size: 24px; font-weight: 700 }
h3 { font-size: 18.72px; font-weight: 700 }
a { color: rgb(0, 0, 238) }
button { background-color: rgb(239, 239, 239); color: rgb(0, 0, 0); border-color: rgb(118, 118, 118) }
"#;

const MAX_VAR_DEPTH: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub selector: Selector,
    pub declarations: Vec<Declaration>,
}

/// Cascaded values for one element, including the layout hints the
/// estimated layout reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadedStyle {
    pub computed: ComputedStyle,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub hidden: bool,
}

impl CascadedStyle {
    /// Font size in pixels, 16 when unknown or relative.
    pub fn font_px(&self) -> f64 {
        parse_px(&self.computed.font_size).unwrap_or(16.0)
    }
}

/// Parse `px` lengths (bare numbers included); relative units yield `None`.
pub fn parse_px(value: &str) -> Option<f64> {
    let v = value.trim();
    let number = v.strip_suffix("px").unwrap_or(v).trim();
    number.parse::<f64>().ok().filter(|n| n.is_finite() && *n >= 0.0)
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Index of the `}` closing the block opened just before `from`.
fn matching_brace(css: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in css[from..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + i);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    block
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let mut value = value.trim();
            let important = match value.strip_suffix("!important") {
                Some(v) => {
                    value = v.trim();
                    true
                }
                None => false,
            };
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some(Declaration {
                name,
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

/// Parse a stylesheet into rules, one per supported selector.
///
/// At-rules are skipped whole. Selectors that cannot match a static page
/// (`:hover`, `::before`, ...) drop only themselves, not their comma
/// siblings.
pub fn parse_stylesheet(css: &str) -> Vec<Rule> {
    let css = strip_comments(css);
    let mut rules = Vec::new();
    let mut pos = 0;
    while let Some(open) = css[pos..].find('{').map(|i| pos + i) {
        let Some(close) = matching_brace(&css, open + 1) else {
            break;
        };
        let prelude = css[pos..open].trim();
        pos = close + 1;
        if prelude.starts_with('@') {
            continue;
        }
        let declarations = parse_declarations(&css[open + 1..close]);
        if declarations.is_empty() {
            continue;
        }
        for part in prelude.split(',') {
            let part = part.trim();
            match SelectorList::parse(part) {
                Ok(list) => {
                    for selector in list.selectors() {
                        rules.push(Rule {
                            selector: selector.clone(),
                            declarations: declarations.clone(),
                        });
                    }
                }
                Err(_) => debug!("skipping unsupported selector {:?}", part),
            }
        }
    }
    rules
}

fn resolve_vars(value: &str, vars: &[(String, String)], depth: usize) -> Option<String> {
    let Some(start) = value.find("var(") else {
        return Some(value.to_string());
    };
    if depth >= MAX_VAR_DEPTH {
        return None;
    }
    let inner_start = start + 4;
    let mut level = 1usize;
    let mut end = None;
    for (i, c) in value[inner_start..].char_indices() {
        match c {
            '(' => level += 1,
            ')' => {
                level -= 1;
                if level == 0 {
                    end = Some(inner_start + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end?;
    let inner = &value[inner_start..end];
    let (name, fallback) = match inner.split_once(',') {
        Some((n, f)) => (n.trim(), Some(f.trim())),
        None => (inner.trim(), None),
    };
    let replacement = vars
        .iter()
        .rev()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
        .or(fallback)?;
    let substituted = format!("{}{}{}", &value[..start], replacement, &value[end + 1..]);
    resolve_vars(&substituted, vars, depth + 1)
}

/// First token of a shorthand that is a color.
fn color_in_shorthand(value: &str) -> Option<String> {
    if let Some(c) = normalize_css_color(value) {
        return Some(c);
    }
    let mut depth = 0usize;
    let mut start = 0;
    let mut tokens = Vec::new();
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                tokens.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    tokens.push(&value[start..]);
    tokens
        .into_iter()
        .filter(|t| !t.is_empty())
        .find_map(normalize_css_color)
}

fn apply(style: &mut CascadedStyle, decl: &Declaration, vars: &[(String, String)]) {
    let Some(value) = resolve_vars(&decl.value, vars, 0) else {
        return;
    };
    let computed = &mut style.computed;
    match decl.name.as_str() {
        "color" => computed.color = value,
        "background-color" => computed.background_color = value,
        "background" => {
            if let Some(c) = color_in_shorthand(&value) {
                computed.background_color = c;
            }
        }
        "border-color" => computed.border_color = value,
        "border" => {
            if let Some(c) = color_in_shorthand(&value) {
                computed.border_color = c;
            }
        }
        "font-family" => computed.font_family = value,
        "font-size" => computed.font_size = value,
        "font-weight" => {
            computed.font_weight = match value.as_str() {
                "normal" => "400".to_string(),
                "bold" => "700".to_string(),
                _ => value,
            }
        }
        "width" => style.width = parse_px(&value),
        "height" => style.height = parse_px(&value),
        "display" => style.hidden = value == "none",
        _ => {}
    }
}

/// Compute styles for every element of `page` and fill in
/// [`PageSnapshot::root_properties`].
///
/// `author_sheets` are applied in order after the user-agent defaults.
pub fn cascade(page: &mut PageSnapshot, author_sheets: &[String]) -> Vec<CascadedStyle> {
    let mut rules = parse_stylesheet(USER_AGENT_CSS);
    for sheet in author_sheets {
        rules.extend(parse_stylesheet(sheet));
    }

    // Custom properties from the root element, in declaration order.
    let mut vars: Vec<(String, String)> = Vec::new();
    if !page.elements.is_empty() {
        for rule in rules.iter().filter(|r| r.selector.matches(page, 0)) {
            for decl in rule.declarations.iter().filter(|d| d.name.starts_with("--")) {
                vars.retain(|(n, _)| *n != decl.name);
                vars.push((decl.name.clone(), decl.value.clone()));
            }
        }
        if let Some(inline) = page.elements[0].attr("style") {
            for decl in parse_declarations(inline).into_iter().filter(|d| d.name.starts_with("--")) {
                vars.retain(|(n, _)| *n != decl.name);
                vars.push((decl.name, decl.value));
            }
        }
    }
    let resolved: Vec<(String, String)> = vars
        .iter()
        .filter_map(|(n, v)| resolve_vars(v, &vars, 0).map(|v| (n.clone(), v)))
        .collect();

    let mut styles: Vec<CascadedStyle> = Vec::with_capacity(page.elements.len());
    for index in 0..page.elements.len() {
        let mut style = CascadedStyle::default();
        let mut parent_hidden = false;
        if let Some(parent) = page.elements[index].parent.and_then(|p| styles.get(p)) {
            style.computed.color = parent.computed.color.clone();
            style.computed.font_family = parent.computed.font_family.clone();
            style.computed.font_size = parent.computed.font_size.clone();
            style.computed.font_weight = parent.computed.font_weight.clone();
            parent_hidden = parent.hidden;
        }

        let mut matched: Vec<(bool, (u32, u32, u32), usize, &Declaration)> = Vec::new();
        for (order, rule) in rules.iter().enumerate() {
            if rule.selector.matches(page, index) {
                let specificity = rule.selector.specificity();
                matched.extend(rule.declarations.iter().map(|d| (d.important, specificity, order, d)));
            }
        }
        // stable: declaration order breaks remaining ties
        matched.sort_by_key(|(important, specificity, order, _)| (*important, *specificity, *order));

        let inline = page.elements[index]
            .attr("style")
            .map(parse_declarations)
            .unwrap_or_default();
        let (inline_important, inline_normal): (Vec<_>, Vec<_>) = inline.iter().partition(|d| d.important);

        let normal = matched.iter().filter(|m| !m.0).map(|m| m.3);
        let important = matched.iter().filter(|m| m.0).map(|m| m.3);
        for decl in normal
            .chain(inline_normal.into_iter())
            .chain(important)
            .chain(inline_important.into_iter())
        {
            apply(&mut style, decl, &resolved);
        }
        style.hidden |= parent_hidden;
        styles.push(style);
    }

    for (el, style) in page.elements.iter_mut().zip(&styles) {
        el.style = style.computed.clone();
    }
    page.root_properties = resolved;
    styles
}
