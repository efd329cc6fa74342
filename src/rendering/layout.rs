//! Estimated block/inline layout for the simple engine.
//!
//! There is no real text shaping here: glyphs are assumed to be half the
//! font size wide and lines 1.2 times the font size tall. Blocks stack
//! vertically, inline elements flow left to right and wrap at the parent's
//! content width. The estimate is good enough for the logo heuristics, which
//! only look at rough sizes and at how far down the page an element sits.

use crate::page::{ElementRect, PageSnapshot};
use crate::rendering::style::{parse_px, CascadedStyle};
use crate::Viewport;

/// Elements that never produce a box.
const NON_RENDERED: [&str; 10] = [
    "head", "script", "style", "meta", "link", "title", "noscript", "template", "base", "br",
];

const INLINE: [&str; 16] = [
    "a", "span", "img", "button", "svg", "input", "strong", "em", "b", "i", "label", "small", "code", "select",
    "abbr", "picture",
];

const BODY_MARGIN: f64 = 8.0;
const LINE_HEIGHT: f64 = 1.2;
const GLYPH_WIDTH: f64 = 0.5;
const BUTTON_PADDING: f64 = 12.0;
const DEFAULT_SVG: (f64, f64) = (300.0, 150.0);

/// Line metrics of a laid out element, kept for painting text runs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextBox {
    pub lines: u32,
    pub line_height: f64,
    /// Width of the longest line.
    pub width: f64,
}

struct Ctx<'a> {
    page: &'a mut PageSnapshot,
    styles: &'a [CascadedStyle],
    children: Vec<Vec<usize>>,
    text: Vec<Option<TextBox>>,
}

fn is_inline(tag: &str) -> bool {
    INLINE.contains(&tag)
}

fn attr_px(page: &PageSnapshot, index: usize, name: &str) -> Option<f64> {
    page.elements[index].attr(name).and_then(parse_px)
}

/// Width/height hints from CSS, then from `width`/`height` attributes.
fn intrinsic_size(ctx: &Ctx<'_>, index: usize) -> (Option<f64>, Option<f64>) {
    let style = &ctx.styles[index];
    let mut width = style.width.or_else(|| attr_px(&*ctx.page, index, "width"));
    let mut height = style.height.or_else(|| attr_px(&*ctx.page, index, "height"));
    if ctx.page.elements[index].tag == "svg" && width.is_none() && height.is_none() {
        width = Some(DEFAULT_SVG.0);
        height = Some(DEFAULT_SVG.1);
    }
    (width, height)
}

fn wrap_text(chars: usize, font_px: f64, available: f64) -> TextBox {
    let glyph = font_px * GLYPH_WIDTH;
    let natural = chars as f64 * glyph;
    let per_line = ((available / glyph).floor() as usize).max(1);
    let lines = chars.div_ceil(per_line).max(1) as u32;
    TextBox {
        lines,
        line_height: font_px * LINE_HEIGHT,
        width: natural.min(available.max(glyph)),
    }
}

fn has_box(ctx: &Ctx<'_>, index: usize) -> bool {
    !ctx.styles[index].hidden && !NON_RENDERED.contains(&ctx.page.elements[index].tag.as_str())
}

/// Lay out `index` with its top-left corner at (`x`, `y`) and return its
/// (width, height).
fn place(ctx: &mut Ctx<'_>, index: usize, x: f64, y: f64, available: f64) -> (f64, f64) {
    if !has_box(ctx, index) {
        return (0.0, 0.0);
    }
    let tag = ctx.page.elements[index].tag.clone();
    if tag == "body" {
        let (w, h) = place_box(ctx, index, &tag, x + BODY_MARGIN, y + BODY_MARGIN, available - 2.0 * BODY_MARGIN);
        return (w + 2.0 * BODY_MARGIN, h + 2.0 * BODY_MARGIN);
    }
    place_box(ctx, index, &tag, x, y, available)
}

/// Shift an already placed subtree.
fn translate(ctx: &mut Ctx<'_>, index: usize, dx: f64, dy: f64) {
    if !has_box(ctx, index) {
        return;
    }
    let rect = &mut ctx.page.elements[index].rect;
    rect.left += dx;
    rect.top += dy;
    for i in 0..ctx.children[index].len() {
        let child = ctx.children[index][i];
        translate(ctx, child, dx, dy);
    }
}

fn place_box(ctx: &mut Ctx<'_>, index: usize, tag: &str, x: f64, y: f64, available: f64) -> (f64, f64) {
    let (hint_w, hint_h) = intrinsic_size(ctx, index);
    let font_px = ctx.styles[index].font_px();
    let inline = is_inline(tag);
    let padding = if tag == "button" { BUTTON_PADDING } else { 0.0 };

    let children: Vec<usize> = ctx.children[index].clone();
    let rendered_children = children
        .iter()
        .any(|&c| !NON_RENDERED.contains(&ctx.page.elements[c].tag.as_str()));

    let text_len = ctx.page.elements[index].text.chars().count();
    let width = hint_w.unwrap_or(if inline {
        (text_len as f64 * font_px * GLYPH_WIDTH + 2.0 * padding).min(available)
    } else {
        available
    });
    let content_w = (width - 2.0 * padding).max(0.0);

    let content_h = if rendered_children {
        // Block children stack; runs of inline children share line boxes.
        let mut cursor_y = y + padding;
        let mut line_x = 0.0;
        let mut line_h: f64 = 0.0;
        for child in children {
            let child_inline = is_inline(&ctx.page.elements[child].tag);
            if child_inline {
                let (cw, ch) = place(ctx, child, x + padding + line_x, cursor_y, content_w);
                if line_x > 0.0 && line_x + cw > content_w {
                    // Size does not depend on position, so wrapping only moves the subtree.
                    translate(ctx, child, -line_x, line_h);
                    cursor_y += line_h;
                    line_x = 0.0;
                    line_h = 0.0;
                }
                line_x += cw;
                line_h = line_h.max(ch);
            } else {
                cursor_y += line_h;
                line_x = 0.0;
                line_h = 0.0;
                let (_, ch) = place(ctx, child, x + padding, cursor_y, content_w);
                cursor_y += ch;
            }
        }
        cursor_y + line_h - (y + padding)
    } else if text_len > 0 {
        let text = wrap_text(text_len, font_px, content_w);
        ctx.text[index] = Some(text);
        text.lines as f64 * text.line_height
    } else {
        0.0
    };

    let height = hint_h.unwrap_or(content_h + 2.0 * padding);
    ctx.page.elements[index].rect = ElementRect {
        top: y,
        left: x,
        width,
        height,
    };
    (width, height)
}

/// Fill in `rect` for every element of `page` and return the document height
/// together with per-element text metrics.
pub fn layout_document(page: &mut PageSnapshot, styles: &[CascadedStyle], viewport: Viewport) -> (f64, Vec<Option<TextBox>>) {
    let count = page.elements.len();
    let mut children = vec![Vec::new(); count];
    let mut roots = Vec::new();
    for (i, el) in page.elements.iter().enumerate() {
        match el.parent {
            Some(p) if p < count => children[p].push(i),
            _ => roots.push(i),
        }
    }
    let mut ctx = Ctx {
        page,
        styles,
        children,
        text: vec![None; count],
    };

    let mut y = 0.0;
    for root in roots {
        let (_, h) = place(&mut ctx, root, 0.0, y, viewport.width as f64);
        y += h;
    }
    (y, ctx.text)
}
