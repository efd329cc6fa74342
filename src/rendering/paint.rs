//! Display list construction.

use crate::color::{hex_to_rgb, normalize_css_color, Rgb};
use crate::page::PageSnapshot;
use crate::rendering::layout::TextBox;

/// Fraction of a line box covered by glyph ink.
const INK_RATIO: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: (u8, u8, u8, u8),
    },
    /// A run of text, painted as one ink bar per line.
    Text {
        x: i32,
        y: i32,
        width: u32,
        lines: u32,
        line_height: u32,
        rgba: (u8, u8, u8, u8),
    },
}

fn opaque(value: &str) -> Option<Rgb> {
    normalize_css_color(value).and_then(|hex| hex_to_rgb(&hex))
}

/// Background of the whole canvas: the root's, else the body's, else white.
pub fn canvas_color(page: &PageSnapshot) -> Rgb {
    let of = |tag: &str| {
        page.elements
            .iter()
            .find(|e| e.tag == tag)
            .and_then(|e| opaque(&e.style.background_color))
    };
    of("html").or_else(|| of("body")).unwrap_or((255, 255, 255))
}

/// Paint commands in document order: canvas, then each element's
/// background followed by its text.
pub fn build_display_list(page: &PageSnapshot, text: &[Option<TextBox>], width: u32, height: u32) -> Vec<PaintCommand> {
    let (r, g, b) = canvas_color(page);
    let mut commands = vec![PaintCommand::SolidRect {
        x: 0,
        y: 0,
        width,
        height,
        rgba: (r, g, b, 255),
    }];

    for (index, el) in page.elements.iter().enumerate() {
        let rect = el.rect;
        if rect.width <= 0.0 || rect.height <= 0.0 {
            continue;
        }
        if let Some((r, g, b)) = opaque(&el.style.background_color) {
            commands.push(PaintCommand::SolidRect {
                x: rect.left.round() as i32,
                y: rect.top.round() as i32,
                width: rect.width.round() as u32,
                height: rect.height.round() as u32,
                rgba: (r, g, b, 255),
            });
        }
        let Some(Some(run)) = text.get(index) else {
            continue;
        };
        if let Some((r, g, b)) = opaque(&el.style.color) {
            commands.push(PaintCommand::Text {
                x: rect.left.round() as i32,
                y: rect.top.round() as i32,
                width: run.width.round() as u32,
                lines: run.lines,
                line_height: run.line_height.round().max(1.0) as u32,
                rgba: (r, g, b, 255),
            });
        }
    }
    commands
}

/// Expand a text command into its ink bars.
pub fn ink_bars(x: i32, y: i32, width: u32, lines: u32, line_height: u32) -> impl Iterator<Item = (i32, i32, u32, u32)> {
    let ink = ((line_height as f64 * INK_RATIO).round() as u32).max(1);
    let inset = (line_height - ink) / 2;
    (0..lines).map(move |line| (x, y + (line * line_height + inset) as i32, width, ink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{ElementRect, ElementSnapshot};

    fn element(tag: &str, bg: &str, color: &str, rect: ElementRect) -> ElementSnapshot {
        let mut el = ElementSnapshot::new(tag);
        el.style.background_color = bg.into();
        el.style.color = color.into();
        el.rect = rect;
        el
    }

    #[test]
    fn canvas_prefers_root_then_body() {
        let mut page = PageSnapshot::default();
        page.push(element("html", "", "", ElementRect::default()));
        page.push(element("body", "rgb(20, 20, 20)", "", ElementRect::default()));
        assert_eq!(canvas_color(&page), (20, 20, 20));
        page.elements[0].style.background_color = "#ffeedd".into();
        assert_eq!(canvas_color(&page), (255, 238, 221));
    }

    #[test]
    fn skips_empty_boxes_and_transparent_backgrounds() {
        let mut page = PageSnapshot::default();
        let rect = ElementRect {
            top: 10.0,
            left: 5.0,
            width: 100.0,
            height: 20.0,
        };
        page.push(element("div", "rgba(0, 0, 0, 0)", "", rect));
        page.push(element("span", "#ff0000", "", ElementRect::default()));
        page.push(element("p", "#00ff00", "#000000", rect));
        let text = vec![
            None,
            None,
            Some(TextBox {
                lines: 2,
                line_height: 19.2,
                width: 80.0,
            }),
        ];
        let commands = build_display_list(&page, &text, 200, 100);
        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[1],
            PaintCommand::SolidRect {
                x: 5,
                y: 10,
                width: 100,
                height: 20,
                rgba: (0, 255, 0, 255)
            }
        );
        assert!(matches!(commands[2], PaintCommand::Text { lines: 2, line_height: 19, .. }));
    }

    #[test]
    fn ink_bars_sit_inside_line_boxes() {
        let bars: Vec<_> = ink_bars(0, 0, 50, 2, 20).collect();
        assert_eq!(bars, vec![(0, 5, 50, 10), (0, 25, 50, 10)]);
    }
}
