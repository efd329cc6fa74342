//! Rendering pipeline for the simple engine: cascade, estimated layout,
//! painting and rasterization.

pub mod layout;
pub mod paint;
pub mod raster;
pub mod style;

use crate::page::PageSnapshot;
use crate::{Result, Viewport};
use layout::TextBox;

/// Tallest full-page capture, in viewport heights.
const MAX_PAGE_SCREENS: u32 = 10;

#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

/// A styled and laid out page, ready to be painted.
#[derive(Debug, Clone)]
pub struct RenderTree {
    pub page: PageSnapshot,
    pub text: Vec<Option<TextBox>>,
    pub document_height: f64,
}

impl RenderTree {
    /// Run the cascade and layout over a freshly flattened page.
    pub fn build(mut page: PageSnapshot, stylesheets: &[String]) -> Self {
        let styles = style::cascade(&mut page, stylesheets);
        let viewport = page.viewport;
        let (document_height, text) = layout::layout_document(&mut page, &styles, viewport);
        Self {
            page,
            text,
            document_height,
        }
    }

    /// Paint the page. Full-page captures grow to the document height,
    /// bounded to a few screens.
    pub fn screenshot(&self, full_page: bool) -> Result<Screenshot> {
        let Viewport { width, height } = self.page.viewport;
        let height = if full_page {
            (self.document_height.ceil() as u32).clamp(height, height.saturating_mul(MAX_PAGE_SCREENS))
        } else {
            height
        };
        let commands = paint::build_display_list(&self.page, &self.text, width, height);
        raster::rasterize(&commands, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::ElementSnapshot;

    fn tiny_page(paragraphs: usize) -> PageSnapshot {
        let mut page = PageSnapshot {
            viewport: Viewport { width: 100, height: 50 },
            ..Default::default()
        };
        page.push(ElementSnapshot::new("html"));
        let mut body = ElementSnapshot::new("body");
        body.parent = Some(0);
        page.push(body);
        for _ in 0..paragraphs {
            let mut p = ElementSnapshot::new("p");
            p.parent = Some(1);
            p.text = "Lorem ipsum".into();
            page.push(p);
        }
        page
    }

    #[test]
    fn full_page_grows_with_content() {
        let sheets = vec!["body { background-color: #102030 }".to_string()];
        let tree = RenderTree::build(tiny_page(10), &sheets);
        let shot = tree.screenshot(true).unwrap();
        assert_eq!(shot.width, 100);
        assert!(shot.height > 50);
        let viewport_only = tree.screenshot(false).unwrap();
        assert_eq!(viewport_only.height, 50);

        let img = image::load_from_memory(&shot.png_data).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(99, 0).0, [0x10, 0x20, 0x30]);
    }

    #[test]
    fn short_pages_keep_the_viewport_height() {
        let tree = RenderTree::build(tiny_page(0), &[]);
        assert_eq!(tree.screenshot(true).unwrap().height, 50);
    }
}
