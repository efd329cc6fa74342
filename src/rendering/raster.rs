//! Rasterizer: display list to PNG.

use crate::rendering::paint::{ink_bars, PaintCommand};
use crate::rendering::Screenshot;
use crate::{Error, Result};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

fn fill(img: &mut RgbImage, x: i32, y: i32, width: u32, height: u32, (r, g, b, a): (u8, u8, u8, u8)) {
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = (x as i64 + width as i64).clamp(0, img.width() as i64) as u32;
    let y1 = (y as i64 + height as i64).clamp(0, img.height() as i64) as u32;
    let alpha = a as u32;
    for py in y0..y1 {
        for px in x0..x1 {
            let pixel = img.get_pixel_mut(px, py);
            if alpha == 255 {
                *pixel = Rgb([r, g, b]);
            } else {
                let blend = |src: u8, dst: u8| ((src as u32 * alpha + dst as u32 * (255 - alpha)) / 255) as u8;
                *pixel = Rgb([blend(r, pixel[0]), blend(g, pixel[1]), blend(b, pixel[2])]);
            }
        }
    }
}

/// Paint `commands` onto a white `width` x `height` canvas and encode it.
pub fn rasterize(commands: &[PaintCommand], width: u32, height: u32) -> Result<Screenshot> {
    if width == 0 || height == 0 {
        return Err(Error::RenderError(format!("Cannot rasterize an empty {}x{} canvas", width, height)));
    }
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for command in commands {
        match *command {
            PaintCommand::SolidRect {
                x,
                y,
                width,
                height,
                rgba,
            } => fill(&mut img, x, y, width, height, rgba),
            PaintCommand::Text {
                x,
                y,
                width,
                lines,
                line_height,
                rgba,
            } => {
                for (bx, by, bw, bh) in ink_bars(x, y, width, lines, line_height) {
                    fill(&mut img, bx, by, bw, bh, rgba);
                }
            }
        }
    }

    let mut png_data = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_data), ImageFormat::Png)
        .map_err(|e| Error::RenderError(format!("PNG encoding failed: {}", e)))?;
    Ok(Screenshot {
        width,
        height,
        png_data,
    })
}
