//! Rasterizer - paints a layout into a bitmap
//!
//! The capture step of the export pipeline. Layout coordinates are multiplied
//! by the supersampling factor so small text and narrow bars survive the
//! later scaling into the page.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};
use thiserror::Error;

use crate::layout::{Align, LabelLayout, NodeKind, Rect, TextStyle, NO_DATA};
use crate::symbology::{code128_modules, qr_matrix};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const MUTED: Rgb<u8> = Rgb([156, 163, 175]);

/// Layout pixels per barcode module, before supersampling.
const BAR_MODULE_PX: f64 = 1.3;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Supersample factor must be at least 1")]
    ZeroScale,

    #[error("Layout has no drawable surface ({0}x{1})")]
    EmptySurface(u32, u32),

    #[error("Capture failed: {0}")]
    Capture(String),
}

/// Capture capability: turns a mounted layout into pixels.
pub trait Rasterizer {
    fn rasterize(&self, layout: &LabelLayout, scale: u32) -> Result<RgbImage, RasterError>;
}

/// Software rasterizer with an 8x8 bitmap font.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapRasterizer;

impl Rasterizer for BitmapRasterizer {
    fn rasterize(&self, layout: &LabelLayout, scale: u32) -> Result<RgbImage, RasterError> {
        if scale == 0 {
            return Err(RasterError::ZeroScale);
        }
        if layout.width_px == 0 || layout.height_px == 0 {
            return Err(RasterError::EmptySurface(layout.width_px, layout.height_px));
        }

        let mut surface = Surface {
            img: RgbImage::from_pixel(layout.width_px * scale, layout.height_px * scale, WHITE),
            scale,
        };

        for node in &layout.nodes {
            match &node.kind {
                NodeKind::Border { thickness, shade } => {
                    surface.border(node.rect, *thickness, Rgb([*shade; 3]))
                }
                NodeKind::Rule => surface.fill(surface.device(node.rect), BLACK),
                NodeKind::Text { content, style } => {
                    surface.text(node.rect, content, *style, BLACK)
                }
                NodeKind::Barcode {
                    value,
                    human_readable,
                    text_px,
                } => surface.barcode(node.rect, value, *human_readable, *text_px),
                NodeKind::Placeholder { text } => surface.placeholder(node.rect, text),
                NodeKind::QrCode { payload } => surface.qr(node.rect, payload),
            }
        }

        Ok(surface.img)
    }
}

/// Rectangle in device pixels.
#[derive(Debug, Clone, Copy)]
struct DevRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

struct Surface {
    img: RgbImage,
    scale: u32,
}

impl Surface {
    fn device(&self, r: Rect) -> DevRect {
        DevRect {
            x: r.x * self.scale,
            y: r.y * self.scale,
            w: r.w * self.scale,
            h: r.h * self.scale,
        }
    }

    fn put(&mut self, x: u32, y: u32, color: Rgb<u8>) {
        if x < self.img.width() && y < self.img.height() {
            self.img.put_pixel(x, y, color);
        }
    }

    fn fill(&mut self, r: DevRect, color: Rgb<u8>) {
        for y in r.y..r.y + r.h {
            for x in r.x..r.x + r.w {
                self.put(x, y, color);
            }
        }
    }

    fn border(&mut self, r: Rect, thickness: u32, color: Rgb<u8>) {
        let d = self.device(r);
        let t = (thickness * self.scale).min(d.w).min(d.h);
        self.fill(DevRect { h: t, ..d }, color);
        self.fill(DevRect { y: d.y + d.h - t, h: t, ..d }, color);
        self.fill(DevRect { w: t, ..d }, color);
        self.fill(DevRect { x: d.x + d.w - t, w: t, ..d }, color);
    }

    /// Draws one line of text, aligned horizontally and centred vertically in
    /// `r`. Glyphs falling outside `r` are clipped.
    fn text(&mut self, r: Rect, content: &str, style: TextStyle, color: Rgb<u8>) {
        let clip = self.device(r);
        let gh = (style.size_px * self.scale).max(1);
        let gw = (gh * 3 / 4).max(1);
        let chars: Vec<char> = content.chars().collect();
        let text_w = gw * chars.len() as u32;

        let x0 = match style.align {
            Align::Left => clip.x,
            Align::Center => clip.x + clip.w.saturating_sub(text_w) / 2,
            Align::Right => clip.x + clip.w.saturating_sub(text_w),
        };
        let y0 = clip.y + clip.h.saturating_sub(gh) / 2;
        let strike = if style.bold { (self.scale / 2).max(1) } else { 0 };

        for (i, c) in chars.iter().enumerate() {
            let Some(glyph) = BASIC_FONTS.get(*c).or_else(|| LATIN_FONTS.get(*c)) else {
                continue;
            };
            let gx = x0 + i as u32 * gw;
            for py in 0..gh {
                let row = glyph[(py * 8 / gh) as usize];
                for px in 0..gw {
                    if row >> (px * 8 / gw) & 1 == 0 {
                        continue;
                    }
                    for dx in 0..=strike {
                        let (x, y) = (gx + px + dx, y0 + py);
                        if x < clip.x + clip.w && y < clip.y + clip.h {
                            self.put(x, y, color);
                        }
                    }
                }
            }
        }
    }

    fn placeholder(&mut self, r: Rect, text: &str) {
        let size = r.h.clamp(1, 10);
        self.text(r, text, TextStyle::new(size, false, Align::Left), MUTED);
    }

    /// Left-aligned bars at 1.3 layout px per module, narrowed to fit `r`.
    fn barcode(&mut self, r: Rect, value: &str, human_readable: bool, text_px: u32) {
        let Some(modules) = code128_modules(value) else {
            self.placeholder(r, NO_DATA);
            return;
        };
        let d = self.device(r);
        let text_h = if human_readable { text_px + 2 } else { 0 };
        let bar_h = r.h.saturating_sub(text_h) * self.scale;

        let fit = f64::from(d.w) / modules.len() as f64;
        let module_w = (BAR_MODULE_PX * f64::from(self.scale)).min(fit);
        for (i, dark) in modules.iter().enumerate() {
            if !dark {
                continue;
            }
            let x0 = d.x + (i as f64 * module_w).round() as u32;
            let x1 = d.x + ((i + 1) as f64 * module_w).round() as u32;
            self.fill(
                DevRect {
                    x: x0,
                    y: d.y,
                    w: (x1 - x0).max(1),
                    h: bar_h,
                },
                BLACK,
            );
        }

        if human_readable {
            let line = Rect::new(r.x, r.y + r.h - text_h, r.w, text_h);
            self.text(line, value, TextStyle::new(text_px, false, Align::Left), BLACK);
        }
    }

    fn qr(&mut self, r: Rect, payload: &str) {
        let Some(matrix) = qr_matrix(payload) else {
            self.placeholder(r, NO_DATA);
            return;
        };
        let d = self.device(r);
        let side = d.w.min(d.h);
        let module = f64::from(side) / matrix.width as f64;
        let edge = |i: usize| (i as f64 * module).round() as u32;

        for my in 0..matrix.width {
            for mx in 0..matrix.width {
                if !matrix.is_dark(mx, my) {
                    continue;
                }
                let (x0, x1) = (edge(mx), edge(mx + 1));
                let (y0, y1) = (edge(my), edge(my + 1));
                self.fill(
                    DevRect {
                        x: d.x + x0,
                        y: d.y + y0,
                        w: x1 - x0,
                        h: y1 - y0,
                    },
                    BLACK,
                );
            }
        }
    }
}
