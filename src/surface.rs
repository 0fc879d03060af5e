//! Raster drawing capabilities used by the template renderers.

use std::path::Path;

use image::RgbaImage;
use tiny_skia::{
    ColorU8, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Rect, Stroke,
    Transform,
};

use crate::error::{RenderError, RenderResult};
use crate::fonts::Face;
use crate::layout::TextMeasure;

/// The drawing operations a template needs from a raster backend.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn fill_path(&mut self, path: &tiny_skia::Path, rgba: [u8; 4]);
    fn stroke_path(&mut self, path: &tiny_skia::Path, rgba: [u8; 4], width: f32);
    /// Draw `text` with its line box top-left at (`x`, `y`) and return the
    /// horizontal advance.
    fn draw_text(&mut self, face: &Face, size: f32, x: f32, y: f32, text: &str, rgba: [u8; 4])
    -> f32;
    fn composite_image(&mut self, image: &RgbaImage, x: i32, y: i32);
}

/// Transparent RGBA canvas backed by a tiny-skia pixmap.
pub struct PixmapSurface {
    pixmap: Pixmap,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| RenderError::image(format!("invalid canvas size {width}x{height}")))?;
        Ok(Self { pixmap })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Un-premultiplied RGBA at (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn save_png(&self, path: &Path) -> RenderResult<()> {
        self.pixmap
            .save_png(path)
            .map_err(|e| RenderError::image(format!("failed to write {}: {e}", path.display())))
    }

    fn paint(rgba: [u8; 4]) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
        paint.anti_alias = true;
        paint
    }

    fn draw_coverage(&mut self, coverage: &[u8], w: usize, h: usize, x: i32, y: i32, rgba: [u8; 4]) {
        let Some(mut glyph) = Pixmap::new(w as u32, h as u32) else {
            return;
        };
        for (dst, &cov) in glyph.pixels_mut().iter_mut().zip(coverage) {
            let a = (cov as u32 * rgba[3] as u32 / 255) as u8;
            let pm = |c: u8| (c as u32 * a as u32 / 255) as u8;
            if let Some(px) = PremultipliedColorU8::from_rgba(pm(rgba[0]), pm(rgba[1]), pm(rgba[2]), a)
            {
                *dst = px;
            }
        }
        self.pixmap.draw_pixmap(
            x,
            y,
            glyph.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}

impl Surface for PixmapSurface {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn fill_path(&mut self, path: &tiny_skia::Path, rgba: [u8; 4]) {
        self.pixmap.fill_path(
            path,
            &Self::paint(rgba),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    fn stroke_path(&mut self, path: &tiny_skia::Path, rgba: [u8; 4], width: f32) {
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(path, &Self::paint(rgba), &stroke, Transform::identity(), None);
    }

    fn draw_text(
        &mut self,
        face: &Face,
        size: f32,
        x: f32,
        y: f32,
        text: &str,
        rgba: [u8; 4],
    ) -> f32 {
        let baseline = y + face.ascent(size);
        let mut pen = x;
        match face {
            Face::Outline { font, .. } => {
                for ch in text.chars() {
                    let (m, bitmap) = font.rasterize(ch, size);
                    if m.width > 0 && m.height > 0 {
                        let gx = (pen + m.xmin as f32).round() as i32;
                        let gy = (baseline - (m.height as i32 + m.ymin) as f32).round() as i32;
                        self.draw_coverage(&bitmap, m.width, m.height, gx, gy, rgba);
                    }
                    pen += m.advance_width;
                }
            }
            Face::Builtin => {
                // Solid blocks standing on the baseline.
                for ch in text.chars() {
                    let advance = face.advance(ch, size);
                    if !ch.is_whitespace() {
                        let h = face.text_height("x", size);
                        if let Some(rect) =
                            Rect::from_xywh(pen + advance * 0.1, baseline - h, advance * 0.8, h)
                        {
                            let path = PathBuilder::from_rect(rect);
                            self.fill_path(&path, rgba);
                        }
                    }
                    pen += advance;
                }
            }
        }
        pen - x
    }

    fn composite_image(&mut self, image: &RgbaImage, x: i32, y: i32) {
        let (w, h) = image.dimensions();
        let Some(mut layer) = Pixmap::new(w, h) else {
            return;
        };
        for (dst, src) in layer.pixels_mut().iter_mut().zip(image.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        self.pixmap.draw_pixmap(
            x,
            y,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RoundedRect;

    #[test]
    fn new_surface_is_transparent() {
        let s = PixmapSurface::new(8, 4).unwrap();
        assert_eq!((s.width(), s.height()), (8, 4));
        assert_eq!(s.pixel(3, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn filled_rounded_rect_leaves_corners_clear() {
        let mut s = PixmapSurface::new(100, 100).unwrap();
        let rr = RoundedRect::new(0.0, 0.0, 100.0, 100.0, 30.0);
        s.fill_path(&rr.fill_path().unwrap(), [200, 10, 10, 255]);
        assert_eq!(s.pixel(50, 50), Some([200, 10, 10, 255]));
        assert_eq!(s.pixel(1, 1).map(|p| p[3]), Some(0));
        assert_eq!(s.pixel(98, 98).map(|p| p[3]), Some(0));
    }

    #[test]
    fn builtin_text_advances_and_marks_pixels() {
        let mut s = PixmapSurface::new(200, 60).unwrap();
        let advance = s.draw_text(&Face::Builtin, 20.0, 10.0, 10.0, "ab c", [255, 255, 255, 255]);
        assert!((advance - 44.0).abs() < 1e-3);
        // Inside the first block, just above the baseline.
        assert_eq!(s.pixel(16, 24).map(|p| p[3]), Some(255));
    }

    #[test]
    fn composite_image_blends_over_canvas() {
        let mut s = PixmapSurface::new(10, 10).unwrap();
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([0, 255, 0, 255]));
        s.composite_image(&img, 4, 4);
        assert_eq!(s.pixel(5, 5), Some([0, 255, 0, 255]));
        assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 0]));
    }
}
