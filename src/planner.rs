//! Crop, scale and placement of the source video inside the canvas.

use std::path::PathBuf;
use std::str::FromStr;

use crate::config::{Canvas, TemplateStyle};
use crate::error::{RenderError, RenderResult};

pub const VIDEO_TOP: u32 = 480;
pub const VIDEO_FOOTER: u32 = 100;

/// Crop rectangle as percentages of the source frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSpec {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Default for CropSpec {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: 100.0,
            h: 100.0,
        }
    }
}

impl CropSpec {
    pub fn is_identity(&self) -> bool {
        self.x <= 0.0 && self.y <= 0.0 && self.w >= 100.0 && self.h >= 100.0
    }

    pub fn validate(&self) -> RenderResult<()> {
        let CropSpec { x, y, w, h } = *self;
        if [x, y, w, h].iter().any(|v| !v.is_finite()) {
            return Err(RenderError::InvalidCrop(format!("{self:?} has non-finite values")));
        }
        if x < 0.0 || y < 0.0 {
            return Err(RenderError::InvalidCrop(format!("offset ({x}, {y}) is negative")));
        }
        if w <= 0.0 || h <= 0.0 {
            return Err(RenderError::InvalidCrop(format!("size {w}x{h} is empty")));
        }
        if x + w > 100.0 || y + h > 100.0 {
            return Err(RenderError::InvalidCrop(format!(
                "x+w={} y+h={} exceed 100%",
                x + w,
                y + h
            )));
        }
        Ok(())
    }

    /// Pixel rectangle against a `src_w`×`src_h` frame, or `None` for the
    /// full frame.
    pub fn resolve(&self, src_w: u32, src_h: u32) -> Option<CropRect> {
        if self.is_identity() {
            return None;
        }
        let px = |total: u32, pct: f64| (total as f64 * pct / 100.0) as u32;
        Some(CropRect {
            x: px(src_w, self.x),
            y: px(src_h, self.y),
            w: px(src_w, self.w),
            h: px(src_h, self.h),
        })
    }
}

impl FromStr for CropSpec {
    type Err = RenderError;

    /// `x,y,w,h` in percent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RenderError::InvalidCrop(format!("'{s}': {e}")))?;
        let [x, y, w, h] = parts[..] else {
            return Err(RenderError::InvalidCrop(format!(
                "'{s}': expected x,y,w,h"
            )));
        };
        let crop = CropSpec { x, y, w, h };
        crop.validate()?;
        Ok(crop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Vertical band of the canvas the video is fitted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoArea {
    pub top: u32,
    pub height: u32,
}

impl VideoArea {
    pub fn for_style(style: TemplateStyle, canvas: Canvas) -> Self {
        match style {
            TemplateStyle::Card => Self {
                top: VIDEO_TOP,
                height: canvas.height.saturating_sub(VIDEO_TOP + VIDEO_FOOTER),
            },
            TemplateStyle::Classic => {
                let (text_section, video_section, _) = canvas.classic_sections();
                Self {
                    top: text_section,
                    height: video_section,
                }
            }
        }
    }
}

/// Resolved placement of the source video on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoGeometry {
    pub source: (u32, u32),
    pub crop: Option<CropRect>,
    pub scaled: (u32, u32),
    pub offset: (u32, u32),
}

impl VideoGeometry {
    /// Fit the (cropped) source to the canvas width, or to the area height
    /// if full width would be too tall, then center it in the area.
    pub fn compute(
        src_w: u32,
        src_h: u32,
        crop: Option<&CropSpec>,
        canvas: Canvas,
        area: VideoArea,
    ) -> RenderResult<Self> {
        if src_w == 0 || src_h == 0 {
            return Err(RenderError::InvalidCrop(format!(
                "source has no area ({src_w}x{src_h})"
            )));
        }
        let crop = match crop {
            Some(spec) => {
                spec.validate()?;
                spec.resolve(src_w, src_h)
            }
            None => None,
        };
        let (eff_w, eff_h) = crop.map(|c| (c.w, c.h)).unwrap_or((src_w, src_h));
        if eff_w == 0 || eff_h == 0 {
            return Err(RenderError::InvalidCrop(format!(
                "crop resolves to {eff_w}x{eff_h} pixels"
            )));
        }

        let mut scale = canvas.width as f64 / eff_w as f64;
        let mut scaled_w = canvas.width;
        let mut scaled_h = (eff_h as f64 * scale) as u32;
        if scaled_h > area.height {
            scale = area.height as f64 / eff_h as f64;
            scaled_h = (eff_h as f64 * scale) as u32;
            scaled_w = (eff_w as f64 * scale) as u32;
        }

        let offset_x = canvas.width.saturating_sub(scaled_w) / 2;
        let offset_y = area.top + area.height.saturating_sub(scaled_h) / 2;
        Ok(Self {
            source: (eff_w, eff_h),
            crop,
            scaled: (scaled_w, scaled_h),
            offset: (offset_x, offset_y),
        })
    }
}

/// Everything the compositing engine needs: geometry plus the two raster
/// layers. Layers stack background, then video, then overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementPlan {
    pub canvas: Canvas,
    pub geometry: VideoGeometry,
    pub background: PathBuf,
    pub overlay: PathBuf,
}

impl PlacementPlan {
    /// ffmpeg filter graph over inputs 0 (video), 1 (background), 2 (overlay).
    pub fn filter_graph(&self) -> String {
        let Canvas { width, height } = self.canvas;
        let g = &self.geometry;
        let crop = g
            .crop
            .map(|c| format!("crop={}:{}:{}:{},", c.w, c.h, c.x, c.y))
            .unwrap_or_default();
        format!(
            "[1:v]scale={width}:{height}[bg];\
             [0:v]{crop}scale={}:{}[scaled];\
             [bg][scaled]overlay={}:{}[v1];\
             [v1][2:v]overlay=0:0:format=auto[vout]",
            g.scaled.0, g.scaled.1, g.offset.0, g.offset.1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card_area() -> VideoArea {
        VideoArea::for_style(TemplateStyle::Card, Canvas::VERTICAL)
    }

    #[test]
    fn landscape_source_scales_to_full_width() {
        let g = VideoGeometry::compute(1920, 1080, None, Canvas::VERTICAL, card_area()).unwrap();
        assert_eq!(card_area().height, 1340);
        assert_eq!(g.scaled, (1080, 607));
        assert_eq!(g.offset, (0, VIDEO_TOP + (1340 - 607) / 2));
        assert_eq!(g.offset.1, 846);
    }

    #[test]
    fn tall_source_is_fitted_to_area_height() {
        let g = VideoGeometry::compute(1080, 1920, None, Canvas::VERTICAL, card_area()).unwrap();
        assert_eq!(g.scaled.1, 1340);
        assert_eq!(g.scaled.0, 753);
        assert_eq!(g.offset, ((1080 - 753) / 2, VIDEO_TOP));
    }

    #[test]
    fn identity_crop_equals_no_crop() {
        let full = CropSpec::default();
        let with = VideoGeometry::compute(1280, 720, Some(&full), Canvas::VERTICAL, card_area()).unwrap();
        let without = VideoGeometry::compute(1280, 720, None, Canvas::VERTICAL, card_area()).unwrap();
        assert_eq!(with, without);
        assert!(with.crop.is_none());
    }

    #[test]
    fn crop_percentages_resolve_to_pixels() {
        let crop: CropSpec = "25,10,50,80".parse().unwrap();
        let g = VideoGeometry::compute(1920, 1080, Some(&crop), Canvas::VERTICAL, card_area()).unwrap();
        assert_eq!(
            g.crop,
            Some(CropRect {
                x: 480,
                y: 108,
                w: 960,
                h: 864
            })
        );
        assert_eq!(g.source, (960, 864));
        assert_eq!(g.scaled, (1080, 972));
    }

    #[test]
    fn invalid_crops_are_rejected() {
        for bad in ["60,0,50,100", "0,0,0,100", "-1,0,50,50", "1,2,3", "a,b,c,d"] {
            assert!(
                matches!(bad.parse::<CropSpec>(), Err(RenderError::InvalidCrop(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn classic_area_is_middle_band() {
        let area = VideoArea::for_style(TemplateStyle::Classic, Canvas::VERTICAL);
        assert_eq!(area, VideoArea { top: 576, height: 1056 });
        let g = VideoGeometry::compute(1920, 1080, None, Canvas::VERTICAL, area).unwrap();
        assert_eq!(g.offset, (0, 576 + (1056 - 607) / 2));
    }

    #[test]
    fn filter_graph_layers_background_video_overlay() {
        let crop = CropSpec {
            x: 0.0,
            y: 0.0,
            w: 50.0,
            h: 100.0,
        };
        let geometry =
            VideoGeometry::compute(1920, 1080, Some(&crop), Canvas::VERTICAL, card_area()).unwrap();
        let plan = PlacementPlan {
            canvas: Canvas::VERTICAL,
            geometry,
            background: PathBuf::from("bg.png"),
            overlay: PathBuf::from("overlay.png"),
        };
        let graph = plan.filter_graph();
        assert!(graph.starts_with("[1:v]scale=1080:1920[bg];"));
        assert!(graph.contains("[0:v]crop=960:1080:0:0,scale="));
        assert!(graph.ends_with("[v1][2:v]overlay=0:0:format=auto[vout]"));
    }
}
