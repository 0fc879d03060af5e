//! Transparent overlay layer: text card, username caption and logo.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use tracing::{debug, info, warn};

use crate::color::{Rgb, lerp_three};
use crate::config::Canvas;
use crate::error::RenderResult;
use crate::fonts::FontSet;
use crate::geometry::RoundedRect;
use crate::layout::{LayoutResult, TextMeasure, fit_block, headline_font_size, wrap_block};
use crate::markup::{TextBlock, strip_emojis};
use crate::surface::{PixmapSurface, Surface};

pub const BOX_MARGIN: u32 = 36;
pub const BOX_PADDING_X: u32 = 44;
pub const BOX_PADDING_Y: u32 = 36;
pub const BOX_RADIUS: f32 = 24.0;
pub const BOX_TOP: u32 = 180;
pub const BOX_FILL_ALPHA: u8 = 200;
pub const BORDER_WIDTH: f32 = 3.0;
pub const TITLE_SIZE: u32 = 48;
pub const TITLE_SPACING: u32 = 24;
pub const BODY_SIZE: u32 = 42;
pub const BODY_LINE_HEIGHT: u32 = 64;
pub const USERNAME_SIZE: u32 = 35;
pub const USERNAME_BOTTOM: u32 = 75;
pub const USERNAME_ALPHA: u8 = 130;
pub const LOGO_MAX_HEIGHT: u32 = 240;
pub const LOGO_RIGHT: u32 = 30;
pub const LOGO_TOP: u32 = 20;

const CLASSIC_SIDE_PADDING: u32 = 30;
const CLASSIC_USERNAME_SIZE: u32 = 44;

pub const TITLE_STOPS: [Rgb; 3] = [Rgb(0, 235, 255), Rgb(100, 180, 255), Rgb(218, 94, 255)];
pub const HIGHLIGHT: Rgb = Rgb(14, 235, 234);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Instagram,
    Twitter,
    Facebook,
    Youtube,
    Other,
}

impl Platform {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "instagram" => Self::Instagram,
            "twitter" | "x" => Self::Twitter,
            "facebook" => Self::Facebook,
            "youtube" => Self::Youtube,
            _ => Self::Other,
        }
    }

    pub fn handle_prefix(self) -> &'static str {
        match self {
            Self::Facebook => "",
            _ => "@",
        }
    }
}

/// Emoji-stripped username with the platform's handle prefix.
pub fn display_username(username: &str, platform: Platform) -> String {
    let name = strip_emojis(username);
    if name.is_empty() || name.starts_with('@') {
        return name;
    }
    format!("{}{}", platform.handle_prefix(), name)
}

/// Resolved geometry of the text card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub card: RoundedRect,
    pub title_height: u32,
    pub body: LayoutResult,
}

impl CardLayout {
    pub fn compute(fonts: &FontSet, text: &TextBlock, canvas: Canvas) -> Self {
        let title_height = if text.title.is_empty() {
            0
        } else {
            fonts.title.text_height(&text.title, TITLE_SIZE as f32) as u32 + TITLE_SPACING
        };
        let max_width = canvas.width.saturating_sub(2 * BOX_MARGIN + 2 * BOX_PADDING_X) as f32;
        let body = wrap_block(
            fonts.body.as_ref(),
            &text.body,
            BODY_SIZE,
            BODY_LINE_HEIGHT,
            max_width,
        );
        let bottom = BOX_TOP + title_height + body.total_height + 2 * BOX_PADDING_Y;
        let card = RoundedRect::new(
            BOX_MARGIN as f32,
            BOX_TOP as f32,
            canvas.width.saturating_sub(BOX_MARGIN).max(BOX_MARGIN) as f32,
            bottom as f32,
            BOX_RADIUS,
        );
        Self {
            card,
            title_height,
            body,
        }
    }
}

/// What goes on the overlay besides the card colors.
#[derive(Debug, Clone)]
pub struct OverlayContent<'a> {
    pub text: &'a TextBlock,
    pub username: &'a str,
    pub platform: Platform,
}

pub struct OverlayRenderer<'a> {
    fonts: &'a FontSet,
    canvas: Canvas,
    logo: Option<&'a Path>,
}

impl<'a> OverlayRenderer<'a> {
    pub fn new(fonts: &'a FontSet, canvas: Canvas, logo: Option<&'a Path>) -> Self {
        Self {
            fonts,
            canvas,
            logo,
        }
    }

    fn centered_x(&self, width: f32) -> f32 {
        ((self.canvas.width as f32 - width) / 2.0).floor()
    }

    /// Card template: rounded box with gradient title and highlighted body,
    /// username near the bottom, optional logo top-right.
    pub fn draw_card<S: Surface>(
        &self,
        surface: &mut S,
        content: &OverlayContent<'_>,
        primary: Rgb,
        secondary: Rgb,
    ) -> CardLayout {
        let layout = CardLayout::compute(self.fonts, content.text, self.canvas);

        if let Some(path) = layout.card.fill_path() {
            surface.fill_path(&path, primary.with_alpha(BOX_FILL_ALPHA));
        }
        if let Some(path) = layout.card.outline_path() {
            surface.stroke_path(&path, secondary.with_alpha(255), BORDER_WIDTH);
        }

        let title = &content.text.title;
        if !title.is_empty() {
            let size = TITLE_SIZE as f32;
            let face = self.fonts.title.as_ref();
            let mut x = self.centered_x(face.text_width(title, size));
            let y = (BOX_TOP + BOX_PADDING_Y) as f32;
            let count = title.chars().count();
            let span = count.saturating_sub(1).max(1) as f64;
            let [c1, c2, c3] = TITLE_STOPS;
            for (i, ch) in title.chars().enumerate() {
                let color = lerp_three(c1, c2, c3, i as f64 / span);
                let mut buf = [0u8; 4];
                x += surface.draw_text(face, size, x, y, ch.encode_utf8(&mut buf), color.with_alpha(255));
            }
        }

        let size = BODY_SIZE as f32;
        let face = self.fonts.body.as_ref();
        let mut y = (BOX_TOP + BOX_PADDING_Y + layout.title_height) as f32;
        for line in &layout.body.lines {
            let mut x = self.centered_x(face.text_width(line, size));
            for word in line.split_whitespace() {
                let color = if content.text.is_highlighted(word) {
                    HIGHLIGHT
                } else {
                    Rgb::WHITE
                };
                x += surface.draw_text(face, size, x, y, &format!("{word} "), color.with_alpha(255));
            }
            y += layout.body.line_height as f32;
        }

        let username = display_username(content.username, content.platform);
        if !username.is_empty() {
            let size = USERNAME_SIZE as f32;
            let face = self.fonts.caption.as_ref();
            let x = self.centered_x(face.text_width(&username, size));
            let y = self.canvas.height.saturating_sub(USERNAME_BOTTOM) as f32;
            surface.draw_text(face, size, x, y, &username, Rgb::WHITE.with_alpha(USERNAME_ALPHA));
        }

        self.draw_logo(surface);
        layout
    }

    /// Classic template: headline-sized caption centered in the top band,
    /// username in the bottom band.
    pub fn draw_classic<S: Surface>(&self, surface: &mut S, content: &OverlayContent<'_>) -> LayoutResult {
        let (text_section, video_section, username_section) = self.canvas.classic_sections();
        let caption = [content.text.title.as_str(), content.text.body.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        let face = self.fonts.body.as_ref();
        let max_width = self.canvas.width.saturating_sub(2 * CLASSIC_SIDE_PADDING) as f32;
        let block = fit_block(
            face,
            &caption,
            headline_font_size(&caption),
            max_width,
            text_section,
        );
        let size = block.font_size as f32;
        let start_y = (text_section as f32 - block.total_height as f32) / 2.0;
        for (i, line) in block.lines.iter().enumerate() {
            let x = self.centered_x(face.text_width(line, size));
            let y = (start_y + (i as u32 * block.line_height) as f32).floor();
            surface.draw_text(face, size, x, y, line, Rgb::WHITE.with_alpha(255));
        }

        let username = display_username(content.username, content.platform);
        if !username.is_empty() {
            let size = CLASSIC_USERNAME_SIZE as f32;
            let face = self.fonts.caption.as_ref();
            let x = self.centered_x(face.text_width(&username, size));
            let y = (text_section + video_section + username_section / 3) as f32;
            surface.draw_text(face, size, x, y, &username, Rgb::WHITE.with_alpha(255));
        }
        block
    }

    /// Paste the logo top-right, scaled down to [`LOGO_MAX_HEIGHT`]. A
    /// missing or unreadable logo is skipped.
    fn draw_logo<S: Surface>(&self, surface: &mut S) {
        let Some(path) = self.logo else {
            return;
        };
        if !path.exists() {
            debug!("No logo at {}, skipping", path.display());
            return;
        }
        let logo = match image::open(path) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                warn!("Failed to load logo {}: {}", path.display(), e);
                return;
            }
        };
        let logo = if logo.height() > LOGO_MAX_HEIGHT {
            let ratio = LOGO_MAX_HEIGHT as f64 / logo.height() as f64;
            let width = ((logo.width() as f64 * ratio) as u32).max(1);
            image::imageops::resize(&logo, width, LOGO_MAX_HEIGHT, FilterType::Lanczos3)
        } else {
            logo
        };
        let x = self.canvas.width as i32 - logo.width() as i32 - LOGO_RIGHT as i32;
        surface.composite_image(&logo, x, LOGO_TOP as i32);
    }
}

/// Everything needed to render one overlay PNG.
#[derive(Debug, Clone)]
pub struct OverlaySpec<'a> {
    pub style: crate::config::TemplateStyle,
    pub content: OverlayContent<'a>,
    pub primary: Rgb,
    pub secondary: Rgb,
}

/// Render the overlay for `spec` and write it as a PNG at `output`.
pub fn write_overlay(
    fonts: &FontSet,
    canvas: Canvas,
    logo: Option<&Path>,
    spec: &OverlaySpec<'_>,
    output: &Path,
) -> RenderResult<PathBuf> {
    let mut surface = PixmapSurface::new(canvas.width, canvas.height)?;
    let renderer = OverlayRenderer::new(fonts, canvas, logo);
    match spec.style {
        crate::config::TemplateStyle::Card => {
            let layout = renderer.draw_card(&mut surface, &spec.content, spec.primary, spec.secondary);
            debug!(
                "Card height {} with {} body lines",
                layout.card.height(),
                layout.body.lines.len()
            );
        }
        crate::config::TemplateStyle::Classic => {
            let block = renderer.draw_classic(&mut surface, &spec.content);
            debug!("Caption {} lines at {}px", block.lines.len(), block.font_size);
        }
    }
    if fonts.body.is_builtin() {
        warn!("Overlay rendered with the built-in face; install fonts for proper glyphs");
    }
    surface.save_png(output)?;
    info!("Overlay written to {}", output.display());
    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateStyle;

    fn content<'a>(text: &'a TextBlock, username: &'a str) -> OverlayContent<'a> {
        OverlayContent {
            text,
            username,
            platform: Platform::Instagram,
        }
    }

    #[test]
    fn username_prefix_depends_on_platform() {
        assert_eq!(display_username("alice", Platform::Instagram), "@alice");
        assert_eq!(display_username("@alice", Platform::Twitter), "@alice");
        assert_eq!(display_username("alice", Platform::Facebook), "alice");
        assert_eq!(display_username("alice", Platform::from_name("tiktok")), "@alice");
        assert_eq!(display_username("🔥", Platform::Youtube), "");
    }

    #[test]
    fn empty_text_gives_padding_only_card() {
        let fonts = FontSet::builtin();
        let layout = CardLayout::compute(&fonts, &TextBlock::default(), Canvas::VERTICAL);
        assert_eq!(layout.title_height, 0);
        assert!(layout.body.is_empty());
        assert_eq!(layout.card.height(), (2 * BOX_PADDING_Y) as f32);
    }

    #[test]
    fn card_grows_with_title_and_body() {
        let fonts = FontSet::builtin();
        let text = TextBlock::from_raw("Big news", "one two three");
        let layout = CardLayout::compute(&fonts, &text, Canvas::VERTICAL);
        // Built-in face: ink height 0.7 × 48 = 33.6.
        assert_eq!(layout.title_height, 33 + TITLE_SPACING);
        assert_eq!(layout.body.lines, vec!["one two three"]);
        assert_eq!(
            layout.card.height(),
            (layout.title_height + BODY_LINE_HEIGHT + 2 * BOX_PADDING_Y) as f32
        );
    }

    #[test]
    fn body_is_capped_at_five_lines() {
        let fonts = FontSet::builtin();
        let body = "supercalifragilistic ".repeat(30);
        let layout = CardLayout::compute(&fonts, &TextBlock::from_raw("", &body), Canvas::VERTICAL);
        assert_eq!(layout.body.lines.len(), 5);
    }

    #[test]
    fn card_colors_land_on_canvas() {
        let fonts = FontSet::builtin();
        let text = TextBlock::default();
        let mut surface = PixmapSurface::new(1080, 1920).unwrap();
        let renderer = OverlayRenderer::new(&fonts, Canvas::VERTICAL, None);
        renderer.draw_card(&mut surface, &content(&text, ""), Rgb(255, 0, 0), Rgb(0, 0, 255));

        let inside = surface.pixel(540, 210).unwrap();
        assert_eq!(inside[3], BOX_FILL_ALPHA);
        assert!(inside[0] >= 250);
        let border = surface.pixel(540, 180).unwrap();
        assert!(border[2] > border[0]);
        assert_eq!(surface.pixel(540, 1000).unwrap()[3], 0);
    }

    #[test]
    fn highlighted_words_use_highlight_color() {
        let fonts = FontSet::builtin();
        let text = TextBlock::from_raw("", "**zap**");
        let mut surface = PixmapSurface::new(1080, 1920).unwrap();
        let renderer = OverlayRenderer::new(&fonts, Canvas::VERTICAL, None);
        renderer.draw_card(&mut surface, &content(&text, ""), Rgb(0, 0, 0), Rgb(0, 0, 0));

        // "zap" measures 69.3px, so the line starts at x=505; the first
        // block spans roughly 507..525.
        let y = BOX_TOP + BOX_PADDING_Y + 30;
        let px = surface.pixel(515, y).unwrap();
        assert_eq!(&px[..3], &[HIGHLIGHT.0, HIGHLIGHT.1, HIGHLIGHT.2]);
    }

    #[test]
    fn title_runs_through_three_accent_stops() {
        let fonts = FontSet::builtin();
        let text = TextBlock::from_raw("ABC", "");
        let mut surface = PixmapSurface::new(1080, 1920).unwrap();
        let renderer = OverlayRenderer::new(&fonts, Canvas::VERTICAL, None);
        renderer.draw_card(&mut surface, &content(&text, ""), Rgb::BLACK, Rgb::BLACK);

        // Built-in advance 26.4px: "ABC" starts at x=500, blocks centered
        // at 513, 539 and 566, standing on the baseline at y=254.
        let y = 240;
        for (x, stop) in [(513, TITLE_STOPS[0]), (539, TITLE_STOPS[1]), (566, TITLE_STOPS[2])] {
            assert_eq!(surface.pixel(x, y).unwrap(), stop.with_alpha(255), "glyph at x={x}");
        }
    }

    #[test]
    fn tiny_canvas_does_not_underflow() {
        let fonts = FontSet::builtin();
        let canvas = Canvas {
            width: 40,
            height: 50,
        };
        let text = TextBlock::from_raw("Title", "some body text");
        let mut surface = PixmapSurface::new(canvas.width, canvas.height).unwrap();
        let renderer = OverlayRenderer::new(&fonts, canvas, None);
        let layout = renderer.draw_card(&mut surface, &content(&text, "alice"), Rgb::WHITE, Rgb::BLACK);
        assert!(layout.card.x2 >= layout.card.x1);
        assert_eq!(layout.card.radius, 0.0);
    }

    #[test]
    fn missing_logo_does_not_abort() {
        let fonts = FontSet::builtin();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("overlay.png");
        let logo = dir.path().join("nope.png");
        let text = TextBlock::from_raw("Hi", "there");
        let spec = OverlaySpec {
            style: TemplateStyle::Card,
            content: content(&text, "alice"),
            primary: Rgb(10, 10, 10),
            secondary: Rgb(200, 200, 200),
        };
        write_overlay(&fonts, Canvas::VERTICAL, Some(&logo), &spec, &out).unwrap();
        let img = image::open(&out).unwrap();
        assert_eq!((img.width(), img.height()), (1080, 1920));
    }

    #[test]
    fn logo_is_scaled_to_max_height() {
        let fonts = FontSet::builtin();
        let dir = tempfile::tempdir().unwrap();
        let logo = dir.path().join("logo.png");
        image::RgbaImage::from_pixel(600, 480, image::Rgba([255, 0, 0, 255]))
            .save(&logo)
            .unwrap();
        let mut surface = PixmapSurface::new(1080, 1920).unwrap();
        let renderer = OverlayRenderer::new(&fonts, Canvas::VERTICAL, Some(&logo));
        renderer.draw_card(&mut surface, &content(&TextBlock::default(), ""), Rgb::BLACK, Rgb::BLACK);

        // Scaled to 300×240 at x = 1080 - 300 - 30 = 750, y = 20.
        assert_eq!(surface.pixel(900, 100).unwrap(), [255, 0, 0, 255]);
        assert_eq!(surface.pixel(740, 100).unwrap()[3], 0);
        assert_eq!(surface.pixel(900, 265).unwrap()[3], 0);
    }

    #[test]
    fn classic_caption_uses_headline_sizing() {
        let fonts = FontSet::builtin();
        let text = TextBlock::from_raw("", "Short caption");
        let mut surface = PixmapSurface::new(1080, 1920).unwrap();
        let renderer = OverlayRenderer::new(&fonts, Canvas::VERTICAL, None);
        let block = renderer.draw_classic(&mut surface, &content(&text, "alice"));
        assert_eq!(block.font_size, 72);
        assert_eq!(block.lines, vec!["Short caption"]);
    }
}
