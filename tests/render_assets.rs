use image::RgbaImage;

use reelcard::background::write_gradient_background;
use reelcard::color::{GradientDirection, Rgb, hex_to_rgb};
use reelcard::config::{Canvas, TemplateStyle};
use reelcard::fonts::FontSet;
use reelcard::markup::TextBlock;
use reelcard::overlay::{OverlayContent, OverlaySpec, Platform, write_overlay};

fn render(style: TemplateStyle, text: &TextBlock, username: &str) -> RgbaImage {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overlay.png");
    let spec = OverlaySpec {
        style,
        content: OverlayContent {
            text,
            username,
            platform: Platform::Instagram,
        },
        primary: hex_to_rgb("#1A1A2E").unwrap(),
        secondary: hex_to_rgb("#E94560").unwrap(),
    };
    write_overlay(&FontSet::builtin(), Canvas::VERTICAL, None, &spec, &path).unwrap();
    image::open(&path).unwrap().to_rgba8()
}

fn any_pixel_in_rows(img: &RgbaImage, rows: std::ops::Range<u32>, pred: impl Fn(&[u8; 4]) -> bool) -> bool {
    rows.flat_map(|y| (0..img.width()).map(move |x| (x, y)))
        .any(|(x, y)| pred(&img.get_pixel(x, y).0))
}

#[test]
fn card_overlay_is_translucent_card_on_transparent_canvas() {
    let text = TextBlock::from_raw("Weekend plans", "Go **outside** and touch grass");
    let img = render(TemplateStyle::Card, &text, "alice");

    assert_eq!(img.dimensions(), (1080, 1920));
    let [r, g, b, a] = img.get_pixel(100, 250).0;
    assert_eq!(a, 200);
    assert!(r.abs_diff(26) <= 2 && g.abs_diff(26) <= 2 && b.abs_diff(46) <= 2);

    assert_eq!(img.get_pixel(5, 5).0[3], 0);
    assert_eq!(img.get_pixel(540, 1500).0[3], 0);
    assert!(any_pixel_in_rows(&img, 1800..1900, |p| p[3] > 0));
}

#[test]
fn empty_text_draws_only_the_padded_card() {
    let img = render(TemplateStyle::Card, &TextBlock::default(), "");
    // Card spans 180..252 (padding only).
    assert!(img.get_pixel(540, 215).0[3] > 0);
    assert_eq!(img.get_pixel(540, 300).0[3], 0);
    assert!(!any_pixel_in_rows(&img, 1800..1900, |p| p[3] > 0));
}

#[test]
fn classic_overlay_has_no_card() {
    let text = TextBlock::from_raw("", "A short caption");
    let img = render(TemplateStyle::Classic, &text, "alice");

    assert!(any_pixel_in_rows(&img, 0..576, |p| *p == [255, 255, 255, 255]));
    assert_eq!(img.get_pixel(100, 250).0[3], 0);
    assert_eq!(img.get_pixel(540, 1000).0[3], 0);
}

#[test]
fn gradient_background_is_opaque_and_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = (dir.path().join("a.png"), dir.path().join("b.png"));
    let c1 = Rgb(26, 26, 46);
    let c2 = Rgb(233, 69, 96);
    for path in [&a, &b] {
        write_gradient_background(c1, c2, GradientDirection::DiagonalTl, Canvas::VERTICAL, path).unwrap();
    }
    assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());

    let img = image::open(&a).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (1080, 1920));
    // Top-left corner is where a diagonal-tl gradient ends.
    let end = img.get_pixel(0, 0).0;
    assert!(end[0].abs_diff(233) <= 1);
    assert_eq!(img.get_pixel(1079, 1919).0, [26, 26, 46]);
}
