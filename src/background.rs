use std::path::Path;

use image::RgbImage;
use rayon::prelude::*;
use tracing::info;

use crate::color::{GradientDirection, Rgb, lerp_color};
use crate::config::Canvas;
use crate::error::RenderResult;

/// Opaque two-color gradient covering the whole canvas.
///
/// Axis-aligned directions compute one color per row or column; diagonals
/// compute every pixel. Rows are filled in parallel; each pixel depends only
/// on its own coordinates, so the output is identical to a serial fill.
pub fn gradient_background(c1: Rgb, c2: Rgb, direction: GradientDirection, canvas: Canvas) -> RgbImage {
    let (w, h) = (canvas.width, canvas.height);
    let mut img = RgbImage::new(w, h);
    if w == 0 || h == 0 {
        return img;
    }

    let column_colors: Option<Vec<Rgb>> = match direction {
        GradientDirection::LeftRight | GradientDirection::RightLeft => Some(
            (0..w)
                .map(|x| lerp_color(c1, c2, direction.ratio(x, 0, w, h)))
                .collect(),
        ),
        _ => None,
    };

    let row_len = w as usize * 3;
    img.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            let row_color = match direction {
                GradientDirection::TopBottom | GradientDirection::BottomTop => {
                    Some(lerp_color(c1, c2, direction.ratio(0, y, w, h)))
                }
                _ => None,
            };
            for (x, px) in row.chunks_exact_mut(3).enumerate() {
                let Rgb(r, g, b) = match (&row_color, &column_colors) {
                    (Some(c), _) => *c,
                    (None, Some(cols)) => cols[x],
                    (None, None) => lerp_color(c1, c2, direction.ratio(x as u32, y, w, h)),
                };
                px.copy_from_slice(&[r, g, b]);
            }
        });
    img
}

pub fn write_gradient_background(
    c1: Rgb,
    c2: Rgb,
    direction: GradientDirection,
    canvas: Canvas,
    output: &Path,
) -> RenderResult<()> {
    let img = gradient_background(c1, c2, direction, canvas);
    img.save(output)?;
    info!(
        "Background ({}) written to {}",
        direction.name(),
        output.display()
    );
    Ok(())
}
