use crate::error::{RenderError, RenderResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    pub fn with_alpha(self, alpha: u8) -> [u8; 4] {
        [self.0, self.1, self.2, alpha]
    }
}

/// Parse `RRGGBB` or `#RRGGBB`.
pub fn hex_to_rgb(hex: &str) -> RenderResult<Rgb> {
    let trimmed = hex.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RenderError::InvalidColorFormat(hex.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| RenderError::InvalidColorFormat(hex.to_string()))
    };
    Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Per-channel linear blend, truncating toward zero.
pub fn lerp_color(c1: Rgb, c2: Rgb, ratio: f64) -> Rgb {
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * ratio) as u8;
    Rgb(mix(c1.0, c2.0), mix(c1.1, c2.1), mix(c1.2, c2.2))
}

/// Blend across three stops: the first half of `ratio` runs c1→c2, the
/// second half c2→c3.
pub fn lerp_three(c1: Rgb, c2: Rgb, c3: Rgb, ratio: f64) -> Rgb {
    if ratio <= 0.5 {
        lerp_color(c1, c2, ratio * 2.0)
    } else {
        lerp_color(c2, c3, (ratio - 0.5) * 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientDirection {
    TopBottom,
    BottomTop,
    LeftRight,
    RightLeft,
    #[default]
    DiagonalBr,
    DiagonalBl,
    DiagonalTr,
    DiagonalTl,
}

impl GradientDirection {
    /// Unknown names fall back to `diagonal-br`.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "top-bottom" => Self::TopBottom,
            "bottom-top" => Self::BottomTop,
            "left-right" => Self::LeftRight,
            "right-left" => Self::RightLeft,
            "diagonal-bl" => Self::DiagonalBl,
            "diagonal-tr" => Self::DiagonalTr,
            "diagonal-tl" => Self::DiagonalTl,
            _ => Self::DiagonalBr,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TopBottom => "top-bottom",
            Self::BottomTop => "bottom-top",
            Self::LeftRight => "left-right",
            Self::RightLeft => "right-left",
            Self::DiagonalBr => "diagonal-br",
            Self::DiagonalBl => "diagonal-bl",
            Self::DiagonalTr => "diagonal-tr",
            Self::DiagonalTl => "diagonal-tl",
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Self::DiagonalBr | Self::DiagonalBl | Self::DiagonalTr | Self::DiagonalTl
        )
    }

    /// Blend ratio for the pixel at (`x`, `y`) on a `w`×`h` canvas.
    ///
    /// Axis-aligned directions only look at one coordinate. Diagonals use
    /// `(x' + y') / (w + h)` where each coordinate is mirrored depending on
    /// the originating corner.
    pub fn ratio(self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let (x, y, w, h) = (x as f64, y as f64, w as f64, h as f64);
        match self {
            Self::TopBottom => y / h,
            Self::BottomTop => 1.0 - y / h,
            Self::LeftRight => x / w,
            Self::RightLeft => 1.0 - x / w,
            Self::DiagonalBr => (x + y) / (w + h),
            Self::DiagonalBl => ((w - x) + y) / (w + h),
            Self::DiagonalTr => (x + (h - y)) / (w + h),
            Self::DiagonalTl => ((w - x) + (h - y)) / (w + h),
        }
    }
}
