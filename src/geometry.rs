use std::f32::consts::FRAC_PI_8;

use tiny_skia::{Path, PathBuilder, Rect};

/// A rectangle with circular corners, decomposed into two overlapping
/// strips plus four quarter-circle corners.
///
/// Angles are in degrees, 0° on the positive x-axis, increasing clockwise
/// in image space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerArc {
    /// Bounding box of the full circle the arc belongs to: left, top, right, bottom.
    pub bbox: [f32; 4],
    pub start_deg: f32,
    pub end_deg: f32,
}

impl CornerArc {
    pub fn center(&self) -> (f32, f32) {
        (
            (self.bbox[0] + self.bbox[2]) / 2.0,
            (self.bbox[1] + self.bbox[3]) / 2.0,
        )
    }

    pub fn radius(&self) -> f32 {
        (self.bbox[2] - self.bbox[0]) / 2.0
    }

    pub fn point_at(&self, deg: f32) -> (f32, f32) {
        let (cx, cy) = self.center();
        let r = self.radius();
        let t = deg.to_radians();
        (cx + r * t.cos(), cy + r * t.sin())
    }

    /// Append the arc as a single cubic, starting from the current point.
    fn push_arc(&self, pb: &mut PathBuilder) {
        let r = self.radius();
        let k = 4.0 / 3.0 * FRAC_PI_8.tan() * r;
        let (a0, a1) = (self.start_deg.to_radians(), self.end_deg.to_radians());
        let (x0, y0) = self.point_at(self.start_deg);
        let (x3, y3) = self.point_at(self.end_deg);
        pb.cubic_to(
            x0 - k * a0.sin(),
            y0 + k * a0.cos(),
            x3 + k * a1.sin(),
            y3 - k * a1.cos(),
            x3,
            y3,
        );
    }
}

impl RoundedRect {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) -> Self {
        let radius = radius.min((x2 - x1) / 2.0).min((y2 - y1) / 2.0).max(0.0);
        Self {
            x1,
            y1,
            x2,
            y2,
            radius,
        }
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// The full-height strip between the corner columns and the full-width
    /// strip between the corner rows.
    pub fn strips(&self) -> [[f32; 4]; 2] {
        let r = self.radius;
        [
            [self.x1 + r, self.y1, self.x2 - r, self.y2],
            [self.x1, self.y1 + r, self.x2, self.y2 - r],
        ]
    }

    /// Corners in order top-left, top-right, bottom-left, bottom-right.
    pub fn corners(&self) -> [CornerArc; 4] {
        let d = self.radius * 2.0;
        let (x1, y1, x2, y2) = (self.x1, self.y1, self.x2, self.y2);
        [
            CornerArc {
                bbox: [x1, y1, x1 + d, y1 + d],
                start_deg: 180.0,
                end_deg: 270.0,
            },
            CornerArc {
                bbox: [x2 - d, y1, x2, y1 + d],
                start_deg: 270.0,
                end_deg: 360.0,
            },
            CornerArc {
                bbox: [x1, y2 - d, x1 + d, y2],
                start_deg: 90.0,
                end_deg: 180.0,
            },
            CornerArc {
                bbox: [x2 - d, y2 - d, x2, y2],
                start_deg: 0.0,
                end_deg: 90.0,
            },
        ]
    }

    /// Straight border segments: top, bottom, left, right.
    pub fn edges(&self) -> [[f32; 4]; 4] {
        let r = self.radius;
        let (x1, y1, x2, y2) = (self.x1, self.y1, self.x2, self.y2);
        [
            [x1 + r, y1, x2 - r, y1],
            [x1 + r, y2, x2 - r, y2],
            [x1, y1 + r, x1, y2 - r],
            [x2, y1 + r, x2, y2 - r],
        ]
    }

    /// Strips plus pie-slice corners, suitable for a non-zero fill.
    pub fn fill_path(&self) -> Option<Path> {
        let mut pb = PathBuilder::new();
        for [l, t, r, b] in self.strips() {
            if let Some(rect) = Rect::from_ltrb(l, t, r, b) {
                pb.push_rect(rect);
            }
        }
        if self.radius > 0.0 {
            for corner in self.corners() {
                let (cx, cy) = corner.center();
                let (sx, sy) = corner.point_at(corner.start_deg);
                pb.move_to(cx, cy);
                pb.line_to(sx, sy);
                corner.push_arc(&mut pb);
                pb.close();
            }
        }
        pb.finish()
    }

    /// Edge segments plus open corner arcs, for stroking.
    pub fn outline_path(&self) -> Option<Path> {
        let mut pb = PathBuilder::new();
        for [ax, ay, bx, by] in self.edges() {
            pb.move_to(ax, ay);
            pb.line_to(bx, by);
        }
        if self.radius > 0.0 {
            for corner in self.corners() {
                let (sx, sy) = corner.point_at(corner.start_deg);
                pb.move_to(sx, sy);
                corner.push_arc(&mut pb);
            }
        }
        pb.finish()
    }
}
