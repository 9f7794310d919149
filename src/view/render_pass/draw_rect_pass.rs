use glam::Vec2;

use crate::error::SurfaceError;
use crate::image::DecodedImage;
use crate::style::Color;
use crate::view::base_component::Rect;
use crate::view::render_pass::{BitmapId, PassContext, RenderPass};

/// Exponent of the corner curve. 2 would be a circular arc; 4 gives the
/// softer squircle shoulder.
const CORNER_EXPONENT: f32 = 4.0;

/// Interior fill of a [`DrawRectPass`].
#[derive(Debug, Clone, Copy, Default)]
pub enum Fill<'a> {
    #[default]
    None,
    Solid(Color),
    HorizontalGradient(Color, Color),
    VerticalGradient(Color, Color),
    /// Stretched over the inner box, nearest-neighbour sampled.
    Image(&'a DecodedImage),
}

/// Paints a box background: fill, border ring and rounded corners.
pub struct DrawRectPass<'a> {
    target: BitmapId,
    rect: Rect,
    fill: Fill<'a>,
    border_color: Color,
    border_widths: [f32; 4], // [left, right, top, bottom]
    border_radii: CornerRadii,
}

impl<'a> DrawRectPass<'a> {
    pub fn new(target: BitmapId, rect: Rect, fill: Fill<'a>) -> Self {
        Self {
            target,
            rect,
            fill,
            border_color: Color::TRANSPARENT,
            border_widths: [0.0; 4],
            border_radii: [0.0; 4],
        }
    }

    pub fn set_fill(&mut self, fill: Fill<'a>) {
        self.fill = fill;
    }

    pub fn set_border_color(&mut self, color: Color) {
        self.border_color = color;
    }

    pub fn set_border_widths(&mut self, left: f32, right: f32, top: f32, bottom: f32) {
        self.border_widths = [left.max(0.0), right.max(0.0), top.max(0.0), bottom.max(0.0)];
    }

    pub fn set_border_radius(&mut self, radius: f32) {
        self.border_radii = [radius.max(0.0); 4];
    }

    pub fn set_border_radii(&mut self, radii: [f32; 4]) {
        self.border_radii = radii.map(|r| r.max(0.0));
    }

    fn fill_color(&self, point: Vec2, inner: &RectShape) -> Option<u32> {
        let extent = (inner.max - inner.min).max(Vec2::ONE);
        let t = (point - inner.min) / extent;
        let color = match self.fill {
            Fill::None => return None,
            Fill::Solid(color) => color.premultiplied(),
            Fill::HorizontalGradient(from, to) => from.mix(to, t.x).premultiplied(),
            Fill::VerticalGradient(from, to) => from.mix(to, t.y).premultiplied(),
            Fill::Image(image) => image.sample(t.x, t.y),
        };
        Some(color)
    }
}

impl RenderPass for DrawRectPass<'_> {
    fn execute(&mut self, ctx: &mut PassContext<'_>) -> Result<(), SurfaceError> {
        let mut pixels = ctx
            .surface
            .lock(self.target)
            .ok_or(SurfaceError::UnknownBitmap(self.target))?;
        let Some(area) = self.rect.intersect(pixels.bounds()) else {
            return Ok(());
        };
        let params = build_rect_params(self.rect, self.border_widths, self.border_radii);
        let border = (!params.border_is_empty() && self.border_color.alpha() > 0)
            .then(|| self.border_color.premultiplied());

        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let point = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let outer = params.outer.coverage(point);
                if outer <= 0.0 {
                    continue;
                }
                let inner = match &params.inner {
                    Some(inner) => inner.coverage(point).min(outer),
                    None => 0.0,
                };
                let fill_coverage = if border.is_some() { inner } else { outer };
                if fill_coverage > 0.0
                    && let Some(shape) = params.inner.as_ref().or(Some(&params.outer))
                    && let Some(color) = self.fill_color(point, shape)
                {
                    pixels.blend(x, y, color, fill_coverage);
                }
                if let Some(color) = border {
                    pixels.blend(x, y, color, outer - inner);
                }
            }
        }
        Ok(())
    }
}

type CornerRadii = [f32; 4]; // TL, TR, BR, BL

#[derive(Debug, Clone, Copy, PartialEq)]
struct RectShape {
    min: Vec2,
    max: Vec2,
    radii: CornerRadii,
}

impl RectShape {
    /// Fraction of the pixel centred on `point` covered by the shape.
    fn coverage(&self, point: Vec2) -> f32 {
        (0.5 - self.signed_distance(point)).clamp(0.0, 1.0)
    }

    /// Negative inside. Corners use a superellipse, so the value is only an
    /// approximation of the euclidean distance there.
    fn signed_distance(&self, point: Vec2) -> f32 {
        let corners = [
            (self.radii[0], Vec2::new(self.min.x, self.min.y), Vec2::new(1.0, 1.0)),
            (self.radii[1], Vec2::new(self.max.x, self.min.y), Vec2::new(-1.0, 1.0)),
            (self.radii[2], Vec2::new(self.max.x, self.max.y), Vec2::new(-1.0, -1.0)),
            (self.radii[3], Vec2::new(self.min.x, self.max.y), Vec2::new(1.0, -1.0)),
        ];
        for (radius, corner, inward) in corners {
            if radius <= 0.0 {
                continue;
            }
            let centre = corner + inward * radius;
            let local = (centre - point) * inward;
            if local.x > 0.0 && local.y > 0.0 {
                let n = local / radius;
                let norm = (n.x.powf(CORNER_EXPONENT) + n.y.powf(CORNER_EXPONENT))
                    .powf(1.0 / CORNER_EXPONENT);
                return (norm - 1.0) * radius;
            }
        }
        let outside = (self.min - point).max(point - self.max);
        outside.x.max(outside.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RectParams {
    outer: RectShape,
    /// Absent when the border swallows the whole box.
    inner: Option<RectShape>,
    border_widths: [f32; 4],
}

impl RectParams {
    fn border_is_empty(&self) -> bool {
        self.border_widths.iter().all(|width| *width <= 0.0)
    }
}

fn build_rect_params(rect: Rect, border_widths_lr_tb: [f32; 4], radii: CornerRadii) -> RectParams {
    let width = rect.width.max(0) as f32;
    let height = rect.height.max(0) as f32;
    let outer_min = Vec2::new(rect.x as f32, rect.y as f32);
    let outer_max = outer_min + Vec2::new(width, height);

    let max_bw = width.min(height) * 0.5;
    let [b_left, b_right, b_top, b_bottom] = border_widths_lr_tb.map(|w| w.clamp(0.0, max_bw));

    let mut outer_radii = radii;
    normalize_corner_radii(&mut outer_radii, width, height);

    let inner_min = outer_min + Vec2::new(b_left, b_top);
    let inner_max = outer_max - Vec2::new(b_right, b_bottom);
    let inner_size = (inner_max - inner_min).max(Vec2::ZERO);

    let inner = (inner_size.x > 0.0 && inner_size.y > 0.0).then(|| {
        let mut inner_radii = [
            (outer_radii[0] - b_left.max(b_top)).max(0.0),
            (outer_radii[1] - b_right.max(b_top)).max(0.0),
            (outer_radii[2] - b_right.max(b_bottom)).max(0.0),
            (outer_radii[3] - b_left.max(b_bottom)).max(0.0),
        ];
        normalize_corner_radii(&mut inner_radii, inner_size.x, inner_size.y);
        RectShape {
            min: inner_min,
            max: inner_max,
            radii: inner_radii,
        }
    });

    RectParams {
        outer: RectShape {
            min: outer_min,
            max: outer_max,
            radii: outer_radii,
        },
        inner,
        border_widths: [b_left, b_right, b_top, b_bottom],
    }
}

/// Scales all radii down together until adjacent corners no longer overlap.
fn normalize_corner_radii(radii: &mut CornerRadii, width: f32, height: f32) {
    let w = width.max(0.0);
    let h = height.max(0.0);
    if w <= 0.0 || h <= 0.0 {
        *radii = [0.0; 4];
        return;
    }

    for r in radii.iter_mut() {
        *r = r.max(0.0);
    }

    let sums = [
        (radii[0] + radii[1], w),
        (radii[3] + radii[2], w),
        (radii[0] + radii[3], h),
        (radii[1] + radii[2], h),
    ];
    let scale = sums
        .into_iter()
        .map(|(sum, side)| if sum > 0.0 { side / sum } else { 1.0 })
        .fold(1.0_f32, f32::min);

    for r in radii.iter_mut() {
        *r *= scale;
    }
}
