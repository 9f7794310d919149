use crate::error::SurfaceError;
use crate::style::{Color, ScrollAxes};
use crate::view::base_component::{LayoutState, Rect};
use crate::view::render_pass::{BitmapId, PassContext, RenderPass};

pub const SCROLLBAR_THICKNESS: i32 = 6;
pub const SCROLLBAR_MARGIN: i32 = 3;

/// Thin proportional scrollbar thumbs drawn over a scrolling element after its
/// children were composited.
pub struct ScrollbarPass {
    target: BitmapId,
    thumbs: [Option<Rect>; 2],
    clip: Rect,
    color: Color,
}

impl ScrollbarPass {
    /// `None` when no axis both scrolls and overflows.
    pub fn new(
        target: BitmapId,
        layout: &LayoutState,
        axes: ScrollAxes,
        clip: Rect,
        color: Color,
    ) -> Option<Self> {
        let thumbs = [0, 1].map(|axis| {
            if axes.scrolls(axis) {
                thumb_rect(layout, axis)
            } else {
                None
            }
        });
        thumbs.iter().any(Option::is_some).then_some(Self {
            target,
            thumbs,
            clip,
            color,
        })
    }

    pub fn thumbs(&self) -> [Option<Rect>; 2] {
        self.thumbs
    }
}

/// Thumb of one axis: its length is the visible fraction of the track and its
/// position the scrolled fraction of the remaining track.
pub fn thumb_rect(layout: &LayoutState, axis: usize) -> Option<Rect> {
    let viewport = layout.max_size[axis];
    let content = layout.scroll_size[axis];
    if content <= viewport {
        return None;
    }
    let track = viewport - 2 * SCROLLBAR_MARGIN;
    if track <= 0 {
        return None;
    }
    let length = (track as i64 * viewport as i64 / content as i64) as i32;
    let travel = track - length;
    let scrolled = (-layout.scroll_offset[axis]).clamp(0, content - viewport);
    let offset = (travel as i64 * scrolled as i64 / (content - viewport) as i64) as i32;

    let rect = layout.rect();
    let thumb = if axis == 0 {
        Rect::new(
            rect.x + SCROLLBAR_MARGIN + offset,
            rect.bottom() - SCROLLBAR_MARGIN - SCROLLBAR_THICKNESS,
            length,
            SCROLLBAR_THICKNESS,
        )
    } else {
        Rect::new(
            rect.right() - SCROLLBAR_MARGIN - SCROLLBAR_THICKNESS,
            rect.y + SCROLLBAR_MARGIN + offset,
            SCROLLBAR_THICKNESS,
            length,
        )
    };
    Some(thumb)
}

impl RenderPass for ScrollbarPass {
    fn execute(&mut self, ctx: &mut PassContext<'_>) -> Result<(), SurfaceError> {
        let mut pixels = ctx
            .surface
            .lock(self.target)
            .ok_or(SurfaceError::UnknownBitmap(self.target))?;
        let color = self.color.premultiplied();
        for thumb in self.thumbs.into_iter().flatten() {
            if let Some(visible) = thumb.intersect(self.clip) {
                pixels.fill_rect(visible, color);
            }
        }
        Ok(())
    }
}
