use glam::IVec2;

use crate::error::SurfaceError;
use crate::style::{Color, FontVariant, TextAlign};
use crate::text::LineSpan;
use crate::view::base_component::{Rect, align_offset};
use crate::view::render_pass::{BitmapId, PassContext, RenderPass};

pub const DEFAULT_CARET_WIDTH: i32 = 2;

/// Draws a wrapped text run plus its caret or selection highlight.
///
/// Caret and selection are character indices into `content`.
pub struct TextPass {
    target: BitmapId,
    content: String,
    font: FontVariant,
    color: Color,
    origin: IVec2,
    width: i32,
    align: TextAlign,
    clip: Option<Rect>,
    caret: Option<u32>,
    caret_width: i32,
    selection: Option<(u32, u32)>,
    selection_color: Color,
}

impl TextPass {
    /// `width` is both the wrap width and the space alignment works in; `0`
    /// disables wrapping.
    pub fn new(target: BitmapId, content: impl Into<String>, origin: IVec2, width: i32) -> Self {
        Self {
            target,
            content: content.into(),
            font: FontVariant::Regular,
            color: Color::BLACK,
            origin,
            width: width.max(0),
            align: TextAlign::Left,
            clip: None,
            caret: None,
            caret_width: DEFAULT_CARET_WIDTH,
            selection: None,
            selection_color: Color::rgba(51, 144, 255, 96),
        }
    }

    pub fn set_font(&mut self, font: FontVariant) {
        self.font = font;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_align(&mut self, align: TextAlign) {
        self.align = align;
    }

    pub fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    pub fn set_caret(&mut self, caret: Option<u32>, width: i32) {
        self.caret = caret;
        self.caret_width = width.max(1);
    }

    pub fn set_selection(&mut self, selection: Option<(u32, u32)>, color: Color) {
        self.selection = selection.filter(|(start, end)| start < end);
        self.selection_color = color;
    }

    fn caret_line(&self, lines: &[LineSpan]) -> Option<usize> {
        let caret = self.caret?;
        lines.iter().rposition(|line| line.start <= caret).or(Some(0))
    }
}

impl RenderPass for TextPass {
    fn execute(&mut self, ctx: &mut PassContext<'_>) -> Result<(), SurfaceError> {
        let text = ctx.text;
        let mut pixels = ctx
            .surface
            .lock(self.target)
            .ok_or(SurfaceError::UnknownBitmap(self.target))?;
        let bounds = pixels.bounds();
        let Some(clip) = self.clip.map_or(Some(bounds), |clip| clip.intersect(bounds)) else {
            return Ok(());
        };

        let line_height = text.line_height(self.font);
        let lines = text
            .measure(self.font, &self.content, self.width)
            .lines(&self.content);
        let caret_line = self.caret_line(&lines);

        for (index, span) in lines.iter().enumerate() {
            let run = span.slice(&self.content);
            let top = self.origin.y + index as i32 * line_height;
            let left = self.origin.x
                + align_offset(self.align, self.width, text.text_width(self.font, run));
            let x_of = |at: u32| {
                let local = at.clamp(span.start, span.end) - span.start;
                left + text.index_to_offset(self.font, run, local as usize)
            };

            if let Some((start, end)) = self.selection {
                let from = start.max(span.start);
                let to = end.min(span.end);
                if from < to {
                    let x = x_of(from);
                    let band = Rect::new(x, top, x_of(to) - x, line_height);
                    if let Some(band) = band.intersect(clip) {
                        pixels.fill_rect(band, self.selection_color.premultiplied());
                    }
                }
            }

            text.draw(self.font, run, self.color, &mut pixels, IVec2::new(left, top), clip);

            if caret_line == Some(index)
                && let Some(caret) = self.caret
            {
                // a caret after the last glyph of a full line stays inside the clip
                let x = x_of(caret).min(clip.right() - self.caret_width).max(clip.x);
                let bar = Rect::new(x, top, self.caret_width, line_height);
                if let Some(bar) = bar.intersect(clip) {
                    pixels.fill_rect(bar, self.color.premultiplied());
                }
            }
        }
        Ok(())
    }
}
