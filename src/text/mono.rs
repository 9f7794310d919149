use glam::IVec2;

use super::TextService;
use crate::style::{Color, FontVariant};
use crate::view::base_component::Rect;
use crate::view::render_pass::PixelsMut;

/// Fixed-advance text service that draws every visible character as a solid
/// block. Deterministic, so layout and paint can be tested without fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonoText {
    advance: i32,
    line_height: i32,
}

impl MonoText {
    pub fn new(advance: i32, line_height: i32) -> Self {
        Self {
            advance: advance.max(1),
            line_height: line_height.max(1),
        }
    }
}

impl Default for MonoText {
    fn default() -> Self {
        Self::new(8, 16)
    }
}

impl TextService for MonoText {
    fn line_height(&self, _font: FontVariant) -> i32 {
        self.line_height
    }

    fn advance(&self, _font: FontVariant, ch: char) -> i32 {
        if ch == '\n' { 0 } else { self.advance }
    }

    fn draw(
        &self,
        _font: FontVariant,
        text: &str,
        color: Color,
        pixels: &mut PixelsMut<'_>,
        origin: IVec2,
        clip: Rect,
    ) {
        let color = color.premultiplied();
        let inset_y = self.line_height / 8;
        let mut x = origin.x;
        for ch in text.chars() {
            if !ch.is_whitespace() {
                let glyph = Rect::new(
                    x,
                    origin.y + inset_y,
                    (self.advance - 1).max(1),
                    self.line_height - inset_y * 2,
                );
                if let Some(glyph) = glyph.intersect(clip) {
                    pixels.fill_rect(glyph, color);
                }
            }
            x += self.advance(FontVariant::Regular, ch);
        }
    }
}
