use std::cell::RefCell;

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, SwashCache, Weight};
use glam::IVec2;
use rustc_hash::FxHashMap;

use super::TextService;
use crate::style::{Color, FontVariant};
use crate::view::base_component::Rect;
use crate::view::render_pass::PixelsMut;

/// [`TextService`] backed by cosmic-text with the system font database.
///
/// Advances are shaped one character at a time and cached, which matches how
/// layout and caret placement consume them.
pub struct CosmicText {
    font_system: RefCell<FontSystem>,
    swash_cache: RefCell<SwashCache>,
    advances: RefCell<FxHashMap<(FontVariant, char), i32>>,
}

impl CosmicText {
    pub fn new() -> Self {
        Self::with_font_system(FontSystem::new())
    }

    pub fn with_font_system(font_system: FontSystem) -> Self {
        Self {
            font_system: RefCell::new(font_system),
            swash_cache: RefCell::new(SwashCache::new()),
            advances: RefCell::new(FxHashMap::default()),
        }
    }

    fn metrics(font: FontVariant) -> Metrics {
        match font {
            FontVariant::Heading => Metrics::new(22.0, 28.0),
            _ => Metrics::new(14.0, 18.0),
        }
    }

    fn attrs(font: FontVariant) -> Attrs<'static> {
        match font {
            FontVariant::Regular => Attrs::new(),
            FontVariant::Bold | FontVariant::Heading => Attrs::new().weight(Weight::BOLD),
            FontVariant::Mono => Attrs::new().family(Family::Monospace),
        }
    }

    fn prepare_buffer(font_system: &mut FontSystem, font: FontVariant, text: &str) -> Buffer {
        let mut buffer = Buffer::new(font_system, Self::metrics(font));
        buffer.set_size(font_system, None, None);
        buffer.set_text(font_system, text, &Self::attrs(font), Shaping::Advanced, None);
        buffer.shape_until_scroll(font_system, false);
        buffer
    }
}

impl Default for CosmicText {
    fn default() -> Self {
        Self::new()
    }
}

impl TextService for CosmicText {
    fn line_height(&self, font: FontVariant) -> i32 {
        Self::metrics(font).line_height.ceil() as i32
    }

    fn advance(&self, font: FontVariant, ch: char) -> i32 {
        if ch == '\n' {
            return 0;
        }
        if let Some(advance) = self.advances.borrow().get(&(font, ch)) {
            return *advance;
        }
        let mut font_system = self.font_system.borrow_mut();
        let mut utf8 = [0u8; 4];
        let buffer = Self::prepare_buffer(&mut font_system, font, ch.encode_utf8(&mut utf8));
        let advance = buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0f32, f32::max)
            .round() as i32;
        self.advances.borrow_mut().insert((font, ch), advance);
        advance
    }

    fn draw(
        &self,
        font: FontVariant,
        text: &str,
        color: Color,
        pixels: &mut PixelsMut<'_>,
        origin: IVec2,
        clip: Rect,
    ) {
        let Some(clip) = clip.intersect(pixels.bounds()) else {
            return;
        };
        let mut font_system = self.font_system.borrow_mut();
        let mut swash_cache = self.swash_cache.borrow_mut();
        let buffer = Self::prepare_buffer(&mut font_system, font, text);
        let [r, g, b, a] = color.to_rgba_u8();
        buffer.draw(
            &mut font_system,
            &mut swash_cache,
            cosmic_text::Color::rgba(r, g, b, a),
            |x, y, width, height, glyph| {
                let coverage = glyph.a() as f32 / 255.0;
                let premultiplied =
                    Color::rgba(glyph.r(), glyph.g(), glyph.b(), 255).premultiplied();
                for dy in 0..height as i32 {
                    for dx in 0..width as i32 {
                        let (px, py) = (origin.x + x + dx, origin.y + y + dy);
                        if px >= clip.x && px < clip.right() && py >= clip.y && py < clip.bottom() {
                            pixels.blend(px, py, premultiplied, coverage);
                        }
                    }
                }
            },
        );
    }
}
