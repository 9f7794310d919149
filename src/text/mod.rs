//! Text measurement and the editing collaborator.
//!
//! Layout only asks a [`TextService`] for advances and line heights; glyph
//! rasterisation happens through [`TextService::draw`] inside a locked bitmap.

use bytemuck::{Pod, Zeroable};
use glam::IVec2;

use crate::style::{Color, FontVariant};
use crate::view::base_component::Rect;
use crate::view::render_pass::PixelsMut;

mod cosmic;
mod input;
mod mono;

pub use cosmic::*;
pub use input::*;
pub use mono::*;

/// Character range `start..end` of one display line. The newline that ends a
/// hard line is not part of either neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct LineSpan {
    pub start: u32,
    pub end: u32,
}

impl LineSpan {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        char_slice(text, self.start as usize, self.end as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextMetrics {
    /// Widest line in pixels.
    pub width: i32,
    /// Character index at which each line after the first starts.
    pub line_breaks: Vec<u32>,
}

impl TextMetrics {
    pub fn line_count(&self) -> usize {
        self.line_breaks.len() + 1
    }

    pub fn lines(&self, text: &str) -> Vec<LineSpan> {
        let chars: Vec<char> = text.chars().collect();
        let mut starts = Vec::with_capacity(self.line_count());
        starts.push(0u32);
        starts.extend(self.line_breaks.iter().copied());
        let mut spans = Vec::with_capacity(starts.len());
        for (i, &start) in starts.iter().enumerate() {
            let end = match starts.get(i + 1) {
                Some(&next) if next > 0 && chars.get(next as usize - 1) == Some(&'\n') => next - 1,
                Some(&next) => next,
                None => chars.len() as u32,
            };
            spans.push(LineSpan {
                start,
                end: end.max(start),
            });
        }
        spans
    }
}

/// Font metrics and rasterisation supplied by the embedder.
pub trait TextService {
    fn line_height(&self, font: FontVariant) -> i32;

    /// Horizontal advance of one character in whole pixels.
    fn advance(&self, font: FontVariant, ch: char) -> i32;

    fn draw(
        &self,
        font: FontVariant,
        text: &str,
        color: Color,
        pixels: &mut PixelsMut<'_>,
        origin: IVec2,
        clip: Rect,
    );

    fn text_width(&self, font: FontVariant, text: &str) -> i32 {
        text.chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| self.advance(font, ch))
            .sum()
    }

    /// Greedy word wrap. `max_width <= 0` disables wrapping; newlines always
    /// break. A word wider than the limit is split between characters.
    fn measure(&self, font: FontVariant, text: &str, max_width: i32) -> TextMetrics {
        let mut line_breaks = Vec::new();
        let mut line_start = 0usize;
        let mut line_width = 0;
        // (index after the last space, line width up to and including it)
        let mut soft_break: Option<(usize, i32)> = None;

        for (index, ch) in text.chars().enumerate() {
            if ch == '\n' {
                line_breaks.push(index as u32 + 1);
                line_start = index + 1;
                line_width = 0;
                soft_break = None;
                continue;
            }
            let advance = self.advance(font, ch);
            if max_width > 0 && index > line_start && line_width + advance > max_width {
                match soft_break.take() {
                    Some((at, width)) if at > line_start => {
                        line_breaks.push(at as u32);
                        line_start = at;
                        line_width -= width;
                    }
                    _ => {
                        line_breaks.push(index as u32);
                        line_start = index;
                        line_width = 0;
                    }
                }
            }
            line_width += advance;
            if ch == ' ' {
                soft_break = Some((index + 1, line_width));
            }
        }

        let mut metrics = TextMetrics {
            width: 0,
            line_breaks,
        };
        metrics.width = metrics
            .lines(text)
            .iter()
            .map(|line| self.text_width(font, line.slice(text)))
            .max()
            .unwrap_or(0);
        metrics
    }

    /// Character index whose leading edge is nearest to `offset` pixels.
    fn offset_to_index(&self, font: FontVariant, text: &str, offset: i32) -> usize {
        let mut x = 0;
        for (index, ch) in text.chars().enumerate() {
            let advance = self.advance(font, ch);
            if offset < x + advance / 2 {
                return index;
            }
            x += advance;
        }
        text.chars().count()
    }

    fn index_to_offset(&self, font: FontVariant, text: &str, index: usize) -> i32 {
        text.chars()
            .take(index)
            .map(|ch| self.advance(font, ch))
            .sum()
    }
}

pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let byte = |chars: usize| {
        text.char_indices()
            .nth(chars)
            .map(|(at, _)| at)
            .unwrap_or(text.len())
    };
    let start = byte(start);
    let end = byte(end).max(start);
    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::{LineSpan, MonoText, TextService};
    use crate::style::FontVariant;

    const FONT: FontVariant = FontVariant::Regular;

    #[test]
    fn unlimited_width_only_breaks_on_newlines() {
        let text = MonoText::new(8, 16);
        let metrics = text.measure(FONT, "hello world\nab", 0);
        assert_eq!(metrics.line_breaks, vec![12]);
        assert_eq!(metrics.width, 11 * 8);
        assert_eq!(
            metrics.lines("hello world\nab"),
            vec![LineSpan { start: 0, end: 11 }, LineSpan { start: 12, end: 14 }]
        );
    }

    #[test]
    fn wraps_after_the_last_space_that_fits() {
        let text = MonoText::new(10, 16);
        let source = "aaa bbb ccc";
        let metrics = text.measure(FONT, source, 75);
        assert_eq!(metrics.line_breaks, vec![4, 8]);
        let lines: Vec<&str> = metrics.lines(source).iter().map(|l| l.slice(source)).collect();
        assert_eq!(lines, vec!["aaa ", "bbb ", "ccc"]);
        assert_eq!(metrics.width, 40);
    }

    #[test]
    fn long_words_split_between_characters() {
        let text = MonoText::new(10, 16);
        let metrics = text.measure(FONT, "abcdefg", 30);
        assert_eq!(metrics.line_breaks, vec![3, 6]);
        assert_eq!(metrics.width, 30);
    }

    #[test]
    fn empty_text_is_one_empty_line() {
        let text = MonoText::new(10, 16);
        let metrics = text.measure(FONT, "", 100);
        assert_eq!(metrics.line_count(), 1);
        assert_eq!(metrics.width, 0);
        assert_eq!(metrics.lines(""), vec![LineSpan::default()]);
    }

    #[test]
    fn offsets_and_indices_map_both_ways() {
        let text = MonoText::new(10, 16);
        assert_eq!(text.offset_to_index(FONT, "abcd", 0), 0);
        assert_eq!(text.offset_to_index(FONT, "abcd", 4), 0);
        assert_eq!(text.offset_to_index(FONT, "abcd", 5), 1);
        assert_eq!(text.offset_to_index(FONT, "abcd", 500), 4);
        assert_eq!(text.index_to_offset(FONT, "abcd", 3), 30);
    }
}
