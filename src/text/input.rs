use crate::ui::{Key, KeyPress};

/// Editing model behind an input element. The core reads text and selection,
/// and only moves the selection on click-to-position.
pub trait TextInput {
    fn text(&self) -> &str;

    /// `(anchor, caret)` in characters; either order.
    fn selection(&self) -> (usize, usize);

    /// Bumped on every text change so layout can skip unchanged inputs.
    fn revision(&self) -> u64;

    fn set_selection(&mut self, anchor: usize, caret: usize);

    /// Applies a key press; returns whether text or selection changed.
    fn key_press(&mut self, press: KeyPress) -> bool;

    fn selection_range(&self) -> (usize, usize) {
        let (a, b) = self.selection();
        (a.min(b), a.max(b))
    }
}

/// Minimal single-caret editing model: insertion, deletion, caret motion and
/// shift-extended selection. No undo history.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    text: String,
    anchor: usize,
    caret: usize,
    revision: u64,
    multiline: bool,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let end = text.chars().count();
        Self {
            text,
            anchor: end,
            caret: end,
            revision: 0,
            multiline: false,
        }
    }

    pub fn multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        let end = self.char_len();
        self.anchor = end;
        self.caret = end;
        self.revision += 1;
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map(|(at, _)| at)
            .unwrap_or(self.text.len())
    }

    /// Removes the selected range; returns whether anything was removed.
    fn delete_selection(&mut self) -> bool {
        let (start, end) = self.selection_range();
        if start == end {
            return false;
        }
        let range = self.byte_index(start)..self.byte_index(end);
        self.text.replace_range(range, "");
        self.anchor = start;
        self.caret = start;
        true
    }

    fn insert(&mut self, ch: char) {
        self.delete_selection();
        let at = self.byte_index(self.caret);
        self.text.insert(at, ch);
        self.caret += 1;
        self.anchor = self.caret;
    }

    fn move_caret(&mut self, to: usize, extend: bool) -> bool {
        let before = (self.anchor, self.caret);
        self.caret = to;
        if !extend {
            self.anchor = to;
        }
        before != (self.anchor, self.caret)
    }
}

impl TextInput for TextBuffer {
    fn text(&self) -> &str {
        &self.text
    }

    fn selection(&self) -> (usize, usize) {
        (self.anchor, self.caret)
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn set_selection(&mut self, anchor: usize, caret: usize) {
        let len = self.char_len();
        self.anchor = anchor.min(len);
        self.caret = caret.min(len);
    }

    fn key_press(&mut self, press: KeyPress) -> bool {
        let len = self.char_len();
        let (start, end) = self.selection_range();
        let edited = match press.key {
            Key::Char(ch) if !ch.is_control() => {
                self.insert(ch);
                true
            }
            Key::Enter if self.multiline => {
                self.insert('\n');
                true
            }
            Key::Backspace => {
                if self.delete_selection() {
                    true
                } else if self.caret > 0 {
                    self.caret -= 1;
                    self.anchor = self.caret;
                    let at = self.byte_index(self.caret);
                    self.text.remove(at);
                    true
                } else {
                    false
                }
            }
            Key::Delete => {
                if self.delete_selection() {
                    true
                } else if self.caret < len {
                    let at = self.byte_index(self.caret);
                    self.text.remove(at);
                    true
                } else {
                    false
                }
            }
            Key::Left => {
                let to = if start != end && !press.shift {
                    start
                } else {
                    self.caret.saturating_sub(1)
                };
                return self.move_caret(to, press.shift);
            }
            Key::Right => {
                let to = if start != end && !press.shift {
                    end
                } else {
                    (self.caret + 1).min(len)
                };
                return self.move_caret(to, press.shift);
            }
            Key::Home => return self.move_caret(0, press.shift),
            Key::End => return self.move_caret(len, press.shift),
            _ => false,
        };
        if edited {
            self.revision += 1;
        }
        edited
    }
}

#[cfg(test)]
mod tests {
    use super::{TextBuffer, TextInput};
    use crate::ui::{Key, KeyPress};

    fn press(key: Key) -> KeyPress {
        KeyPress { key, shift: false }
    }

    #[test]
    fn typing_inserts_at_caret_and_bumps_revision() {
        let mut buffer = TextBuffer::new("ac");
        buffer.set_selection(1, 1);
        assert!(buffer.key_press(press(Key::Char('b'))));
        assert_eq!(buffer.text(), "abc");
        assert_eq!(buffer.selection(), (2, 2));
        assert_eq!(buffer.revision(), 1);
    }

    #[test]
    fn shift_motion_extends_and_typing_replaces_selection() {
        let mut buffer = TextBuffer::new("hello");
        assert!(buffer.key_press(KeyPress {
            key: Key::Home,
            shift: true
        }));
        assert_eq!(buffer.selection_range(), (0, 5));
        buffer.key_press(press(Key::Char('x')));
        assert_eq!(buffer.text(), "x");
        assert_eq!(buffer.selection(), (1, 1));
    }

    #[test]
    fn backspace_and_delete_respect_bounds() {
        let mut buffer = TextBuffer::new("ab");
        assert!(!buffer.key_press(press(Key::Delete)));
        assert!(buffer.key_press(press(Key::Backspace)));
        assert_eq!(buffer.text(), "a");
        buffer.key_press(press(Key::Home));
        assert!(!buffer.key_press(press(Key::Backspace)));
        assert!(buffer.key_press(press(Key::Delete)));
        assert_eq!(buffer.text(), "");
        assert_eq!(buffer.revision(), 2);
    }

    #[test]
    fn enter_only_breaks_lines_when_multiline() {
        let mut single = TextBuffer::new("a");
        assert!(!single.key_press(press(Key::Enter)));
        let mut multi = TextBuffer::new("a").multiline(true);
        assert!(multi.key_press(press(Key::Enter)));
        assert_eq!(multi.text(), "a\n");
    }

    #[test]
    fn selection_is_clamped_to_text() {
        let mut buffer = TextBuffer::new("abc");
        buffer.set_selection(10, 1);
        assert_eq!(buffer.selection(), (3, 1));
        assert_eq!(buffer.selection_range(), (1, 3));
    }
}
