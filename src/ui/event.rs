use glam::IVec2;

/// The closed set of events an [`ElementHandler`](super::ElementHandler) can
/// receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Blur,
    KeyPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }
}

/// Event delivered to one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// Pointer position in output coordinates.
    Click { point: IVec2 },
    Blur,
    KeyPress(KeyPress),
}

impl UiEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            UiEvent::Click { .. } => EventKind::Click,
            UiEvent::Blur => EventKind::Blur,
            UiEvent::KeyPress(_) => EventKind::KeyPress,
        }
    }
}

/// Platform input as the embedder hands it to the viewport.
///
/// Scroll deltas are added to the scroll offset: a negative `y` moves content
/// up, revealing what is below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Resize { width: u32, height: u32 },
    Click { point: IVec2 },
    Wheel { point: IVec2, delta: IVec2 },
    /// Touch gestures only scroll with two or more fingers.
    TouchBegin { point: IVec2, fingers: u8 },
    TouchMove { point: IVec2 },
    TouchEnd,
    Key(KeyPress),
}
