use smol_str::SmolStr;

use super::Color;

/// Background fill of an element.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Paint {
    #[default]
    None,
    Solid(Color),
    /// Left to right.
    HorizontalGradient(Color, Color),
    /// Top to bottom.
    VerticalGradient(Color, Color),
    /// Path handed to the image decoder; decode failures paint nothing.
    Image(SmolStr),
}

impl Paint {
    pub fn is_none(&self) -> bool {
        matches!(self, Paint::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontVariant {
    #[default]
    Regular,
    Bold,
    Heading,
    Mono,
}
