use once_cell::sync::Lazy;

mod hex_color;

pub use hex_color::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn to_rgba_u8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const fn alpha(self) -> u8 {
        self.a
    }

    pub fn hex(raw: &str) -> HexColor<'_> {
        HexColor::new(raw)
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Packs into the surface pixel format: premultiplied `0xAARRGGBB`.
    pub fn premultiplied(self) -> u32 {
        let a = self.a as u32;
        let mul = |c: u8| (c as u32 * a + 127) / 255;
        (a << 24) | (mul(self.r) << 16) | (mul(self.g) << 8) | mul(self.b)
    }

    /// Interpolates in linear light; `t` is clamped to `0..=1`.
    pub fn mix(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let a = self.to_rgba_f32();
        let b = other.to_rgba_f32();
        let lerp = |i: usize| a[i] + (b[i] - a[i]) * t;
        from_linear([lerp(0), lerp(1), lerp(2), lerp(3)])
    }
}

pub trait ColorLike {
    fn to_rgba_f32(&self) -> [f32; 4];
    fn to_rgba_u8(&self) -> [u8; 4] {
        let rgba_f32 = self.to_rgba_f32();
        [
            (linear_to_srgb_f32(rgba_f32[0].clamp(0.0, 1.0)) * 255.0).round() as u8,
            (linear_to_srgb_f32(rgba_f32[1].clamp(0.0, 1.0)) * 255.0).round() as u8,
            (linear_to_srgb_f32(rgba_f32[2].clamp(0.0, 1.0)) * 255.0).round() as u8,
            (rgba_f32[3].clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }

    fn is_transparent(&self) -> bool {
        self.to_rgba_u8()[3] != 255
    }
}

impl ColorLike for Color {
    fn to_rgba_f32(&self) -> [f32; 4] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
            self.a as f32 / 255.0,
        ]
    }

    fn to_rgba_u8(&self) -> [u8; 4] {
        Color::to_rgba_u8(*self)
    }
}

pub trait IntoColor<T> {
    fn into_color(self) -> T;
}

impl IntoColor<Color> for &str {
    fn into_color(self) -> Color {
        let [r, g, b, a] = Color::hex(self).to_rgba_u8();
        Color::rgba(r, g, b, a)
    }
}

impl IntoColor<Color> for String {
    fn into_color(self) -> Color {
        self.as_str().into_color()
    }
}

impl<'a> IntoColor<HexColor<'a>> for &'a str {
    fn into_color(self) -> HexColor<'a> {
        HexColor::new(self)
    }
}

impl<T> IntoColor<Color> for T
where
    T: ColorLike,
{
    fn into_color(self) -> Color {
        let [r, g, b, a] = self.to_rgba_u8();
        Color::rgba(r, g, b, a)
    }
}

fn from_linear(rgba: [f32; 4]) -> Color {
    let channel = |c: f32| (linear_to_srgb_f32(c.clamp(0.0, 1.0)) * 255.0).round() as u8;
    Color::rgba(
        channel(rgba[0]),
        channel(rgba[1]),
        channel(rgba[2]),
        (rgba[3].clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

static SRGB8_TO_LINEAR: Lazy<[f32; 256]> = Lazy::new(|| {
    let mut t = [0.0f32; 256];
    for (i, slot) in t.iter_mut().enumerate() {
        *slot = srgb_to_linear_f32(i as f32 / 255.0);
    }
    t
});

pub fn srgb_to_linear(c: u8) -> f32 {
    SRGB8_TO_LINEAR[c as usize]
}

pub fn srgb_to_linear_f32(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_to_srgb_f32(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::{Color, IntoColor};

    #[test]
    fn premultiplied_scales_channels_by_alpha() {
        assert_eq!(Color::rgb(255, 0, 0).premultiplied(), 0xffff_0000);
        assert_eq!(Color::rgba(255, 255, 255, 0).premultiplied(), 0);
        let half = Color::rgba(200, 100, 0, 128).premultiplied();
        assert_eq!(half >> 24, 128);
        assert_eq!((half >> 16) & 0xff, 100);
        assert_eq!((half >> 8) & 0xff, 50);
    }

    #[test]
    fn mix_hits_endpoints_and_stays_monotonic() {
        let black = Color::BLACK;
        let white = Color::WHITE;
        assert_eq!(black.mix(white, 0.0), black);
        assert_eq!(black.mix(white, 1.0), white);
        assert_eq!(black.mix(white, 7.0), white);
        let quarter = black.mix(white, 0.25).to_rgba_u8()[0];
        let half = black.mix(white, 0.5).to_rgba_u8()[0];
        assert!(quarter < half);
        // linear-light midpoint is brighter than the sRGB midpoint
        assert!(half > 128);
    }

    #[test]
    fn hex_strings_convert_through_into_color() {
        let color: Color = "#ff8000".into_color();
        assert_eq!(color, Color::rgb(255, 128, 0));
        let invalid: Color = "not a color".into_color();
        assert_eq!(invalid, Color::TRANSPARENT);
    }
}
