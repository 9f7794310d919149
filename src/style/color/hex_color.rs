use super::{ColorLike, srgb_to_linear_f32};
use std::borrow::Cow;

/// `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`. Anything else parses as fully
/// transparent.
#[derive(Debug, Clone)]
pub struct HexColor<'a> {
    raw: Cow<'a, str>,
    value: [f32; 4],
}

impl<'a> HexColor<'a> {
    pub fn new(hex: impl Into<Cow<'a, str>>) -> Self {
        let hex = hex.into();
        let value = match Self::parse(hex.as_bytes()) {
            Some(rgba) => [
                srgb_to_linear_f32(rgba[0] as f32 / 255.0),
                srgb_to_linear_f32(rgba[1] as f32 / 255.0),
                srgb_to_linear_f32(rgba[2] as f32 / 255.0),
                rgba[3] as f32 / 255.0,
            ],
            None => [0.0; 4],
        };
        HexColor { raw: hex, value }
    }

    fn parse(bytes: &[u8]) -> Option<[u8; 4]> {
        let (&b'#', digits) = bytes.split_first()? else {
            return None;
        };
        if !digits.iter().all(u8::is_ascii_hexdigit) {
            return None;
        }
        let short = |i: usize| hex_1_to_u8(digits[i]) * 17;
        let long = |i: usize| hex_2_to_u8(digits[i * 2], digits[i * 2 + 1]);
        match digits.len() {
            3 => Some([short(0), short(1), short(2), 255]),
            4 => Some([short(0), short(1), short(2), short(3)]),
            6 => Some([long(0), long(1), long(2), 255]),
            8 => Some([long(0), long(1), long(2), long(3)]),
            _ => None,
        }
    }

    pub fn get_raw(&self) -> &str {
        &self.raw
    }
}

impl ColorLike for HexColor<'_> {
    fn to_rgba_f32(&self) -> [f32; 4] {
        self.value
    }
}

fn hex_1_to_u8(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}

fn hex_2_to_u8(c1: u8, c2: u8) -> u8 {
    (hex_1_to_u8(c1) << 4) | hex_1_to_u8(c2)
}
