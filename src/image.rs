use std::path::Path;

use resvg::{tiny_skia, usvg};

use crate::error::DecodeError;

/// Decoded image in premultiplied `0xAARRGGBB`, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl DecodedImage {
    /// Nearest-neighbour sample at normalised coordinates.
    pub fn sample(&self, u: f32, v: f32) -> u32 {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        let x = ((u * self.width as f32) as i64).clamp(0, self.width as i64 - 1) as usize;
        let y = ((v * self.height as f32) as i64).clamp(0, self.height as i64 - 1) as usize;
        self.pixels
            .get(y * self.width as usize + x)
            .copied()
            .unwrap_or(0)
    }
}

/// Bitmap decode service used for image backgrounds.
pub trait ImageDecoder {
    fn decode(&self, path: &str) -> Result<DecodedImage, DecodeError>;
}

/// Decodes raster formats through `image` and `.svg` files through `resvg`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsImageDecoder;

impl ImageDecoder for FsImageDecoder {
    fn decode(&self, path: &str) -> Result<DecodedImage, DecodeError> {
        let is_svg = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
        if is_svg {
            let data = std::fs::read(path)?;
            return decode_svg(&data);
        }
        let rgba = ::image::open(path)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels = rgba
            .pixels()
            .map(|pixel| premultiply(pixel.0))
            .collect();
        Ok(DecodedImage {
            width,
            height,
            pixels,
        })
    }
}

pub fn decode_svg(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())?;
    let size = tree.size().to_int_size();
    let mut pixmap =
        tiny_skia::Pixmap::new(size.width(), size.height()).ok_or(DecodeError::EmptySvg)?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    // tiny-skia already stores premultiplied RGBA
    let pixels = pixmap
        .data()
        .chunks_exact(4)
        .map(|px| pack(px[0], px[1], px[2], px[3]))
        .collect();
    Ok(DecodedImage {
        width: size.width(),
        height: size.height(),
        pixels,
    })
}

fn premultiply([r, g, b, a]: [u8; 4]) -> u32 {
    let scale = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
    pack(scale(r), scale(g), scale(b), a)
}

fn pack(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}
