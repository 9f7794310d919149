use glam::IVec2;
use slotmap::{SlotMap, new_key_type};

use crate::error::SurfaceError;
use crate::view::base_component::Rect;

new_key_type! {
    /// Handle of a pixel buffer owned by a [`RenderSurface`].
    pub struct BitmapId;
}

/// Owned premultiplied `0xAARRGGBB` pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn as_pixels_mut(&mut self) -> PixelsMut<'_> {
        PixelsMut {
            width: self.width,
            height: self.height,
            pixels: &mut self.pixels,
        }
    }
}

/// Locked, directly writable view of a bitmap.
pub struct PixelsMut<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a mut [u32],
}

impl PixelsMut<'_> {
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    pub fn put(&mut self, x: i32, y: i32, color: u32) {
        if let Some(index) = self.index(x, y) {
            self.pixels[index] = color;
        }
    }

    /// Source-over blend of a premultiplied color scaled by `coverage`.
    pub fn blend(&mut self, x: i32, y: i32, color: u32, coverage: f32) {
        let Some(index) = self.index(x, y) else {
            return;
        };
        let coverage = coverage.clamp(0.0, 1.0);
        if coverage <= 0.0 {
            return;
        }
        let source = if coverage >= 1.0 {
            color
        } else {
            scale(color, (coverage * 255.0).round() as u32)
        };
        self.pixels[index] = over(source, self.pixels[index]);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: u32) {
        let Some(rect) = rect.intersect(self.bounds()) else {
            return;
        };
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                self.blend(x, y, color, 1.0);
            }
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

fn scale(color: u32, factor: u32) -> u32 {
    let channel = |shift: u32| ((((color >> shift) & 0xff) * factor + 127) / 255) << shift;
    channel(24) | channel(16) | channel(8) | channel(0)
}

/// Premultiplied source-over.
pub fn over(source: u32, destination: u32) -> u32 {
    let alpha = source >> 24;
    if alpha == 255 {
        return source;
    }
    if alpha == 0 {
        return destination;
    }
    let keep = 255 - alpha;
    let channel = |shift: u32| {
        let s = (source >> shift) & 0xff;
        let d = (destination >> shift) & 0xff;
        ((s + (d * keep + 127) / 255).min(255)) << shift
    };
    channel(24) | channel(16) | channel(8) | channel(0)
}

/// What the compositor needs from the platform: writable pixel buffers, direct
/// pixel access, sub-rectangle copies and an output that can be resized.
pub trait RenderSurface {
    fn allocate(&mut self, width: u32, height: u32) -> Result<BitmapId, SurfaceError>;
    fn release(&mut self, bitmap: BitmapId);
    fn lock(&mut self, bitmap: BitmapId) -> Option<PixelsMut<'_>>;
    fn size(&self, bitmap: BitmapId) -> Option<(u32, u32)>;

    /// Blends `from` of `source` onto `destination` with its top-left corner at
    /// `to`. Parts falling outside either bitmap are dropped.
    fn copy(
        &mut self,
        source: BitmapId,
        from: Rect,
        destination: BitmapId,
        to: IVec2,
    ) -> Result<(), SurfaceError>;

    fn resize_output(&mut self, width: u32, height: u32) -> Result<(), SurfaceError>;
    fn output(&self) -> BitmapId;

    fn output_size(&self) -> (u32, u32) {
        self.size(self.output()).unwrap_or((0, 0))
    }
}

pub const DEFAULT_MAX_DIMENSION: u32 = 16384;

/// In-memory [`RenderSurface`]; the output is an ordinary bitmap the embedder
/// presents however it likes.
pub struct SoftwareSurface {
    bitmaps: SlotMap<BitmapId, Bitmap>,
    output: BitmapId,
    max_dimension: u32,
}

impl SoftwareSurface {
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        Self::with_max_dimension(width, height, DEFAULT_MAX_DIMENSION)
    }

    pub fn with_max_dimension(
        width: u32,
        height: u32,
        max_dimension: u32,
    ) -> Result<Self, SurfaceError> {
        if width > max_dimension || height > max_dimension {
            return Err(SurfaceError::Allocation { width, height });
        }
        let mut bitmaps = SlotMap::with_key();
        let output = bitmaps.insert(Bitmap::new(width, height));
        Ok(Self {
            bitmaps,
            output,
            max_dimension,
        })
    }

    pub fn bitmap(&self, bitmap: BitmapId) -> Option<&Bitmap> {
        self.bitmaps.get(bitmap)
    }

    pub fn output_bitmap(&self) -> Option<&Bitmap> {
        self.bitmaps.get(self.output)
    }

    /// Live bitmaps, the output included.
    pub fn bitmap_count(&self) -> usize {
        self.bitmaps.len()
    }
}

impl RenderSurface for SoftwareSurface {
    fn allocate(&mut self, width: u32, height: u32) -> Result<BitmapId, SurfaceError> {
        if width == 0 || height == 0 || width > self.max_dimension || height > self.max_dimension
        {
            return Err(SurfaceError::Allocation { width, height });
        }
        Ok(self.bitmaps.insert(Bitmap::new(width, height)))
    }

    fn release(&mut self, bitmap: BitmapId) {
        if bitmap != self.output {
            self.bitmaps.remove(bitmap);
        }
    }

    fn lock(&mut self, bitmap: BitmapId) -> Option<PixelsMut<'_>> {
        self.bitmaps.get_mut(bitmap).map(Bitmap::as_pixels_mut)
    }

    fn size(&self, bitmap: BitmapId) -> Option<(u32, u32)> {
        self.bitmaps
            .get(bitmap)
            .map(|bitmap| (bitmap.width, bitmap.height))
    }

    fn copy(
        &mut self,
        source: BitmapId,
        from: Rect,
        destination: BitmapId,
        to: IVec2,
    ) -> Result<(), SurfaceError> {
        if source == destination {
            return Ok(());
        }
        let (source_width, source_pixels) = {
            let bitmap = self
                .bitmaps
                .get_mut(source)
                .ok_or(SurfaceError::UnknownBitmap(source))?;
            (bitmap.width, std::mem::take(&mut bitmap.pixels))
        };
        let result = match self.bitmaps.get_mut(destination) {
            Some(target) => {
                let source_height = source_pixels.len() as u32 / source_width.max(1);
                let source_bounds = Rect::new(0, 0, source_width as i32, source_height as i32);
                if let Some(clipped) = from.intersect(source_bounds) {
                    let to = to + (clipped.origin() - from.origin());
                    let from = clipped;
                    let mut pixels = target.as_pixels_mut();
                    for row in 0..from.height {
                        let sy = (from.y + row) as usize;
                        for column in 0..from.width {
                            let sx = (from.x + column) as usize;
                            let color = source_pixels[sy * source_width as usize + sx];
                            pixels.blend(to.x + column, to.y + row, color, 1.0);
                        }
                    }
                }
                Ok(())
            }
            None => Err(SurfaceError::UnknownBitmap(destination)),
        };
        if let Some(bitmap) = self.bitmaps.get_mut(source) {
            bitmap.pixels = source_pixels;
        }
        result
    }

    fn resize_output(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if width > self.max_dimension || height > self.max_dimension {
            return Err(SurfaceError::Allocation { width, height });
        }
        if let Some(output) = self.bitmaps.get_mut(self.output) {
            *output = Bitmap::new(width, height);
        }
        Ok(())
    }

    fn output(&self) -> BitmapId {
        self.output
    }
}
