use glam::IVec2;

use crate::view::render_pass::BitmapId;

/// Integer pixel rectangle. Width and height are never negative after
/// [`Rect::intersect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: IVec2, size: IVec2) -> Self {
        Self::new(origin.x, origin.y, size.x, size.y)
    }

    pub fn origin(self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    pub fn size(self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    pub fn right(self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn intersect(self, other: Self) -> Option<Self> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        let rect = Self::new(x, y, right - x, bottom - y);
        (!rect.is_empty()).then_some(rect)
    }

    /// Inclusive on both edges.
    pub fn contains(self, point: IVec2) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    pub fn translate(self, by: IVec2) -> Self {
        Self::new(self.x + by.x, self.y + by.y, self.width, self.height)
    }
}

/// Geometry derived by the layout pass. Only `scroll_offset` survives between
/// passes; every other field is recomputed from scratch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LayoutState {
    pub position: IVec2,
    pub max_size: IVec2,
    pub scroll_size: IVec2,
    /// Always in `max_size - scroll_size ..= 0` after clamping.
    pub scroll_offset: IVec2,
}

impl LayoutState {
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.max_size)
    }

    /// How far content extends past the box on each axis, never negative.
    pub fn overflow(&self) -> IVec2 {
        (self.scroll_size - self.max_size).max(IVec2::ZERO)
    }
}

/// Cached bitmap of one element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderCache {
    pub bitmap: Option<BitmapId>,
    pub width: u32,
    pub height: u32,
    pub changed: bool,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self {
            bitmap: None,
            width: 0,
            height: 0,
            changed: true,
        }
    }
}

impl RenderCache {
    /// Whether the cached layer can be composited as is. Blank elements keep
    /// no bitmap and are still current.
    pub(crate) fn is_current(&self, width: u32, height: u32) -> bool {
        !self.changed && self.width == width && self.height == height
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutState, Rect};
    use glam::IVec2;

    #[test]
    fn intersect_drops_disjoint_and_touching_rects() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.intersect(Rect::new(5, 5, 10, 10)), Some(Rect::new(5, 5, 5, 5)));
        assert_eq!(a.intersect(Rect::new(10, 0, 5, 5)), None);
        assert_eq!(a.intersect(Rect::new(-20, -20, 5, 5)), None);
    }

    #[test]
    fn contains_is_inclusive_on_both_edges() {
        let rect = Rect::new(10, 20, 30, 40);
        assert!(rect.contains(IVec2::new(10, 20)));
        assert!(rect.contains(IVec2::new(40, 60)));
        assert!(!rect.contains(IVec2::new(41, 60)));
        assert!(!rect.contains(IVec2::new(9, 30)));
    }

    #[test]
    fn overflow_is_clamped_to_zero() {
        let state = LayoutState {
            max_size: IVec2::new(100, 50),
            scroll_size: IVec2::new(80, 90),
            ..Default::default()
        };
        assert_eq!(state.overflow(), IVec2::new(0, 40));
    }
}
