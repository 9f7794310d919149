use bitflags::bitflags;
use glam::IVec2;

/// Per-side thickness in pixels, used for both padding and border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Edges {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Edges {
    pub const ZERO: Self = Self::all(0);

    pub const fn all(value: i32) -> Self {
        Self {
            left: value,
            right: value,
            top: value,
            bottom: value,
        }
    }

    pub const fn symmetric(horizontal: i32, vertical: i32) -> Self {
        Self {
            left: horizontal,
            right: horizontal,
            top: vertical,
            bottom: vertical,
        }
    }

    pub const fn new(left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Top-left offset.
    pub fn leading(self) -> IVec2 {
        IVec2::new(self.left, self.top)
    }

    /// Total thickness on each axis.
    pub fn total(self) -> IVec2 {
        IVec2::new(self.left + self.right, self.top + self.bottom)
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

impl std::ops::Add for Edges {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            left: self.left + rhs.left,
            right: self.right + rhs.right,
            top: self.top + rhs.top,
            bottom: self.bottom + rhs.bottom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexAxis {
    Horizontal,
    #[default]
    Vertical,
}

impl FlexAxis {
    /// Component index of the main axis in an `IVec2`.
    pub const fn main(self) -> usize {
        match self {
            FlexAxis::Horizontal => 0,
            FlexAxis::Vertical => 1,
        }
    }

    pub const fn cross(self) -> usize {
        1 - self.main()
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ScrollAxes: u8 {
        const X = 1 << 0;
        const Y = 1 << 1;
    }
}

impl ScrollAxes {
    /// Whether the axis with `IVec2` component index `axis` scrolls.
    pub fn scrolls(self, axis: usize) -> bool {
        match axis {
            0 => self.contains(ScrollAxes::X),
            _ => self.contains(ScrollAxes::Y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Clip,
    Scroll,
    ScrollX,
    ScrollY,
}

impl Overflow {
    pub fn scroll_axes(self) -> ScrollAxes {
        match self {
            Overflow::Clip => ScrollAxes::empty(),
            Overflow::Scroll => ScrollAxes::all(),
            Overflow::ScrollX => ScrollAxes::X,
            Overflow::ScrollY => ScrollAxes::Y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Edges, FlexAxis, Overflow, ScrollAxes};
    use glam::IVec2;

    #[test]
    fn overflow_maps_to_scroll_axes() {
        assert!(Overflow::Clip.scroll_axes().is_empty());
        assert_eq!(Overflow::Scroll.scroll_axes(), ScrollAxes::X | ScrollAxes::Y);
        assert!(Overflow::ScrollX.scroll_axes().scrolls(0));
        assert!(!Overflow::ScrollX.scroll_axes().scrolls(1));
        assert!(Overflow::ScrollY.scroll_axes().scrolls(1));
    }

    #[test]
    fn edges_sum_per_axis() {
        let inset = Edges::new(1, 2, 3, 4) + Edges::all(1);
        assert_eq!(inset.total(), IVec2::new(5, 9));
        assert_eq!(inset.leading(), IVec2::new(2, 4));
        assert_eq!(FlexAxis::Horizontal.cross(), 1);
    }
}
