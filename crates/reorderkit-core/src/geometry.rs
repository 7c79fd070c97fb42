#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All coordinates are cells, 0-indexed with the origin at the top-left.
//! Pointer positions and item bounds share the same space.

/// A pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

impl Position {
    /// Create a new position.
    #[inline]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`.
    #[inline]
    pub fn manhattan_distance(self, other: Position) -> u32 {
        u32::from(self.x.abs_diff(other.x)) + u32::from(self.y.abs_diff(other.y))
    }

    /// Signed delta `(dx, dy)` from `self` to `other`.
    #[inline]
    pub fn delta(self, other: Position) -> (i32, i32) {
        (
            i32::from(other.x) - i32::from(self.x),
            i32::from(other.y) - i32::from(self.y),
        )
    }
}

/// A rectangle for item bounds, overlay placement, and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x && pos.x < self.right() && pos.y >= self.y && pos.y < self.bottom()
    }

    /// Whether `y` lies strictly above this rectangle's vertical midpoint.
    ///
    /// Compared in doubled units so odd heights need no rounding: the
    /// midline of a 3-row item at `y = 10` sits at 11.5.
    #[inline]
    pub const fn is_above_midline(&self, y: u16) -> bool {
        2 * (y as u32) < 2 * (self.y as u32) + self.height as u32
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect {
            x,
            y,
            width: right.saturating_sub(x),
            height: bottom.saturating_sub(y),
        }
    }

    /// Offset of `pos` relative to this rectangle's origin.
    ///
    /// Negative when the point lies above or left of the rectangle.
    #[inline]
    pub fn relative(&self, pos: Position) -> (i32, i32) {
        (
            i32::from(pos.x) - i32::from(self.x),
            i32::from(pos.y) - i32::from(self.y),
        )
    }
}
