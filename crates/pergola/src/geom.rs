//! Pixel geometry primitives.

/// A point in window coordinates. Pixels are signed because placement deltas
/// and stick/center adjustments can move an origin off the left or top edge
/// of its parent.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct Point {
    /// Horizontal position in pixels.
    pub x: i32,
    /// Vertical position in pixels.
    pub y: i32,
}

impl Point {
    /// Construct a point.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The origin point.
    pub fn zero() -> Self {
        Self::default()
    }
}

impl From<(i32, i32)> for Point {
    fn from(v: (i32, i32)) -> Self {
        Self { x: v.0, y: v.1 }
    }
}

/// A width and height without a location. Used for measured widget sizes and
/// for the extents the layout engine maps percentages onto.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct Expanse {
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

impl Expanse {
    /// Construct an expanse.
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// True if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Return a rect of this size with its origin at (0, 0).
    pub fn rect(&self) -> Rect {
        Rect {
            tl: Point::zero(),
            w: self.w,
            h: self.h,
        }
    }
}

impl From<(u32, u32)> for Expanse {
    fn from(v: (u32, u32)) -> Self {
        Self { w: v.0, h: v.1 }
    }
}

impl From<Rect> for Expanse {
    fn from(r: Rect) -> Self {
        Self { w: r.w, h: r.h }
    }
}

/// A rectangle in parent-relative pixel coordinates: a signed origin plus an
/// unsigned size.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct Rect {
    /// Top-left corner.
    pub tl: Point,
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

impl Rect {
    /// Construct a rect from origin and size.
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self {
            tl: Point { x, y },
            w,
            h,
        }
    }

    /// The zero rect.
    pub fn zero() -> Self {
        Self::default()
    }

    /// The size of this rect.
    pub fn expanse(&self) -> Expanse {
        Expanse {
            w: self.w,
            h: self.h,
        }
    }

    /// Horizontal origin.
    pub fn x(&self) -> i32 {
        self.tl.x
    }

    /// Vertical origin.
    pub fn y(&self) -> i32 {
        self.tl.y
    }

    /// The rect as an `[x, y, w, h]` tuple, the shape carried by geometry
    /// event payloads.
    pub fn as_tuple(&self) -> (i32, i32, u32, u32) {
        (self.tl.x, self.tl.y, self.w, self.h)
    }
}
