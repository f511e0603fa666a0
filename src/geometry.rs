use serde::{Deserialize, Serialize};

/// Signed window origin with unsigned size, in host pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowRect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn overlaps(&self, other: &WindowRect) -> bool {
        rect_overlap(*self, *other)
    }

    /// True when `other` lies entirely inside `self`.
    pub fn covers(&self, other: &WindowRect) -> bool {
        if other.is_empty() {
            return false;
        }
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }
}

/// Half-open overlap test. Edge-touching rectangles do not overlap and a
/// zero-sized rectangle never overlaps anything.
pub fn rect_overlap(a: WindowRect, b: WindowRect) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    axis_overlap(a.x, a.width, b.x, b.width) && axis_overlap(a.y, a.height, b.y, b.height)
}

fn axis_overlap(p1: i32, s1: u32, p2: i32, s2: u32) -> bool {
    let (p1, s1, p2, s2) = (p1 as i64, s1 as i64, p2 as i64, s2 as i64);
    (p1 <= p2 && p1 + s1 > p2) || (p2 <= p1 && p2 + s2 > p1)
}
