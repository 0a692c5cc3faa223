//! Image-space points, search windows, and tracking lines.

use crate::util::math::direction_deg;

/// Image-space point in pixel units (x right, y down).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub(crate) fn offset(self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned search rectangle in frame coordinates.
///
/// The window bounds the pixels a template placement may cover: a placement
/// with top-left `(px, py)` is valid when the whole template box lies inside
/// the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchWindow {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl SearchWindow {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the window centered on `center` with the given half-extents,
    /// clipped to a `frame_width x frame_height` frame.
    ///
    /// Returns `None` when nothing of the window remains inside the frame.
    pub fn centered(
        center: Point,
        half_width: usize,
        half_height: usize,
        frame_width: usize,
        frame_height: usize,
    ) -> Option<Self> {
        if !center.x.is_finite() || !center.y.is_finite() {
            return None;
        }
        let cx = center.x.round() as i64;
        let cy = center.y.round() as i64;
        let x0 = (cx - half_width as i64).max(0);
        let y0 = (cy - half_height as i64).max(0);
        let x1 = (cx + half_width as i64).min(frame_width as i64 - 1);
        let y1 = (cy + half_height as i64).min(frame_height as i64 - 1);
        if x1 < x0 || y1 < y0 {
            return None;
        }
        Some(Self {
            x: x0 as usize,
            y: y0 as usize,
            width: (x1 - x0 + 1) as usize,
            height: (y1 - y0 + 1) as usize,
        })
    }

    /// Clips the window to a frame, returning `None` if it falls outside.
    pub fn clip(self, frame_width: usize, frame_height: usize) -> Option<Self> {
        if self.x >= frame_width || self.y >= frame_height || self.width == 0 || self.height == 0
        {
            return None;
        }
        let x1 = self.x.saturating_add(self.width).min(frame_width);
        let y1 = self.y.saturating_add(self.height).min(frame_height);
        Some(Self {
            x: self.x,
            y: self.y,
            width: x1 - self.x,
            height: y1 - self.y,
        })
    }

    /// Range of valid top-left placements `(x0, y0, x1, y1)`, inclusive,
    /// for a template of the given size.
    pub fn placements(
        &self,
        tpl_width: usize,
        tpl_height: usize,
    ) -> Option<(usize, usize, usize, usize)> {
        if tpl_width == 0 || tpl_height == 0 {
            return None;
        }
        if self.width < tpl_width || self.height < tpl_height {
            return None;
        }
        Some((
            self.x,
            self.y,
            self.x + self.width - tpl_width,
            self.y + self.height - tpl_height,
        ))
    }

    /// Returns true if a template box placed at `(x, y)` fits inside.
    pub fn holds(&self, x: usize, y: usize, tpl_width: usize, tpl_height: usize) -> bool {
        x >= self.x
            && y >= self.y
            && x + tpl_width <= self.x + self.width
            && y + tpl_height <= self.y + self.height
    }
}

/// Straight line along which 1-D tracking searches.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchLine {
    /// A point on the line (the key-frame mask center).
    pub origin: Point,
    /// Line direction in degrees; 0 is +x, 90 is +y.
    pub angle_deg: f32,
}

impl SearchLine {
    pub fn new(origin: Point, angle_deg: f32) -> Self {
        Self { origin, angle_deg }
    }

    /// Unit direction vector of the line.
    pub fn direction(&self) -> (f32, f32) {
        direction_deg(self.angle_deg)
    }

    /// Point at signed distance `t` from the origin.
    pub fn at(&self, t: f32) -> Point {
        let (dx, dy) = self.direction();
        self.origin.offset(dx * t, dy * t)
    }

    /// Signed distance of the orthogonal projection of `p` onto the line.
    pub fn project(&self, p: Point) -> f32 {
        let (dx, dy) = self.direction();
        (p.x - self.origin.x) * dx + (p.y - self.origin.y) * dy
    }

    /// Closest point on the line to `p`.
    pub fn snap(&self, p: Point) -> Point {
        self.at(self.project(p))
    }
}
