//! Template mask geometry.
//!
//! A mask selects which pixels of the rectangular template box take part in
//! correlation. The target pixel of a template box (its anchor) sits at
//! `(width / 2, height / 2)`; a template captured around an image point puts
//! that point on the anchor.

use crate::options::{MaskShape, OptionValues, TrackingMode};
use crate::util::math::direction_deg;
use crate::util::{TrackError, TrackResult};

/// Binary mask over a template box, row-major, `1` = active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    bits: Vec<u8>,
    active: usize,
}

impl Mask {
    /// Creates a mask from raw bits; any non-zero value counts as active.
    pub fn from_bits(bits: Vec<u8>, width: usize, height: usize) -> TrackResult<Self> {
        if width == 0 || height == 0 {
            return Err(TrackError::InvalidMaskGeometry { width, height });
        }
        if bits.len() != width * height {
            return Err(TrackError::BufferTooSmall {
                needed: width * height,
                got: bits.len(),
            });
        }
        let bits: Vec<u8> = bits.into_iter().map(|b| u8::from(b != 0)).collect();
        let active = bits.iter().filter(|&&b| b != 0).count();
        Ok(Self {
            width,
            height,
            bits,
            active,
        })
    }

    /// A mask with every pixel active.
    pub fn full(width: usize, height: usize) -> TrackResult<Self> {
        Self::from_bits(vec![1; width * height], width, height)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Mask bits in row-major order, each `0` or `1`.
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Number of active pixels.
    pub fn active(&self) -> usize {
        self.active
    }

    /// Returns true if `(x, y)` is inside the box and active.
    pub fn is_active(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.bits[y * self.width + x] != 0
    }
}

/// Shape, size and dimensionality of a template, fixed for one key frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskGeometry {
    pub shape: MaskShape,
    pub width: usize,
    pub height: usize,
    pub mode: TrackingMode,
    pub line_angle_deg: f32,
}

impl MaskGeometry {
    /// Full 2-D geometry of the given shape.
    pub fn area(shape: MaskShape, width: usize, height: usize) -> TrackResult<Self> {
        if width == 0 || height == 0 {
            return Err(TrackError::InvalidMaskGeometry { width, height });
        }
        Ok(Self {
            shape,
            width,
            height,
            mode: TrackingMode::Area,
            line_angle_deg: 0.0,
        })
    }

    /// 1-D geometry: a band `spread` pixels wide along `angle_deg`.
    pub fn line(width: usize, height: usize, spread: usize, angle_deg: f32) -> TrackResult<Self> {
        if width == 0 || height == 0 || spread == 0 {
            return Err(TrackError::InvalidMaskGeometry { width, height });
        }
        Ok(Self {
            shape: MaskShape::Rectangle,
            width,
            height,
            mode: TrackingMode::Line { spread },
            line_angle_deg: angle_deg,
        })
    }

    /// Geometry described by the current option values.
    pub fn from_options(values: &OptionValues) -> TrackResult<Self> {
        match values.mode() {
            TrackingMode::Area => {
                Self::area(values.mask_shape, values.mask_width, values.mask_height)
            }
            TrackingMode::Line { spread } => Self::line(
                values.mask_width,
                values.mask_height,
                spread,
                values.line_angle_deg,
            ),
        }
    }

    /// Anchor pixel of the template box.
    pub fn anchor(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    /// Rasterizes the mask.
    pub fn build_mask(&self) -> TrackResult<Mask> {
        let (w, h) = (self.width, self.height);
        if w == 0 || h == 0 {
            return Err(TrackError::InvalidMaskGeometry {
                width: w,
                height: h,
            });
        }
        let mut bits = vec![0u8; w * h];
        match self.mode {
            TrackingMode::Area => match self.shape {
                MaskShape::Rectangle => bits.fill(1),
                MaskShape::Ellipse => {
                    // Centered on the box, so the ellipse is symmetric for even sizes.
                    let cx = (w as f32 - 1.0) * 0.5;
                    let cy = (h as f32 - 1.0) * 0.5;
                    let rx = w as f32 * 0.5;
                    let ry = h as f32 * 0.5;
                    for y in 0..h {
                        for x in 0..w {
                            let nx = (x as f32 - cx) / rx;
                            let ny = (y as f32 - cy) / ry;
                            if nx * nx + ny * ny <= 1.0 {
                                bits[y * w + x] = 1;
                            }
                        }
                    }
                }
            },
            TrackingMode::Line { spread } => {
                let (ax, ay) = self.anchor();
                let (dx, dy) = direction_deg(self.line_angle_deg);
                let half = spread as f32 * 0.5;
                for y in 0..h {
                    for x in 0..w {
                        let px = x as f32 - ax as f32;
                        let py = y as f32 - ay as f32;
                        let dist = (px * dy - py * dx).abs();
                        if dist < half {
                            bits[y * w + x] = 1;
                        }
                    }
                }
            }
        }
        Mask::from_bits(bits, w, h)
    }
}
