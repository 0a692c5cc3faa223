//! Subpixel peak refinement by quadratic fitting.

pub(crate) mod quad1d;
pub(crate) mod quad2d;
