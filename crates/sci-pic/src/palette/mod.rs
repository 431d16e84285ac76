//! Dither pens and pen palettes.
//!
//! SCI0 pictures draw with "pens": ordered pairs of EGA colours laid out
//! as a one-pixel checkerboard. This module provides the pen type, the
//! ordered palette with its reverse lookup, and the palette builder that
//! mines pens from a quantised image.

mod builder;
mod palette;

pub use builder::{build_palette, MAX_PENS};
pub use palette::{Palette, Pen, DEFAULT_PENS};
