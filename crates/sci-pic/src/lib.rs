//! sci-pic: Sierra SCI0 picture resource codec.
//!
//! SCI0 pictures are not bitmaps. They are programs: a stream of drawing
//! opcodes (lines, flood fills, brush patterns, palette updates) that an
//! interpreter replays onto a 320x190 canvas of 16 EGA colours, with
//! extended colours faked by two-colour checkerboard dithering.
//!
//! This crate implements both directions:
//!
//! - **Decode**: [`PicInterpreter`] replays opcode bytes into an EGA
//!   index raster.
//! - **Encode**: [`Vectorizer`] quantises an image to EGA, mines a
//!   dither-pen [`Palette`], segments the image into connected areas,
//!   traces their contours and plans flood fills, then emits opcodes
//!   through [`PicEncoder`].
//!
//! # Quick start
//!
//! ```
//! use sci_pic::{ega, PicInterpreter, Vectorizer, verify_roundtrip};
//!
//! // A tiny solid image, through the whole pipeline and back.
//! let source = ega::quantize_rgba(&[0u8; 8 * 4 * 4], 8, 4);
//! let bytes = Vectorizer::new(&source).unwrap().encode().unwrap();
//! verify_roundtrip(&bytes, &source).unwrap();
//!
//! let frame = PicInterpreter::new(&bytes).run().unwrap();
//! assert_eq!(frame.get(3, 2), source.get(3, 2));
//! ```
//!
//! The conversion is lossy by construction (16 colours and a fixed
//! dither cell), but the encode side is exact with respect to its own
//! quantised input: the emitted stream replays to that raster pixel for
//! pixel, and [`verify_roundtrip`] enforces it.

pub mod ega;
pub mod palette;
pub mod pic;
pub mod raster;
pub mod vectorizer;

mod error;

#[cfg(test)]
mod domain_tests;

pub use error::Error;
pub use palette::{build_palette, Palette, Pen};
pub use pic::{PicEncoder, PicInterpreter, Point, BACKGROUND, PIC_HEIGHT, PIC_WIDTH};
pub use raster::IndexedRaster;
pub use vectorizer::{verify_roundtrip, Vectorizer};
