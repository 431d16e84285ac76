//! Unified error type for the sci-pic public API.
//!
//! Wraps the per-module error types into a single enum so application
//! code can propagate everything with `?`.

use thiserror::Error;

use crate::pic::{DecodeError, EncodeError};
use crate::raster::RasterError;
use crate::vectorizer::{VectorizeError, VerifyError};

/// Any failure the codec can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Replaying a picture stream failed.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Emitting a picture stream failed.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// A drawing primitive hit a resource bound.
    #[error("raster error: {0}")]
    Raster(#[from] RasterError),

    /// Compiling an image into opcodes failed.
    #[error("vectorize error: {0}")]
    Vectorize(#[from] VectorizeError),

    /// The encoded stream did not replay to its source image.
    #[error("verification failed: {0}")]
    Verify(#[from] VerifyError),
}
