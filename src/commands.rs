//! The `show` and `convert` commands, kept free of any window plumbing
//! so integration tests can drive them directly.

use std::path::Path;

use anyhow::{bail, Context};
use tracing::{info, warn};

use sci_pic::{
    ega, verify_roundtrip, IndexedRaster, PicInterpreter, Vectorizer, PIC_HEIGHT, PIC_WIDTH,
};

/// Flags for [`convert`].
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    /// Replay the emitted stream and require a pixel-exact match.
    pub verify: bool,
    /// Treat an input not sized 320x190 as a warning instead of an error.
    pub allow_dimension_mismatch: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            verify: true,
            allow_dimension_mismatch: false,
        }
    }
}

/// Everything `convert` produces; the caller decides what to display
/// or save.
#[derive(Debug)]
pub struct Conversion {
    /// The emitted picture stream, header and terminator included.
    pub bytes: Vec<u8>,
    /// The quantised EGA raster the stream was compiled from.
    pub ega: IndexedRaster,
}

/// Decode a `.pic` file into an EGA raster.
pub fn show(path: &Path) -> anyhow::Result<IndexedRaster> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let frame = PicInterpreter::new(&data).run()?;
    info!(bytes = data.len(), "decoded picture");
    Ok(frame)
}

/// Vectorize an image file, optionally write the stream, and return
/// both the bytes and the raster they were compiled from.
pub fn convert(
    input: &Path,
    output: Option<&Path>,
    options: ConvertOptions,
) -> anyhow::Result<Conversion> {
    let image = image::open(input)
        .with_context(|| format!("reading {}", input.display()))?
        .to_rgba8();
    let (width, height) = (image.width() as usize, image.height() as usize);

    if (width, height) != (PIC_WIDTH, PIC_HEIGHT) {
        if options.allow_dimension_mismatch {
            warn!(
                width,
                height, "input is not {PIC_WIDTH}x{PIC_HEIGHT}, converting anyway"
            );
        } else {
            bail!(
                "input is {width}x{height}, expected {PIC_WIDTH}x{PIC_HEIGHT} \
                 (pass --no-dim-check to convert anyway)"
            );
        }
    }

    let ega = ega::quantize_rgba(image.as_raw(), width, height);
    let bytes = Vectorizer::new(&ega)?.encode()?;

    if options.verify {
        verify_roundtrip(&bytes, &ega)?;
        info!("round-trip verification passed");
    }

    if let Some(path) = output {
        std::fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        info!(bytes = bytes.len(), path = %path.display(), "picture saved");
    }

    Ok(Conversion { bytes, ega })
}
