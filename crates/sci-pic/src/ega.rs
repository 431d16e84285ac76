//! The fixed 16-entry EGA palette and RGBA quantisation.

use crate::raster::IndexedRaster;

/// The standard IBM EGA colours as `[r, g, b]`. Entry 6 is brown, not
/// dark yellow.
pub const EGA_PALETTE: [[u8; 3]; 16] = [
    [0x00, 0x00, 0x00], // black
    [0x00, 0x00, 0xaa], // blue
    [0x00, 0xaa, 0x00], // green
    [0x00, 0xaa, 0xaa], // cyan
    [0xaa, 0x00, 0x00], // red
    [0xaa, 0x00, 0xaa], // magenta
    [0xaa, 0x55, 0x00], // brown
    [0xaa, 0xaa, 0xaa], // light grey
    [0x55, 0x55, 0x55], // dark grey
    [0x55, 0x55, 0xff], // light blue
    [0x55, 0xff, 0x55], // light green
    [0x55, 0xff, 0xff], // light cyan
    [0xff, 0x55, 0x55], // light red
    [0xff, 0x55, 0xff], // light magenta
    [0xff, 0xff, 0x55], // yellow
    [0xff, 0xff, 0xff], // white
];

fn distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    let dr = (a[0] as i32 - b[0] as i32).unsigned_abs();
    let dg = (a[1] as i32 - b[1] as i32).unsigned_abs();
    let db = (a[2] as i32 - b[2] as i32).unsigned_abs();
    dr + dg + db
}

/// Nearest EGA index by L1 distance. Ties resolve to the lowest index.
pub fn ega_color(rgb: [u8; 3]) -> u8 {
    let mut best = 0;
    let mut best_distance = u32::MAX;
    for (i, &candidate) in EGA_PALETTE.iter().enumerate() {
        let d = distance(rgb, candidate);
        if d < best_distance {
            best_distance = d;
            best = i;
        }
    }
    best as u8
}

/// Quantise an RGBA8 buffer (alpha ignored) into an EGA index raster.
pub fn quantize_rgba(pixels: &[u8], width: usize, height: usize) -> IndexedRaster {
    assert_eq!(pixels.len(), width * height * 4, "RGBA buffer size mismatch");
    let mut raster = IndexedRaster::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let p = &pixels[(y * width + x) * 4..][..3];
            raster.put(x, y, ega_color([p[0], p[1], p[2]]));
        }
    }
    raster
}

/// Expand an EGA index raster into an RGBA8 buffer for display.
pub fn to_rgba(raster: &IndexedRaster) -> Vec<u8> {
    let mut out = Vec::with_capacity(raster.width() * raster.height() * 4);
    for &index in raster.pixels() {
        let [r, g, b] = EGA_PALETTE[index as usize & 0x0f];
        out.extend_from_slice(&[r, g, b, 0xff]);
    }
    out
}
