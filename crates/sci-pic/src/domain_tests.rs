//! Cross-module scenario tests: whole streams through the interpreter,
//! whole images through the vectorizer and back.

use pretty_assertions::assert_eq;

use crate::ega;
use crate::palette::Pen;
use crate::pic::{
    decode_absolute, decode_short, decode_sign_magnitude, encode_absolute, encode_short,
    encode_sign_magnitude, PicEncoder, PicInterpreter, Point, BACKGROUND, PIC_HEIGHT, PIC_WIDTH,
};
use crate::raster::IndexedRaster;
use crate::vectorizer::{verify_roundtrip, Vectorizer};

fn run(bytes: &[u8]) -> IndexedRaster {
    PicInterpreter::new(bytes).run().expect("stream replays")
}

#[test]
fn test_minimal_stream_yields_blank_canvas() {
    let frame = run(&[0x81, 0x00, 0xff]);
    assert_eq!(frame.width(), PIC_WIDTH);
    assert_eq!(frame.height(), PIC_HEIGHT);
    assert!(frame.pixels().iter().all(|&p| p == BACKGROUND));
}

#[test]
fn test_visual_color_and_long_lines_stream() {
    // setVisual 0, longLines (0,0) -> (4,0), end.
    let bytes = [
        0x81, 0x00, 0xf0, 0x00, 0xf6, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0xff,
    ];
    let frame = run(&bytes);
    for x in 0..5 {
        assert_eq!(frame.get(x, 0), 0x00);
    }
    assert_eq!(frame.get(5, 0), BACKGROUND);
    assert_eq!(frame.get(0, 1), BACKGROUND);
}

#[test]
fn test_border_and_flood_fill_stream() {
    let mut enc = PicEncoder::new();
    enc.set_visual(0);
    enc.multi_line(&[
        Point::new(0, 0),
        Point::new(9, 0),
        Point::new(9, 9),
        Point::new(0, 9),
        Point::new(0, 0),
    ])
    .unwrap();
    enc.fill(1, 1).unwrap();
    let frame = run(&enc.finish());

    for y in 0..10 {
        for x in 0..10 {
            assert_eq!(frame.get(x, y), 0x00, "({x}, {y}) inside the box");
        }
    }
    assert_eq!(frame.get(10, 5), BACKGROUND);
    assert_eq!(frame.get(5, 10), BACKGROUND);
}

#[test]
fn test_palette_bank_update_stream() {
    // Bank 1 all (0, F); visual colour 40 picks the first pen of bank 1.
    let mut bytes = vec![0x81, 0x00, 0xfe, 0x01, 0x01];
    bytes.extend(std::iter::repeat(0x0f).take(40));
    bytes.extend([0xf0, 0x28, 0xf6]);
    bytes.extend(encode_absolute(0, 0));
    bytes.extend(encode_absolute(5, 0));
    bytes.push(0xff);
    let frame = run(&bytes);
    for x in 0..=5usize {
        let expected = if x % 2 == 1 { 0x00 } else { 0x0f };
        assert_eq!(frame.get(x, 0), expected);
    }
}

#[test]
fn test_absolute_coordinate_codec_exhaustive_per_axis() {
    for x in 0..0x1000 {
        let [upper, lx, ly] = encode_absolute(x, 0x5a);
        assert_eq!(decode_absolute(upper, lx, ly), Point::new(x, 0x5a));
    }
    for y in 0..0x1000 {
        let [upper, lx, ly] = encode_absolute(0xa5, y);
        assert_eq!(decode_absolute(upper, lx, ly), Point::new(0xa5, y));
    }
}

#[test]
fn test_relative_codecs_exhaustive() {
    for dx in -7..=7 {
        for dy in -7..=7 {
            assert_eq!(decode_short(encode_short(dx, dy)), (dx, dy));
        }
    }
    for delta in -127..=127 {
        assert_eq!(decode_sign_magnitude(encode_sign_magnitude(delta)), delta);
    }
}

#[test]
fn test_encoded_polylines_replay_identically() {
    // The encoder is free to pick short/medium/long runs; whatever it
    // picks must replay to the same pixels a direct rasterisation gives.
    let polyline = [
        Point::new(10, 10),
        Point::new(14, 10),  // short
        Point::new(14, 60),  // medium
        Point::new(250, 60), // medium
        Point::new(0, 180),  // long-ish
        Point::new(3, 180),  // short
    ];

    let mut enc = PicEncoder::new();
    enc.set_visual(0);
    enc.multi_line(&polyline).unwrap();
    let frame = run(&enc.finish());

    let mut reference = IndexedRaster::filled(PIC_WIDTH, PIC_HEIGHT, BACKGROUND);
    for pair in polyline.windows(2) {
        reference.line(pair[0].x, pair[0].y, pair[1].x, pair[1].y, 0x00);
    }
    assert_eq!(frame, reference);
}

#[test]
fn test_pattern_stamps_replay_identically() {
    let points = [Point::new(30, 30), Point::new(33, 31), Point::new(200, 100)];
    let mut enc = PicEncoder::new();
    enc.solid_circle_pattern(0);
    enc.set_visual(0);
    enc.multi_pattern(&points).unwrap();
    let frame = run(&enc.finish());

    for point in points {
        assert_eq!(frame.get(point.x as usize, point.y as usize), 0x00);
    }
    let painted = frame.pixels().iter().filter(|&&p| p != BACKGROUND).count();
    assert_eq!(painted, points.len());
}

/// Full-canvas EGA raster helper.
fn canvas_with(f: impl Fn(usize, usize) -> u8) -> IndexedRaster {
    let mut raster = IndexedRaster::new(PIC_WIDTH, PIC_HEIGHT);
    for y in 0..PIC_HEIGHT {
        for x in 0..PIC_WIDTH {
            raster.put(x, y, f(x, y));
        }
    }
    raster
}

#[test]
fn test_color_bands_roundtrip_exactly() {
    // Eight horizontal bands of distinct EGA colours.
    let source = canvas_with(|_, y| (y * 8 / PIC_HEIGHT) as u8);
    let bytes = Vectorizer::new(&source).unwrap().encode().unwrap();
    verify_roundtrip(&bytes, &source).unwrap();
}

#[test]
fn test_color_bands_with_white_band_roundtrip() {
    // White band in the middle: the background area must emit nothing
    // and still come out white on playback.
    let source = canvas_with(|_, y| if (95..119).contains(&y) { 0x0f } else { (y * 8 / PIC_HEIGHT) as u8 });
    let bytes = Vectorizer::new(&source).unwrap().encode().unwrap();
    verify_roundtrip(&bytes, &source).unwrap();
}

#[test]
fn test_dither_columns_roundtrip_exactly() {
    // Alternating EGA 0/1 columns: pure two-colour dither.
    let source = canvas_with(|x, _| (x % 2) as u8);
    let vectorizer = Vectorizer::new(&source).unwrap();

    // The two checkerboard pens dominate the mined palette.
    let palette = vectorizer.palette();
    let top: Vec<Pen> = vec![palette.get(0), palette.get(1)];
    assert!(top.contains(&Pen::new(0, 1)));
    assert!(top.contains(&Pen::new(1, 0)));

    let bytes = vectorizer.encode().unwrap();
    verify_roundtrip(&bytes, &source).unwrap();
}

#[test]
fn test_nested_shapes_roundtrip_exactly() {
    // A filled rectangle with a hole, plus stray single pixels.
    let source = canvas_with(|x, y| {
        let in_outer = (40..160).contains(&x) && (30..120).contains(&y);
        let in_hole = (80..120).contains(&x) && (60..90).contains(&y);
        if in_outer && !in_hole {
            0x04
        } else if x == 300 && y == 20 {
            0x02
        } else if x == 310 && y == 170 {
            0x02
        } else {
            0x00
        }
    });
    let bytes = Vectorizer::new(&source).unwrap().encode().unwrap();
    verify_roundtrip(&bytes, &source).unwrap();
}

#[test]
fn test_half_background_dither_roundtrip() {
    // A region dithered against white exercises the fill-by-lines path.
    let source = canvas_with(|x, y| {
        if (50..100).contains(&x) && (50..100).contains(&y) {
            if (x + y) % 2 == 1 {
                0x01
            } else {
                0x0f
            }
        } else {
            0x0f
        }
    });
    let bytes = Vectorizer::new(&source).unwrap().encode().unwrap();
    verify_roundtrip(&bytes, &source).unwrap();
}

#[test]
fn test_verify_detects_mismatch() {
    let source = canvas_with(|_, y| (y * 8 / PIC_HEIGHT) as u8);
    let bytes = Vectorizer::new(&source).unwrap().encode().unwrap();
    let mut tampered = source.clone();
    tampered.put(7, 7, 0x0e);
    let err = verify_roundtrip(&bytes, &tampered).unwrap_err();
    assert!(matches!(err, crate::Error::Verify(_)));
}

#[test]
fn test_quantizer_fixed_points_via_full_pipeline() {
    // An image made of exact EGA colours quantises losslessly, so the
    // round-trip guarantee applies to it directly.
    let source = canvas_with(|x, _| ((x / 20) % 16) as u8);
    let rgba = ega::to_rgba(&source);
    let requantized = ega::quantize_rgba(&rgba, PIC_WIDTH, PIC_HEIGHT);
    assert_eq!(requantized, source);
}
