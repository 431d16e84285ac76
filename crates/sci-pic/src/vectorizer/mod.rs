//! Image-to-opcode compilation.
//!
//! The vectorizer turns a quantised EGA raster into a picture stream in
//! ordered passes:
//!
//! 1. mine a dither-pen palette from the image;
//! 2. assign every pixel a single pen index under spatial bias;
//! 3. sweep the pen-index raster into connected areas;
//! 4. absorb lone pixels into compatible neighbours, group the rest
//!    into pattern-stamp lists;
//! 5. plan geometry per area: nothing for background, one line per run
//!    for pens that dither against white, traced contours otherwise;
//! 6. plan flood fills against a playback simulation canvas, falling
//!    back to contour-first drawing when a fill would escape its area;
//! 7. emit palette, patterns, polylines and fills as opcodes.
//!
//! The emitted stream is meant to replay to the exact input raster;
//! [`verify_roundtrip`] checks that.

mod area;
mod trace;

pub use area::{AreaId, AreaMap, PixelArea, PixelRun};

use thiserror::Error;
use tracing::{debug, info};

use crate::error::Error;
use crate::palette::{build_palette, Palette, Pen};
use crate::pic::{PicEncoder, PicInterpreter, Point, BACKGROUND, PIC_HEIGHT, PIC_WIDTH};
use crate::raster::{IndexedRaster, RasterError};

use area::{build_areas, build_owner_grid};
use trace::{simplify, trace_outlines};

/// Failures while compiling an image into opcodes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VectorizeError {
    /// No palette pen reproduces the source colour at a pixel. Happens
    /// when palette truncation dropped every pen of a rare colour.
    #[error("no palette pen reproduces EGA colour {color:#03x} at ({x}, {y})")]
    UnmappedPixel { x: usize, y: usize, color: u8 },

    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// The encoded stream did not replay to the source raster.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("round-trip mismatch: {mismatches} pixels differ, first at ({x}, {y})")]
pub struct VerifyError {
    pub mismatches: usize,
    pub x: usize,
    pub y: usize,
}

/// Candidate windows for pen assignment: pairs of sample coordinates on
/// the horizontal and vertical axes through and around the pixel. One
/// step touching the centre, two steps offset by one, three steps offset
/// by two.
const WINDOWS: [[(i32, i32); 2]; 12] = [
    [(-1, 0), (0, 0)],
    [(0, 0), (1, 0)],
    [(0, -1), (0, 0)],
    [(0, 0), (0, 1)],
    [(-2, 0), (-1, 0)],
    [(1, 0), (2, 0)],
    [(0, -2), (0, -1)],
    [(0, 1), (0, 2)],
    [(-3, 0), (-2, 0)],
    [(2, 0), (3, 0)],
    [(0, -3), (0, -2)],
    [(0, 2), (0, 3)],
];

/// Compiles one EGA raster into a picture stream.
pub struct Vectorizer<'a> {
    source: &'a IndexedRaster,
    palette: Palette,
    indexed: IndexedRaster,
    map: AreaMap,
    owners: Vec<AreaId>,
}

impl<'a> Vectorizer<'a> {
    /// Build the palette, assign pens and scan areas.
    pub fn new(source: &'a IndexedRaster) -> Result<Self, Error> {
        let palette = build_palette(source);
        let indexed = assign_pens(source, &palette)?;
        let map = build_areas(&indexed);
        let owners = build_owner_grid(&map, source.width(), source.height());
        info!(
            pens = palette.len(),
            areas = map.areas.len(),
            "scanned image"
        );
        Ok(Self {
            source,
            palette,
            indexed,
            map,
            owners,
        })
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// The pen-index raster produced by assignment. Exposed for tests.
    #[inline]
    pub fn pen_image(&self) -> &IndexedRaster {
        &self.indexed
    }

    /// Run the planning passes and emit the opcode stream.
    pub fn encode(mut self) -> Result<Vec<u8>, Error> {
        self.absorb_single_pixels();
        let sorted = self.sorted_ids();
        self.group_pixel_areas(&sorted);
        self.plan_lines(&sorted);
        self.plan_fills(&sorted)?;
        let bytes = self.emit(&sorted)?;
        info!(bytes = bytes.len(), "encoded picture");
        Ok(bytes)
    }

    /// Live area ids, stable-sorted by colour.
    fn sorted_ids(&self) -> Vec<AreaId> {
        let mut ids = self.map.live_ids();
        ids.sort_by_key(|id| self.map.areas[id].color);
        ids
    }

    /// Merge lone pixels into a 4-neighbour whose pen shows the same
    /// EGA colour at that coordinate.
    fn absorb_single_pixels(&mut self) {
        let width = self.source.width();
        let height = self.source.height();
        let mut absorbed = 0usize;

        for id in self.map.live_ids() {
            let Some(area) = self.map.areas.get(&id) else { continue };
            if !area.is_single_pixel() {
                continue;
            }
            let run = area.runs[0];
            let (x, y) = (run.start as usize, run.row as usize);
            let own_effective = self.palette.get(area.color as usize).effective(x, y);

            let neighbours = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbours {
                if nx >= width || ny >= height {
                    continue;
                }
                let nid = self.owners[ny * width + nx];
                if nid == id {
                    continue;
                }
                let ncolor = self.map.areas[&nid].color;
                if self.palette.get(ncolor as usize).effective(x, y) == own_effective {
                    self.map.areas.remove(&id);
                    self.map
                        .areas
                        .get_mut(&nid)
                        .expect("neighbour area is live")
                        .runs
                        .push(run);
                    self.owners[y * width + x] = nid;
                    absorbed += 1;
                    break;
                }
            }
        }
        debug!(absorbed, "single-pixel absorption");
    }

    /// The first remaining singleton of each colour collects the
    /// coordinates of the rest; they are stamped as zero-size patterns.
    fn group_pixel_areas(&mut self, sorted: &[AreaId]) {
        let mut first_of_color: std::collections::HashMap<u8, AreaId> =
            std::collections::HashMap::new();

        for &id in sorted {
            let Some(area) = self.map.areas.get(&id) else { continue };
            if !area.is_single_pixel() {
                continue;
            }
            let color = area.color;
            let run = area.runs[0];
            let coord = Point::new(run.start as i32, run.row as i32);
            let holder = first_of_color.get(&color).copied();
            match holder {
                None => {
                    first_of_color.insert(color, id);
                    self.map
                        .areas
                        .get_mut(&id)
                        .expect("area is live")
                        .pixels
                        .push(coord);
                }
                Some(holder) => {
                    self.map.areas.remove(&id);
                    self.map
                        .areas
                        .get_mut(&holder)
                        .expect("holder area is live")
                        .pixels
                        .push(coord);
                }
            }
        }
    }

    /// Plan per-area geometry: run lines for pens that dither against
    /// the background, traced contours for everything else.
    fn plan_lines(&mut self, sorted: &[AreaId]) {
        let mut canvas = IndexedRaster::new(self.source.width(), self.source.height());

        for &id in sorted {
            let Some(area) = self.map.areas.get(&id) else { continue };
            if area.is_single_pixel() {
                continue;
            }
            let pen = self.palette.get(area.color as usize);
            if pen.is_background() {
                continue;
            }

            if pen.has_background() {
                // Half the checkerboard is white; a fill would leak
                // through it, so draw every run outright.
                let area = self.map.areas.get_mut(&id).expect("area is live");
                area.lines = area
                    .runs
                    .iter()
                    .map(|run| {
                        vec![
                            Point::new(run.start as i32, run.row as i32),
                            Point::new(run.end() as i32 - 1, run.row as i32),
                        ]
                    })
                    .collect();
                continue;
            }

            let area = self.map.areas.get(&id).expect("area is live");
            let (outlines, closed) = trace_outlines(area, &self.indexed, &mut canvas);
            let simplified = outlines.iter().map(|line| simplify(line)).collect();
            let area = self.map.areas.get_mut(&id).expect("area is live");
            area.lines = simplified;
            area.closed = closed;
        }
    }

    /// Plan flood fills against a simulation of playback.
    ///
    /// The shared canvas mirrors the interpreter framebuffer as areas
    /// are drawn in emission order. For each contoured area, first try
    /// seeding fills without its lines (cheap for convex regions boxed
    /// in by already-drawn neighbours); if a fill escapes, rasterise the
    /// contours first and retry; if it still escapes, the area stays
    /// line-only.
    fn plan_fills(&mut self, sorted: &[AreaId]) -> Result<(), Error> {
        let width = self.source.width();
        let mut canvas = IndexedRaster::filled(width, self.source.height(), BACKGROUND);

        for &id in sorted {
            let owners = &self.owners;
            let Some(area) = self.map.areas.get_mut(&id) else { continue };
            let pen = self.palette.get(area.color as usize);

            for point in &area.pixels {
                let (x, y) = (point.x as usize, point.y as usize);
                canvas.put(x, y, pen.effective(x, y));
            }
            if area.is_single_pixel() {
                continue;
            }
            if pen.is_background() {
                continue;
            }
            if pen.has_background() {
                for run in &area.runs {
                    let y = run.row as usize;
                    for x in run.start as usize..run.end() as usize {
                        canvas.put(x, y, pen.effective(x, y));
                    }
                }
                continue;
            }

            // Try simple fills on a copy without the area's lines.
            let mut attempt = canvas.clone();
            if let Some(seeds) = plan_area_fills(&mut attempt, area, pen, owners, width, id)? {
                area.fills = seeds;
                area.lines.clear();
                canvas = attempt;
                continue;
            }

            // Contours first, then fill what remains open.
            let mut lined = canvas.clone();
            for line in &area.lines {
                for pair in line.windows(2) {
                    lined.line_with(pair[0].x, pair[0].y, pair[1].x, pair[1].y, |x, y| {
                        pen.effective(x as usize, y as usize)
                    });
                }
            }
            let mut attempt = lined.clone();
            match plan_area_fills(&mut attempt, area, pen, owners, width, id)? {
                Some(seeds) => {
                    area.fills = seeds;
                    canvas = attempt;
                }
                None => {
                    // Line-only; keep the contour painting.
                    area.fills.clear();
                    canvas = lined;
                }
            }
        }
        Ok(())
    }

    /// Emit the opcode stream in planning order.
    fn emit(&self, sorted: &[AreaId]) -> Result<Vec<u8>, Error> {
        let mut enc = PicEncoder::new();
        enc.palette(&self.palette);
        enc.solid_circle_pattern(0);

        let mut current_color: Option<u8> = None;
        let mut commands = 0usize;
        for id in sorted {
            let Some(area) = self.map.areas.get(id) else { continue };
            if area.pixels.is_empty() && area.lines.is_empty() && area.fills.is_empty() {
                continue;
            }
            if current_color != Some(area.color) {
                enc.set_visual(area.color);
                current_color = Some(area.color);
            }
            if !area.pixels.is_empty() {
                enc.multi_pattern(&area.pixels).map_err(Error::Encode)?;
                commands += 1;
            }
            for line in &area.lines {
                enc.multi_line(line).map_err(Error::Encode)?;
                commands += 1;
            }
            for fill in &area.fills {
                enc.fill(fill.x, fill.y).map_err(Error::Encode)?;
                commands += 1;
            }
        }
        debug!(commands, "emitted drawing commands");
        Ok(enc.finish())
    }
}

/// Attempt one flood fill per still-open run cell of `area` on the
/// given canvas. Returns the seed list, or `None` when a fill escaped
/// the area (the canvas is then half-painted and must be discarded).
fn plan_area_fills(
    canvas: &mut IndexedRaster,
    area: &PixelArea,
    pen: Pen,
    owners: &[AreaId],
    width: usize,
    id: AreaId,
) -> Result<Option<Vec<Point>>, Error> {
    let mut seeds = Vec::new();
    for run in &area.runs {
        let y = run.row as usize;
        for x in run.start as usize..run.end() as usize {
            if canvas.get(x, y) != BACKGROUND {
                continue;
            }
            let contained = canvas.flood_where_with(
                x,
                y,
                BACKGROUND,
                |px, py| pen.effective(px, py),
                |px, py| owners[py * width + px] == id,
            )
            .map_err(|e| Error::Vectorize(VectorizeError::Raster(e)))?;
            if !contained {
                return Ok(None);
            }
            seeds.push(Point::new(x as i32, y as i32));
        }
    }
    Ok(Some(seeds))
}

/// Pick one pen index per pixel.
fn assign_pens(source: &IndexedRaster, palette: &Palette) -> Result<IndexedRaster, Error> {
    let mut indexed = IndexedRaster::new(source.width(), source.height());
    for y in 0..source.height() {
        for x in 0..source.width() {
            let index = pick_color(source, palette, &indexed, x, y)?;
            indexed.put(x, y, index);
        }
    }
    Ok(indexed)
}

/// Vote over the candidate windows around `(x, y)`.
///
/// Each window orients its two sampled colours into a pen by the parity
/// of its first endpoint, matching the effective-colour rule; a window
/// whose pen is not in the palette falls back to a positional match. A
/// candidate only counts when its pen actually reproduces the source
/// colour at this pixel; anything else could not round-trip. The pens
/// assigned to the left and upper neighbours are favoured with a +2
/// bias, which keeps dither phases locked over uniform regions. Highest
/// count wins, ties to the smallest pen index.
fn pick_color(
    source: &IndexedRaster,
    palette: &Palette,
    assigned: &IndexedRaster,
    x: usize,
    y: usize,
) -> Result<u8, Error> {
    let target = source.get(x, y);
    let mut votes: Vec<(u8, u32)> = Vec::with_capacity(8);

    let mut vote = |index: usize, weight: u32, votes: &mut Vec<(u8, u32)>| {
        if palette.get(index).effective(x, y) != target {
            return;
        }
        let index = index as u8;
        match votes.iter_mut().find(|(i, _)| *i == index) {
            Some((_, count)) => *count += weight,
            None => votes.push((index, weight)),
        }
    };

    for window in WINDOWS {
        let x0 = x as i32 + window[0].0;
        let y0 = y as i32 + window[0].1;
        let x1 = x as i32 + window[1].0;
        let y1 = y as i32 + window[1].1;
        if !source.contains(x0, y0) || !source.contains(x1, y1) {
            continue;
        }
        let c0 = source.get(x0 as usize, y0 as usize);
        let c1 = source.get(x1 as usize, y1 as usize);
        let pen = if (x0 + y0) % 2 == 1 {
            Pen::new(c0, c1)
        } else {
            Pen::new(c1, c0)
        };
        let found = palette
            .index(pen)
            .or_else(|| palette.match_at(x, y, target));
        if let Some(index) = found {
            vote(index, 1, &mut votes);
        }
    }

    if x > 0 {
        vote(assigned.get(x - 1, y) as usize, 2, &mut votes);
    }
    if y > 0 {
        vote(assigned.get(x, y - 1) as usize, 2, &mut votes);
    }

    let winner = votes
        .iter()
        .fold(None::<(u8, u32)>, |best, &(index, count)| match best {
            Some((bi, bc)) if (bc, std::cmp::Reverse(bi)) >= (count, std::cmp::Reverse(index)) => {
                Some((bi, bc))
            }
            _ => Some((index, count)),
        });

    match winner {
        Some((index, _)) => Ok(index),
        None => palette
            .match_at(x, y, target)
            .map(|i| i as u8)
            .ok_or_else(|| {
                Error::Vectorize(VectorizeError::UnmappedPixel {
                    x,
                    y,
                    color: target,
                })
            }),
    }
}

/// Replay `bytes` and compare against the raster the vectorizer saw.
pub fn verify_roundtrip(bytes: &[u8], expected: &IndexedRaster) -> Result<(), Error> {
    let frame = PicInterpreter::new(bytes).run()?;
    let width = expected.width().min(PIC_WIDTH);
    let height = expected.height().min(PIC_HEIGHT);

    let mut mismatches = 0usize;
    let mut first = None;
    for y in 0..height {
        for x in 0..width {
            if frame.get(x, y) != expected.get(x, y) {
                mismatches += 1;
                first.get_or_insert((x, y));
            }
        }
    }

    match first {
        None => Ok(()),
        Some((x, y)) => Err(Error::Verify(VerifyError { mismatches, x, y })),
    }
}
