//! Palette construction from a quantised EGA image.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::{Palette, Pen};
use crate::raster::IndexedRaster;

/// The SCI palette holds four banks of forty pens.
pub const MAX_PENS: usize = 160;

/// Mine dither pens from an EGA raster and rank them by frequency.
///
/// Every horizontal pixel pair votes. A pair `(a, b)` with `a != b` is
/// only treated as a dither pen when the run continues (`a` again two
/// pixels over) so that isolated colour edges stay solid; the pen is
/// phase-oriented by the parity of `x + y` to line up with
/// [`Pen::effective`]. Everything else votes for the solid pen `(a, a)`.
///
/// Pens are ordered by descending count, ties by first sighting, and the
/// list is truncated to [`MAX_PENS`]. Truncation logs how many EGA
/// component colours only occurred in the dropped tail; that count is the
/// user-visible "too colourful" diagnostic.
pub fn build_palette(image: &IndexedRaster) -> Palette {
    let width = image.width();
    let mut counts: Vec<(Pen, usize)> = Vec::new();
    let mut slots: HashMap<Pen, usize> = HashMap::new();

    for y in 0..image.height() {
        let row = image.row(y);
        for x in 0..width.saturating_sub(1) {
            let a = row[x];
            let b = row[x + 1];

            let mut pen = Pen::solid(a);
            if a != b && x + 2 < width && row[x + 2] == a {
                pen = if (x + y) % 2 == 1 {
                    Pen::new(a, b)
                } else {
                    Pen::new(b, a)
                };
            }

            match slots.get(&pen) {
                Some(&slot) => counts[slot].1 += 1,
                None => {
                    slots.insert(pen, counts.len());
                    counts.push((pen, 1));
                }
            }
        }
    }

    counts.sort_by(|left, right| right.1.cmp(&left.1));

    if counts.len() > MAX_PENS {
        let omitted = omitted_components(&counts);
        warn!(
            pens = counts.len(),
            omitted_colors = omitted,
            "image too colourful, truncating palette to {MAX_PENS} pens"
        );
        counts.truncate(MAX_PENS);
    }

    debug!(pens = counts.len(), "palette built");
    Palette::new(counts.into_iter().map(|(pen, _)| pen).collect())
}

/// EGA colours that appear as a pen component only beyond the cut.
fn omitted_components(counts: &[(Pen, usize)]) -> usize {
    let head = &counts[..MAX_PENS];
    let tail = &counts[MAX_PENS..];

    let head_first: HashSet<u8> = head.iter().map(|(pen, _)| pen.first).collect();
    let head_second: HashSet<u8> = head.iter().map(|(pen, _)| pen.second).collect();

    let mut missing = HashSet::new();
    for (pen, _) in tail {
        if !head_first.contains(&pen.first) {
            missing.insert(pen.first);
        }
        if !head_second.contains(&pen.second) {
            missing.insert(pen.second);
        }
    }
    missing.len()
}
