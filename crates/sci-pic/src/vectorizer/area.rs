//! Connected-area extraction from the pen-index raster.
//!
//! A single top-to-bottom sweep builds maximal 4-connected regions of
//! equal pen index. Areas are keyed by the position of their first run,
//! which never moves, so ids stay stable across merges.

use std::collections::HashMap;

use crate::pic::Point;
use crate::raster::IndexedRaster;

/// Stable area identity: row and start column of the first run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AreaId {
    pub row: u16,
    pub col: u16,
}

/// A horizontal run of equal pen index within one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRun {
    pub row: u16,
    pub start: u16,
    pub len: u16,
}

impl PixelRun {
    /// One past the last column.
    #[inline]
    pub fn end(&self) -> u16 {
        self.start + self.len
    }
}

/// A maximal connected region of one pen index, plus the geometry the
/// planning passes derive from it.
#[derive(Debug, Clone)]
pub struct PixelArea {
    pub id: AreaId,
    pub color: u8,
    pub runs: Vec<PixelRun>,
    /// Contour polylines (or per-run lines for half-background pens).
    pub lines: Vec<Vec<Point>>,
    /// Flood fill seeds, planned against the playback simulation.
    pub fills: Vec<Point>,
    /// Lone pixels stamped as zero-size patterns.
    pub pixels: Vec<Point>,
    /// Tracing produced a closed contour.
    pub closed: bool,
}

impl PixelArea {
    fn new(color: u8, run: PixelRun) -> Self {
        Self {
            id: AreaId {
                row: run.row,
                col: run.start,
            },
            color,
            runs: vec![run],
            lines: Vec::new(),
            fills: Vec::new(),
            pixels: Vec::new(),
            closed: false,
        }
    }

    /// Exactly one run of one pixel.
    pub fn is_single_pixel(&self) -> bool {
        self.runs.len() == 1 && self.runs[0].len == 1
    }

    pub fn pixel_count(&self) -> usize {
        self.runs.iter().map(|run| run.len as usize).sum()
    }

    /// Inclusive bounding box `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (usize, usize, usize, usize) {
        let mut min_x = usize::MAX;
        let mut max_x = 0;
        let mut min_y = usize::MAX;
        let mut max_y = 0;
        for run in &self.runs {
            min_x = min_x.min(run.start as usize);
            max_x = max_x.max(run.end() as usize - 1);
            min_y = min_y.min(run.row as usize);
            max_y = max_y.max(run.row as usize);
        }
        (min_x, min_y, max_x, max_y)
    }
}

/// Live areas keyed by id, plus the stable traversal order (creation
/// order, merged-away ids skipped on iteration).
#[derive(Debug, Default)]
pub struct AreaMap {
    pub areas: HashMap<AreaId, PixelArea>,
    pub order: Vec<AreaId>,
}

impl AreaMap {
    /// Ids of live areas in creation order.
    pub fn live_ids(&self) -> Vec<AreaId> {
        self.order
            .iter()
            .filter(|id| self.areas.contains_key(id))
            .copied()
            .collect()
    }
}

/// Sweep the pen-index raster into areas.
///
/// `column_areas[x]` tracks which area owns pixel `(x, y - 1)`. Each run
/// on the current row either joins the area above it or opens a new one;
/// a run that bridges two distinct areas merges them, the survivor being
/// the one whose first run comes earlier in raster order.
pub fn build_areas(indexed: &IndexedRaster) -> AreaMap {
    let width = indexed.width();
    let mut map = AreaMap::default();
    let mut column_areas: Vec<Option<AreaId>> = vec![None; width];

    for y in 0..indexed.height() {
        let row = indexed.row(y);
        let mut x = 0;
        while x < width {
            let color = row[x];
            let run_start = x;
            let mut current: Option<AreaId> = None;

            while x < width && row[x] == color {
                if y > 0 && indexed.get(x, y - 1) == color {
                    let above = column_areas[x].expect("pixel above must be owned");
                    match current {
                        None => current = Some(above),
                        Some(id) if id != above => {
                            current = Some(merge(&mut map, &mut column_areas, id, above));
                        }
                        _ => {}
                    }
                }
                x += 1;
            }

            let run = PixelRun {
                row: y as u16,
                start: run_start as u16,
                len: (x - run_start) as u16,
            };
            let id = match current {
                Some(id) => {
                    let area = map.areas.get_mut(&id).expect("current area is live");
                    debug_assert_eq!(area.color, color);
                    area.runs.push(run);
                    id
                }
                None => {
                    let area = PixelArea::new(color, run);
                    let id = area.id;
                    map.areas.insert(id, area);
                    map.order.push(id);
                    id
                }
            };
            for owner in column_areas[run_start..x].iter_mut() {
                *owner = Some(id);
            }
        }
    }

    map
}

/// Merge two areas, keeping the id that comes first in raster order,
/// and rewrite every column-owner entry pointing at the absorbed id.
fn merge(
    map: &mut AreaMap,
    column_areas: &mut [Option<AreaId>],
    a: AreaId,
    b: AreaId,
) -> AreaId {
    let (survivor, absorbed) = if a < b { (a, b) } else { (b, a) };

    let defunct = map.areas.remove(&absorbed).expect("absorbed area is live");
    let keeper = map.areas.get_mut(&survivor).expect("survivor area is live");
    debug_assert_eq!(keeper.color, defunct.color);
    keeper.runs.extend(defunct.runs);

    for owner in column_areas.iter_mut() {
        if *owner == Some(absorbed) {
            *owner = Some(survivor);
        }
    }
    survivor
}

/// Per-pixel ownership, rebuilt from the run lists after the sweep.
pub fn build_owner_grid(map: &AreaMap, width: usize, height: usize) -> Vec<AreaId> {
    let mut owners = vec![AreaId { row: 0, col: 0 }; width * height];
    for area in map.areas.values() {
        for run in &area.runs {
            let base = run.row as usize * width;
            for x in run.start as usize..run.end() as usize {
                owners[base + x] = area.id;
            }
        }
    }
    owners
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raster_from_rows(rows: &[&[u8]]) -> IndexedRaster {
        let mut raster = IndexedRaster::new(rows[0].len(), rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                raster.put(x, y, value);
            }
        }
        raster
    }

    #[test]
    fn test_uniform_image_is_one_area() {
        let map = build_areas(&IndexedRaster::filled(6, 4, 1));
        assert_eq!(map.areas.len(), 1);
        let area = map.areas.values().next().unwrap();
        assert_eq!(area.pixel_count(), 24);
        assert_eq!(area.id, AreaId { row: 0, col: 0 });
    }

    #[test]
    fn test_vertical_split() {
        let map = build_areas(&raster_from_rows(&[&[1, 1, 2, 2], &[1, 1, 2, 2]]));
        assert_eq!(map.areas.len(), 2);
        let ids = map.live_ids();
        assert_eq!(ids[0], AreaId { row: 0, col: 0 });
        assert_eq!(ids[1], AreaId { row: 0, col: 2 });
    }

    #[test]
    fn test_u_shape_merges_to_one_area() {
        // Two prongs joined at the bottom: the bridging run must merge
        // them into the earlier area.
        let map = build_areas(&raster_from_rows(&[
            &[1, 2, 1],
            &[1, 2, 1],
            &[1, 1, 1],
        ]));
        assert_eq!(map.areas.len(), 2);
        let one = map
            .areas
            .values()
            .find(|area| area.color == 1)
            .unwrap();
        assert_eq!(one.pixel_count(), 7);
        assert_eq!(one.id, AreaId { row: 0, col: 0 });
    }

    #[test]
    fn test_checkerboard_rows_stay_separate() {
        let map = build_areas(&raster_from_rows(&[&[1, 1, 1], &[2, 2, 2], &[1, 1, 1]]));
        assert_eq!(map.areas.len(), 3);
    }

    #[test]
    fn test_every_pixel_accounted_for() {
        let raster = raster_from_rows(&[
            &[1, 1, 2, 3, 3, 3],
            &[1, 2, 2, 2, 3, 1],
            &[1, 1, 1, 2, 2, 1],
        ]);
        let map = build_areas(&raster);
        let total: usize = map.areas.values().map(|a| a.pixel_count()).sum();
        assert_eq!(total, 18);

        let owners = build_owner_grid(&map, 6, 3);
        for (i, id) in owners.iter().enumerate() {
            let area = &map.areas[id];
            assert_eq!(area.color, raster.get(i % 6, i / 6));
        }
    }

    #[test]
    fn test_single_pixel_detection() {
        let map = build_areas(&raster_from_rows(&[&[1, 2, 1]]));
        let singles = map
            .areas
            .values()
            .filter(|area| area.is_single_pixel())
            .count();
        assert_eq!(singles, 3);
    }

    #[test]
    fn test_bounds() {
        let map = build_areas(&raster_from_rows(&[&[9, 1, 1], &[9, 9, 1]]));
        let nine = map.areas.values().find(|a| a.color == 9).unwrap();
        assert_eq!(nine.bounds(), (0, 0, 1, 1));
    }
}
