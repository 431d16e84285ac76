//! Contour tracing and polyline simplification.
//!
//! An area's boundary cells are stamped onto a work canvas, then walked
//! into polylines by an 8-neighbour crawler that prefers to keep its
//! current direction. The resulting chains are thinned by dropping
//! collinear points along cardinal axes and unit diagonals, which keeps
//! the Bresenham rasterisation of the simplified polyline pixel-exact.

use crate::pic::Point;
use crate::raster::IndexedRaster;

use super::area::PixelArea;

/// Probe order for the crawler when it cannot continue straight ahead.
const PROBES: [(i32, i32); 8] = [
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
];

/// The start cell is consumed on the first step and restored a little
/// later so the walk can close back onto it. Restoring too early would
/// let a 2-cell contour bounce straight back; step 3 is the earliest
/// safe point. Kept as a named seam; see DESIGN.md.
fn reopen_start_after(steps: usize) -> bool {
    steps == 3
}

/// Trace the boundary of `area` into polylines.
///
/// `indexed` is the pen-index raster the area was scanned from;
/// `canvas` is a scratch raster of the same size, clobbered here.
pub fn trace_outlines(
    area: &PixelArea,
    indexed: &IndexedRaster,
    canvas: &mut IndexedRaster,
) -> (Vec<Vec<Point>>, bool) {
    let color = area.color;
    let guard = color.wrapping_add(1);
    canvas.clear(guard);

    let mut runs = area.runs.clone();
    runs.sort_by_key(|run| (run.row, run.start));

    // Stamp boundary cells: run endpoints always, interior cells only
    // when the pixel above or below belongs to another area.
    let height = indexed.height();
    for run in &runs {
        let y = run.row as usize;
        let start = run.start as usize;
        let end = run.end() as usize;
        canvas.put(start, y, color);
        canvas.put(end - 1, y, color);
        for x in start + 1..end.saturating_sub(1) {
            let open_above = y == 0 || indexed.get(x, y - 1) != color;
            let open_below = y + 1 >= height || indexed.get(x, y + 1) != color;
            if open_above || open_below {
                canvas.put(x, y, color);
            }
        }
    }

    let (min_x, min_y, max_x, max_y) = area.bounds();
    let mut lines = Vec::new();
    let mut closed = false;

    while let Some((sx, sy)) = find_start(canvas, color, min_x, min_y, max_x, max_y) {
        let mut line: Vec<Point> = Vec::new();
        let (mut cx, mut cy) = (sx, sy);
        let mut dir = (0i32, 1i32);
        let mut steps = 0usize;

        loop {
            line.push(Point::new(cx as i32, cy as i32));
            canvas.put(cx, cy, guard);
            steps += 1;
            if reopen_start_after(steps) {
                canvas.put(sx, sy, color);
            }

            match step_from(canvas, color, cx, cy, dir) {
                Some((nx, ny, ndir)) => {
                    if (nx, ny) == (sx, sy) {
                        line.push(Point::new(sx as i32, sy as i32));
                        canvas.put(sx, sy, guard);
                        closed = true;
                        lines.push(line);
                        break;
                    }
                    cx = nx;
                    cy = ny;
                    dir = ndir;
                }
                None => {
                    if (cx, cy) == (sx, sy) && line.len() == 1 {
                        // A lone boundary cell still has to be drawn.
                        line.push(Point::new(cx as i32, cy as i32));
                    }
                    if line.len() >= 2 {
                        lines.push(line);
                    }
                    break;
                }
            }
        }
    }

    (lines, closed)
}

/// First remaining boundary cell in raster order within the bounding box.
fn find_start(
    canvas: &IndexedRaster,
    color: u8,
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
) -> Option<(usize, usize)> {
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if canvas.get(x, y) == color {
                return Some((x, y));
            }
        }
    }
    None
}

/// Pick the next cell: straight ahead if possible, otherwise the first
/// boundary cell in the fixed probe order.
fn step_from(
    canvas: &IndexedRaster,
    color: u8,
    x: usize,
    y: usize,
    dir: (i32, i32),
) -> Option<(usize, usize, (i32, i32))> {
    let ahead = (x as i32 + dir.0, y as i32 + dir.1);
    if canvas.contains(ahead.0, ahead.1) && canvas.get(ahead.0 as usize, ahead.1 as usize) == color
    {
        return Some((ahead.0 as usize, ahead.1 as usize, dir));
    }
    for probe in PROBES {
        let (nx, ny) = (x as i32 + probe.0, y as i32 + probe.1);
        if canvas.contains(nx, ny) && canvas.get(nx as usize, ny as usize) == color {
            return Some((nx as usize, ny as usize, probe));
        }
    }
    None
}

/// Drop points that continue a straight cardinal or unit-diagonal
/// segment. First and last points are always kept.
pub fn simplify(points: &[Point]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut kept = vec![points[0]];
    let mut candidate = points[1];
    for &next in &points[2..] {
        let prev = *kept.last().expect("kept is never empty");
        if drops_candidate(prev, candidate, next) {
            candidate = next;
        } else {
            kept.push(candidate);
            candidate = next;
        }
    }
    kept.push(candidate);
    kept
}

fn drops_candidate(prev: Point, mid: Point, next: Point) -> bool {
    let (dx1, dy1) = (mid.x - prev.x, mid.y - prev.y);
    let (dx2, dy2) = (next.x - mid.x, next.y - mid.y);

    let cardinal = (dx1 == 0 && dx2 == 0 && dy2 != 0 && dy1.signum() == dy2.signum())
        || (dy1 == 0 && dy2 == 0 && dx2 != 0 && dx1.signum() == dx2.signum());

    let diagonal = dx1.abs() == dy1.abs()
        && dx1 != 0
        && dx2.abs() == 1
        && dy2.abs() == 1
        && dx1.signum() == dx2.signum()
        && dy1.signum() == dy2.signum();

    cardinal || diagonal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::area::build_areas;
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

    fn points(pairs: &[(i32, i32)]) -> Vec<Point> {
        pairs.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_simplify_straight_horizontal() {
        let line = points(&[(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(simplify(&line), points(&[(0, 0), (3, 0)]));
    }

    #[test]
    fn test_simplify_keeps_corners() {
        let line = points(&[(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)]);
        assert_eq!(simplify(&line), points(&[(0, 0), (2, 0), (2, 2)]));
    }

    #[test]
    fn test_simplify_diagonal() {
        let line = points(&[(0, 0), (1, 1), (2, 2), (3, 3)]);
        assert_eq!(simplify(&line), points(&[(0, 0), (3, 3)]));
    }

    #[test]
    fn test_simplify_direction_reversal_kept() {
        let line = points(&[(0, 0), (1, 0), (0, 0)]);
        assert_eq!(simplify(&line), points(&[(0, 0), (1, 0), (0, 0)]));
    }

    #[test]
    fn test_simplify_mixed_diagonal_and_cardinal() {
        let line = points(&[(0, 0), (1, 1), (2, 2), (3, 2), (4, 2)]);
        assert_eq!(simplify(&line), points(&[(0, 0), (2, 2), (4, 2)]));
    }

    #[test]
    fn test_trace_rectangle_closes() {
        // 4x4 block of colour 5 inside colour 0.
        let mut rows = vec![vec![0u8; 8]; 6];
        for y in 1..5 {
            for x in 2..6 {
                rows[y][x] = 5;
            }
        }
        let row_refs: Vec<&[u8]> = rows.iter().map(|r| r.as_slice()).collect();
        let indexed = raster_from_rows(&row_refs);
        let map = build_areas(&indexed);
        let area = map.areas.values().find(|a| a.color == 5).unwrap();

        let mut canvas = IndexedRaster::new(8, 6);
        let (lines, closed) = trace_outlines(area, &indexed, &mut canvas);
        assert!(closed);
        assert_eq!(lines.len(), 1);

        // Every boundary cell of the block is visited exactly once,
        // plus the closing repeat of the start.
        let contour = &lines[0];
        assert_eq!(contour.first(), contour.last());
        assert_eq!(contour.len(), 13);
    }

    #[test]
    fn test_trace_single_row_area() {
        let indexed = raster_from_rows(&[&[7, 7, 7, 7, 7]]);
        let map = build_areas(&indexed);
        let area = map.areas.values().next().unwrap();
        let mut canvas = IndexedRaster::new(5, 1);
        let (lines, _closed) = trace_outlines(area, &indexed, &mut canvas);

        // The walk runs right along the row and cannot close; the
        // restored start cell comes out as a degenerate second line.
        let mut cells: Vec<(i32, i32)> = lines
            .iter()
            .flatten()
            .map(|p| (p.x, p.y))
            .collect();
        cells.sort_unstable();
        cells.dedup();
        assert_eq!(cells, vec![(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]);
    }

    #[test]
    fn test_trace_lone_cell_emits_degenerate_line() {
        let indexed = raster_from_rows(&[&[3]]);
        let map = build_areas(&indexed);
        let area = map.areas.values().next().unwrap();
        let mut canvas = IndexedRaster::new(1, 1);
        let (lines, closed) = trace_outlines(area, &indexed, &mut canvas);
        assert!(!closed);
        assert_eq!(lines, vec![points(&[(0, 0), (0, 0)])]);
    }

    #[test]
    fn test_trace_consumes_every_boundary_cell() {
        // L-shaped area.
        let indexed = raster_from_rows(&[
            &[4, 0, 0, 0],
            &[4, 0, 0, 0],
            &[4, 4, 4, 4],
        ]);
        let map = build_areas(&indexed);
        let area = map.areas.values().find(|a| a.color == 4).unwrap();
        let mut canvas = IndexedRaster::new(4, 3);
        let (lines, _) = trace_outlines(area, &indexed, &mut canvas);

        let mut cells: Vec<(i32, i32)> = lines.iter().flatten().map(|p| (p.x, p.y)).collect();
        cells.sort_unstable();
        cells.dedup();
        // The whole L is boundary.
        assert_eq!(
            cells,
            vec![(0, 0), (0, 1), (0, 2), (1, 2), (2, 2), (3, 2)]
        );
    }
}
