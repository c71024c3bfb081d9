//! Frontier polygon: outline, area and centre.

use std::hash::{DefaultHasher, Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::core::GridCoord;
use crate::grid::OccupancyGrid;

/// Identity of a frontier: the cell its trace started from, plus its centre.
///
/// Trace starts are unique within one extraction, so two frontiers sharing a
/// centre (a region's outer boundary and a hole inside it) still differ. The
/// id carries over between replanning cycles while both cells stay put.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FrontierId {
    pub start: GridCoord,
    pub centre: GridCoord,
}

/// A closed frontier polygon. Immutable after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Frontier {
    outline: Vec<GridCoord>,
    area: f64,
    centre: GridCoord,
}

impl Frontier {
    /// Build a frontier from a traced contour. Returns `None` for an empty outline.
    pub fn new(outline: Vec<GridCoord>) -> Option<Self> {
        if outline.is_empty() {
            return None;
        }
        let area = polygon_area(&outline);
        let centre = polygon_centre(&outline);
        Some(Self {
            outline,
            area,
            centre,
        })
    }

    #[inline]
    pub fn id(&self) -> FrontierId {
        FrontierId {
            start: self.outline[0],
            centre: self.centre,
        }
    }

    #[inline]
    pub fn centre(&self) -> GridCoord {
        self.centre
    }

    /// Shoelace area plus the perimeter correction `perimeter / 2 + 1`.
    #[inline]
    pub fn area(&self) -> f64 {
        self.area
    }

    #[inline]
    pub fn polygon_outline(&self) -> &[GridCoord] {
        &self.outline
    }

    /// True if any outline point touches the grid edge or an unknown cell.
    pub fn has_unknown_boundary(&self, grid: &OccupancyGrid) -> bool {
        self.outline.iter().any(|p| grid.borders_unknown(*p))
    }

    /// Closest free outline point to `reference`. Ties go to the earlier point.
    pub fn closest_point(&self, reference: GridCoord, grid: &OccupancyGrid) -> Option<GridCoord> {
        let mut best: Option<(GridCoord, f64)> = None;
        for p in self.outline.iter().filter(|p| grid.free_space_at(**p)) {
            let d = p.distance_squared(&reference);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((*p, d));
            }
        }
        best.map(|(p, _)| p)
    }

    /// Point-in-polygon test that counts the edges and vertices as inside.
    pub fn contains(&self, point: GridCoord) -> bool {
        point_in_polygon(point, &self.outline)
    }
}

fn polygon_area(outline: &[GridCoord]) -> f64 {
    let n = outline.len();
    let mut twice_area = 0.0;
    let mut perimeter = 0.0;
    for i in 0..n {
        let a = outline[i];
        let b = outline[(i + 1) % n];
        twice_area += (a.x as f64) * (b.y as f64) - (b.x as f64) * (a.y as f64);
        perimeter += a.distance(&b);
    }
    twice_area.abs() / 2.0 + perimeter / 2.0 + 1.0
}

/// Centroid if it lies in the polygon, else the vertex mean, else a vertex
/// chosen by an RNG seeded from the outline.
fn polygon_centre(outline: &[GridCoord]) -> GridCoord {
    if outline.len() == 1 {
        return outline[0];
    }

    if let Some(centroid) = polygon_centroid(outline) {
        if point_in_polygon(centroid, outline) {
            return centroid;
        }
    }

    let mean = vertex_mean(outline);
    if point_in_polygon(mean, outline) {
        return mean;
    }

    let mut rng = StdRng::seed_from_u64(outline_seed(outline));
    outline[rng.random_range(0..outline.len())]
}

fn polygon_centroid(outline: &[GridCoord]) -> Option<GridCoord> {
    let n = outline.len();
    let mut twice_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let (ax, ay) = (outline[i].x as f64, outline[i].y as f64);
        let (bx, by) = (outline[(i + 1) % n].x as f64, outline[(i + 1) % n].y as f64);
        let cross = ax * by - bx * ay;
        twice_area += cross;
        cx += (ax + bx) * cross;
        cy += (ay + by) * cross;
    }

    if twice_area.abs() < 1e-9 {
        return None;
    }
    let six_area = 3.0 * twice_area;
    Some(GridCoord::new(
        (cx / six_area).round() as i32,
        (cy / six_area).round() as i32,
    ))
}

fn vertex_mean(outline: &[GridCoord]) -> GridCoord {
    let n = outline.len() as f64;
    let sx: f64 = outline.iter().map(|p| p.x as f64).sum();
    let sy: f64 = outline.iter().map(|p| p.y as f64).sum();
    GridCoord::new((sx / n).round() as i32, (sy / n).round() as i32)
}

fn outline_seed(outline: &[GridCoord]) -> u64 {
    // DefaultHasher::new() uses fixed keys, so equal outlines pick the same vertex
    let mut hasher = DefaultHasher::new();
    outline.hash(&mut hasher);
    hasher.finish()
}

fn on_segment(p: GridCoord, a: GridCoord, b: GridCoord) -> bool {
    let cross = (b.x - a.x) as i64 * (p.y - a.y) as i64 - (b.y - a.y) as i64 * (p.x - a.x) as i64;
    cross == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Even-odd ray casting with edges and vertices counted as inside.
fn point_in_polygon(point: GridCoord, outline: &[GridCoord]) -> bool {
    let n = outline.len();
    if n == 0 {
        return false;
    }
    if n == 1 {
        return point == outline[0];
    }

    for i in 0..n {
        if on_segment(point, outline[i], outline[(i + 1) % n]) {
            return true;
        }
    }

    let (px, py) = (point.x as f64, point.y as f64);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (outline[i].x as f64, outline[i].y as f64);
        let (xj, yj) = (outline[j].x as f64, outline[j].y as f64);
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_outline(min: i32, max: i32) -> Vec<GridCoord> {
        let mut outline = Vec::new();
        for x in min..=max {
            outline.push(GridCoord::new(x, min));
        }
        for y in min + 1..=max {
            outline.push(GridCoord::new(max, y));
        }
        for x in (min..max).rev() {
            outline.push(GridCoord::new(x, max));
        }
        for y in (min + 1..max).rev() {
            outline.push(GridCoord::new(min, y));
        }
        outline
    }

    #[test]
    fn test_square_area_and_centre() {
        let frontier = Frontier::new(square_outline(0, 4)).unwrap();
        // 16 (shoelace) + 16 / 2 (perimeter) + 1
        assert_relative_eq!(frontier.area(), 25.0, epsilon = 1e-9);
        assert_eq!(frontier.centre(), GridCoord::new(2, 2));
        assert!(frontier.contains(frontier.centre()));
    }

    #[test]
    fn test_single_point_frontier() {
        let p = GridCoord::new(3, 7);
        let frontier = Frontier::new(vec![p]).unwrap();
        assert_relative_eq!(frontier.area(), 1.0);
        assert_eq!(frontier.centre(), p);
        assert_eq!(
            frontier.id(),
            FrontierId {
                start: p,
                centre: p
            }
        );
    }

    #[test]
    fn test_degenerate_outline_centre_is_vertex_or_on_edge() {
        let outline = vec![
            GridCoord::new(2, 0),
            GridCoord::new(2, 1),
            GridCoord::new(2, 2),
            GridCoord::new(1, 2),
            GridCoord::new(0, 2),
            GridCoord::new(1, 2),
            GridCoord::new(2, 1),
        ];
        let a = Frontier::new(outline.clone()).unwrap();
        let b = Frontier::new(outline.clone()).unwrap();

        assert!(outline.contains(&a.centre()) || a.contains(a.centre()));
        assert_eq!(a.centre(), b.centre());
    }

    #[test]
    fn test_empty_outline_rejected() {
        assert!(Frontier::new(Vec::new()).is_none());
    }

    #[test]
    fn test_point_in_polygon_edges_count() {
        let outline = square_outline(0, 4);
        assert!(point_in_polygon(GridCoord::new(0, 2), &outline));
        assert!(point_in_polygon(GridCoord::new(3, 1), &outline));
        assert!(!point_in_polygon(GridCoord::new(5, 2), &outline));
    }
}
