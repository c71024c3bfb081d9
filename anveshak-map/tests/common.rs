//! Test utilities for anveshak-map.
//!
//! Grid builders and small mask helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use anveshak_map::{GridCoord, OccupancyGrid};

/// Grid with every cell free.
pub fn open_world(width: usize, height: usize) -> OccupancyGrid {
    let mut grid = OccupancyGrid::new(width, height);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            grid.set_free_space_at(GridCoord::new(x, y));
        }
    }
    grid
}

/// Free rectangle `[x0, x1] x [y0, y1]` in an otherwise unknown grid.
pub fn free_block(
    width: usize,
    height: usize,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
) -> OccupancyGrid {
    let mut grid = OccupancyGrid::new(width, height);
    for y in y0..=y1 {
        for x in x0..=x1 {
            grid.set_free_space_at(GridCoord::new(x, y));
        }
    }
    grid
}

/// Mark every in-bounds cell within `radius` of `centre` free.
pub fn sense_disc(grid: &mut OccupancyGrid, centre: GridCoord, radius: f64) {
    let r = radius.ceil() as i32;
    for dy in -r..=r {
        for dx in -r..=r {
            let c = GridCoord::new(centre.x + dx, centre.y + dy);
            if grid.location_exists(c) && c.distance(&centre) <= radius {
                grid.set_free_space_at(c);
            }
        }
    }
}

/// Row-major boolean mask of a rectangle, optionally with a rectangular hole.
pub fn rect_mask(
    width: usize,
    height: usize,
    outer: (i32, i32, i32, i32),
    hole: Option<(i32, i32, i32, i32)>,
) -> Vec<bool> {
    let inside = |x: i32, y: i32, (x0, y0, x1, y1): (i32, i32, i32, i32)| {
        x >= x0 && x <= x1 && y >= y0 && y <= y1
    };
    let mut mask = vec![false; width * height];
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let in_hole = hole.is_some_and(|h| inside(x, y, h));
            mask[y as usize * width + x as usize] = inside(x, y, outer) && !in_hole;
        }
    }
    mask
}

/// Number of 8-connected components of set pixels.
pub fn components(mask: &[bool], width: usize, height: usize) -> usize {
    let mut seen = vec![false; mask.len()];
    let mut count = 0;
    for start in 0..mask.len() {
        if !mask[start] || seen[start] {
            continue;
        }
        count += 1;
        seen[start] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(idx) = queue.pop_front() {
            let c = GridCoord::new((idx % width) as i32, (idx / width) as i32);
            for n in c.neighbors_8() {
                if n.x < 0 || n.y < 0 || n.x >= width as i32 || n.y >= height as i32 {
                    continue;
                }
                let ni = n.y as usize * width + n.x as usize;
                if mask[ni] && !seen[ni] {
                    seen[ni] = true;
                    queue.push_back(ni);
                }
            }
        }
    }
    count
}

/// 4-connected flood over unset pixels; true if it reaches the mask border.
pub fn background_escapes(mask: &[bool], width: usize, height: usize, from: GridCoord) -> bool {
    let mut seen = vec![false; mask.len()];
    let mut queue = VecDeque::from([from]);
    seen[from.y as usize * width + from.x as usize] = true;
    while let Some(c) = queue.pop_front() {
        if c.x == 0 || c.y == 0 || c.x == width as i32 - 1 || c.y == height as i32 - 1 {
            return true;
        }
        for n in c.neighbors_4() {
            let ni = n.y as usize * width + n.x as usize;
            if !mask[ni] && !seen[ni] {
                seen[ni] = true;
                queue.push_back(n);
            }
        }
    }
    false
}
