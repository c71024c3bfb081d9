//! Zhang-Suen thinning of free space and skeleton queries.
//!
//! Neighbourhood naming around pixel P1 (y grows downward):
//!
//! ```text
//!   P9 P2 P3
//!   P8 P1 P4
//!   P7 P6 P5
//! ```
//!
//! A pixel is removable when it has 2..=6 set neighbours, exactly one 0→1
//! transition walking P2..P9 and back to P2, and the two cross guards of the
//! current sub-pass are clear. Removals of one sub-pass apply together.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::core::GridCoord;

/// Offsets P2..P9, clockwise from north.
const RING: [(i32, i32); 8] = [
    (0, -1),  // P2 N
    (1, -1),  // P3 NE
    (1, 0),   // P4 E
    (1, 1),   // P5 SE
    (0, 1),   // P6 S
    (-1, 1),  // P7 SW
    (-1, 0),  // P8 W
    (-1, -1), // P9 NW
];

/// Read-only view of a binary mask. Out-of-bounds pixels are unset.
#[derive(Clone, Copy)]
pub struct Mask<'a> {
    pixels: &'a [bool],
    width: usize,
    height: usize,
}

impl<'a> Mask<'a> {
    pub fn new(pixels: &'a [bool], width: usize, height: usize) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        Self {
            pixels,
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && self.pixels[y as usize * self.width + x as usize]
    }

    #[inline]
    pub fn at(&self, coord: GridCoord) -> bool {
        self.get(coord.x, coord.y)
    }

    /// P2..P9 as bits
    #[inline]
    fn ring(&self, x: i32, y: i32) -> [bool; 8] {
        RING.map(|(dx, dy)| self.get(x + dx, y + dy))
    }

    /// Set neighbours of a pixel (B(P1)).
    #[inline]
    pub fn neighbour_count(&self, coord: GridCoord) -> usize {
        self.ring(coord.x, coord.y).iter().filter(|b| **b).count()
    }

    /// 0→1 transitions around a pixel (A(P1)).
    #[inline]
    pub fn transitions(&self, coord: GridCoord) -> usize {
        transitions(&self.ring(coord.x, coord.y))
    }

    /// Set pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.pixels
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .map(|(idx, _)| GridCoord::new((idx % self.width) as i32, (idx / self.width) as i32))
    }
}

#[inline]
fn transitions(ring: &[bool; 8]) -> usize {
    (0..8).filter(|&i| !ring[i] && ring[(i + 1) % 8]).count()
}

/// Thin `mask` to a one-pixel-wide skeleton.
///
/// Stops when a full iteration removes nothing or after `max_iterations`.
pub fn skeletonize(mask: &[bool], width: usize, height: usize, max_iterations: usize) -> Vec<bool> {
    let mut current = mask.to_vec();
    let mut removals = Vec::new();
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;
        let mut removed = 0;

        for sub_pass in 0..2 {
            removals.clear();
            let view = Mask::new(&current, width, height);

            for y in 0..height as i32 {
                for x in 0..width as i32 {
                    if !view.get(x, y) {
                        continue;
                    }
                    let p = view.ring(x, y);
                    let count = p.iter().filter(|b| **b).count();
                    if !(2..=6).contains(&count) || transitions(&p) != 1 {
                        continue;
                    }
                    // p[0]=P2 N, p[2]=P4 E, p[4]=P6 S, p[6]=P8 W
                    let guards_clear = if sub_pass == 0 {
                        !(p[0] && p[2] && p[4]) && !(p[2] && p[4] && p[6])
                    } else {
                        !(p[0] && p[2] && p[6]) && !(p[0] && p[4] && p[6])
                    };
                    if guards_clear {
                        removals.push(y as usize * width + x as usize);
                    }
                }
            }

            for idx in &removals {
                current[*idx] = false;
            }
            removed += removals.len();
        }

        trace!("[Skeleton] iteration {}: removed {} pixels", iterations, removed);
        if removed == 0 {
            break;
        }
    }

    debug!(
        "[Skeleton] {}x{} thinned in {} iterations, {} pixels remain",
        width,
        height,
        iterations,
        current.iter().filter(|b| **b).count()
    );
    current
}

/// Result of a hop-bounded skeleton search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HopSearch {
    /// Goal reached after this many hops
    Reached(usize),
    /// Every reachable pixel was visited without finding the goal
    Unreachable,
    /// The hop budget ran out first
    BudgetExhausted,
}

/// Breadth-first hop distance between two skeleton pixels.
pub fn skeleton_hop_distance(
    skeleton: Mask<'_>,
    start: GridCoord,
    goal: GridCoord,
    max_hops: usize,
) -> HopSearch {
    if start == goal {
        return HopSearch::Reached(0);
    }
    if !skeleton.at(start) || !skeleton.at(goal) {
        return HopSearch::Unreachable;
    }

    let mut visited = vec![false; skeleton.width * skeleton.height];
    let mut queue = VecDeque::new();
    visited[start.y as usize * skeleton.width + start.x as usize] = true;
    queue.push_back((start, 0usize));

    while let Some((current, hops)) = queue.pop_front() {
        if hops >= max_hops {
            return HopSearch::BudgetExhausted;
        }
        for n in current.neighbors_8() {
            if !skeleton.at(n) {
                continue;
            }
            let idx = n.y as usize * skeleton.width + n.x as usize;
            if visited[idx] {
                continue;
            }
            if n == goal {
                return HopSearch::Reached(hops + 1);
            }
            visited[idx] = true;
            queue.push_back((n, hops + 1));
        }
    }

    HopSearch::Unreachable
}

/// Whether `goal` can be reached along the skeleton within `max_hops`.
///
/// When the budget runs out the answer degrades to `start == goal`.
pub fn skeleton_reachable(
    skeleton: Mask<'_>,
    start: GridCoord,
    goal: GridCoord,
    max_hops: usize,
) -> bool {
    match skeleton_hop_distance(skeleton, start, goal, max_hops) {
        HopSearch::Reached(_) => true,
        HopSearch::Unreachable => false,
        HopSearch::BudgetExhausted => start == goal,
    }
}
