//! Occupancy grid with incrementally maintained counters.
//!
//! Every mutation funnels through [`OccupancyGrid::apply`], which diffs the
//! old and new flag set of one cell and adjusts the aggregate counters and
//! the owned-cell set accordingly. Nothing else writes to `cells`.

use std::collections::HashSet;

use log::{debug, warn};

use super::cell::CellFlags;
use crate::core::GridCoord;
use crate::error::{MapError, Result};

/// Snapshot of the grid's aggregate counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridCounts {
    /// Cells with the free flag
    pub free: usize,
    /// Free cells already delivered to the base station
    pub free_and_known_at_base: usize,
    /// Free cells handed to a relay but not yet at the base station
    pub free_and_relayed_not_known_at_base: usize,
    /// Free cells neither at base nor relayed
    pub owned: usize,
}

/// Per-agent belief about the environment plus map-sharing bookkeeping.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    cells: Vec<CellFlags>,
    width: usize,
    height: usize,

    cells_marked_as_free: usize,
    cells_marked_as_free_and_known_at_base: usize,
    cells_marked_as_free_and_relayed_and_not_known_at_base: usize,
    owned_cells: HashSet<GridCoord>,
    map_cells_changed: u64,
}

impl PartialEq for OccupancyGrid {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.cells == other.cells
    }
}

impl OccupancyGrid {
    /// Create an all-unknown grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![CellFlags::EMPTY; width * height],
            width,
            height,
            cells_marked_as_free: 0,
            cells_marked_as_free_and_known_at_base: 0,
            cells_marked_as_free_and_relayed_and_not_known_at_base: 0,
            owned_cells: HashSet::new(),
            map_cells_changed: 0,
        }
    }

    /// Build a grid from raw per-cell flags in row-major order.
    ///
    /// Counters are derived from the flags. Cells that carry both the free
    /// and obstacle flags keep only the obstacle.
    pub fn from_flags(width: usize, height: usize, flags: Vec<CellFlags>) -> Result<Self> {
        if flags.len() != width * height {
            return Err(MapError::DimensionMismatch {
                expected: (width, height),
                actual: (flags.len(), 1),
            });
        }

        let mut grid = Self::new(width, height);
        for (idx, mut f) in flags.into_iter().enumerate() {
            if f.is_obstacle() {
                f.remove(CellFlags::FREE_SPACE | CellFlags::SAFE_SPACE);
            }
            grid.apply(idx, f);
        }
        grid.map_cells_changed = 0;
        Ok(grid)
    }

    // === Geometry ===

    /// Grid width in cells.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check if grid coordinates are within bounds.
    #[inline]
    pub fn location_exists(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    #[inline]
    fn index(&self, coord: GridCoord) -> Option<usize> {
        if self.location_exists(coord) {
            Some(coord.y as usize * self.width + coord.x as usize)
        } else {
            None
        }
    }

    #[inline]
    fn coord_of(&self, idx: usize) -> GridCoord {
        GridCoord::new((idx % self.width) as i32, (idx / self.width) as i32)
    }

    // === Reads ===

    /// Flags at a cell; out-of-bounds cells read as unknown.
    #[inline]
    pub fn flags_at(&self, coord: GridCoord) -> CellFlags {
        self.index(coord)
            .map(|idx| self.cells[idx])
            .unwrap_or(CellFlags::EMPTY)
    }

    /// Raw row-major flag slice
    pub fn cells(&self) -> &[CellFlags] {
        &self.cells
    }

    #[inline]
    pub fn free_space_at(&self, coord: GridCoord) -> bool {
        self.flags_at(coord).is_free()
    }

    #[inline]
    pub fn obstacle_at(&self, coord: GridCoord) -> bool {
        self.flags_at(coord).is_obstacle()
    }

    #[inline]
    pub fn safe_space_at(&self, coord: GridCoord) -> bool {
        self.flags_at(coord).is_safe()
    }

    #[inline]
    pub fn is_known_at_base(&self, coord: GridCoord) -> bool {
        self.flags_at(coord).contains(CellFlags::KNOWN_AT_BASE)
    }

    #[inline]
    pub fn is_got_relayed(&self, coord: GridCoord) -> bool {
        self.flags_at(coord).contains(CellFlags::GOT_RELAYED)
    }

    #[inline]
    pub fn is_final_topological_map(&self, coord: GridCoord) -> bool {
        self.flags_at(coord).contains(CellFlags::FINAL_TOPOLOGICAL_MAP)
    }

    /// Neither free nor obstacle. Out-of-bounds cells are unknown too.
    #[inline]
    pub fn is_unknown(&self, coord: GridCoord) -> bool {
        self.flags_at(coord).is_unknown()
    }

    /// A free cell with at least one in-bounds unknown 4-neighbour.
    pub fn frontier_cell_at(&self, coord: GridCoord) -> bool {
        let flags = self.flags_at(coord);
        if !flags.is_free() || flags.is_obstacle() {
            return false;
        }
        coord
            .neighbors_4()
            .iter()
            .any(|n| self.location_exists(*n) && self.is_unknown(*n))
    }

    /// Any 8-neighbour is outside the grid or unknown.
    pub fn borders_unknown(&self, coord: GridCoord) -> bool {
        coord
            .neighbors_8()
            .iter()
            .any(|n| !self.location_exists(*n) || self.is_unknown(*n))
    }

    /// True if any obstacle lies within `radius` cells (Euclidean) of `coord`.
    pub fn obstacle_within_distance(&self, coord: GridCoord, radius: f64) -> bool {
        if radius < 0.0 {
            return false;
        }
        let r = radius.ceil() as i32;
        let r_sq = radius * radius;
        for dy in -r..=r {
            for dx in -r..=r {
                if (dx * dx + dy * dy) as f64 > r_sq {
                    continue;
                }
                if self.obstacle_at(GridCoord::new(coord.x + dx, coord.y + dy)) {
                    return true;
                }
            }
        }
        false
    }

    // === Counters ===

    pub fn cells_marked_as_free(&self) -> usize {
        self.cells_marked_as_free
    }

    pub fn cells_marked_as_free_and_known_at_base(&self) -> usize {
        self.cells_marked_as_free_and_known_at_base
    }

    pub fn cells_marked_as_free_and_relayed_and_not_known_at_base(&self) -> usize {
        self.cells_marked_as_free_and_relayed_and_not_known_at_base
    }

    /// Number of times an unknown cell became free.
    pub fn map_cells_changed(&self) -> u64 {
        self.map_cells_changed
    }

    /// Free cells neither known at base nor relayed.
    pub fn owned_cells(&self) -> &HashSet<GridCoord> {
        &self.owned_cells
    }

    /// All free cells in row-major order.
    pub fn free_cells(&self) -> Vec<GridCoord> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_free())
            .map(|(idx, _)| self.coord_of(idx))
            .collect()
    }

    /// Counter snapshot
    pub fn counts(&self) -> GridCounts {
        GridCounts {
            free: self.cells_marked_as_free,
            free_and_known_at_base: self.cells_marked_as_free_and_known_at_base,
            free_and_relayed_not_known_at_base: self
                .cells_marked_as_free_and_relayed_and_not_known_at_base,
            owned: self.owned_cells.len(),
        }
    }

    /// Fraction of `total_free` cells this grid knows as free.
    pub fn coverage_of(&self, total_free: usize) -> f64 {
        if total_free == 0 {
            return 1.0;
        }
        self.cells_marked_as_free as f64 / total_free as f64
    }

    // === Mutators ===

    /// Mark free; clears the obstacle flag.
    pub fn set_free_space_at(&mut self, coord: GridCoord) {
        self.modify(coord, "set_free_space_at", |f| {
            f.insert(CellFlags::FREE_SPACE);
            f.remove(CellFlags::OBSTACLE);
        });
    }

    /// Clear free (and therefore safe).
    pub fn set_no_free_space_at(&mut self, coord: GridCoord) {
        self.modify(coord, "set_no_free_space_at", |f| {
            f.remove(CellFlags::FREE_SPACE | CellFlags::SAFE_SPACE);
        });
    }

    /// Mark obstacle; clears free and safe.
    pub fn set_obstacle_at(&mut self, coord: GridCoord) {
        self.modify(coord, "set_obstacle_at", |f| {
            f.insert(CellFlags::OBSTACLE);
            f.remove(CellFlags::FREE_SPACE | CellFlags::SAFE_SPACE);
        });
    }

    pub fn set_no_obstacle_at(&mut self, coord: GridCoord) {
        self.modify(coord, "set_no_obstacle_at", |f| {
            f.remove(CellFlags::OBSTACLE);
        });
    }

    /// Mark safe and free; clears the obstacle flag.
    pub fn set_safe_space_at(&mut self, coord: GridCoord) {
        self.modify(coord, "set_safe_space_at", |f| {
            f.insert(CellFlags::SAFE_SPACE | CellFlags::FREE_SPACE);
            f.remove(CellFlags::OBSTACLE);
        });
    }

    pub fn set_known_at_base(&mut self, coord: GridCoord) {
        self.modify(coord, "set_known_at_base", |f| {
            f.insert(CellFlags::KNOWN_AT_BASE);
        });
    }

    pub fn set_no_known_at_base(&mut self, coord: GridCoord) {
        self.modify(coord, "set_no_known_at_base", |f| {
            f.remove(CellFlags::KNOWN_AT_BASE);
        });
    }

    pub fn set_got_relayed(&mut self, coord: GridCoord) {
        self.modify(coord, "set_got_relayed", |f| {
            f.insert(CellFlags::GOT_RELAYED);
        });
    }

    pub fn set_got_unrelayed(&mut self, coord: GridCoord) {
        self.modify(coord, "set_got_unrelayed", |f| {
            f.remove(CellFlags::GOT_RELAYED);
        });
    }

    pub fn set_final_topological_map_at(&mut self, coord: GridCoord) {
        self.modify(coord, "set_final_topological_map_at", |f| {
            f.insert(CellFlags::FINAL_TOPOLOGICAL_MAP);
        });
    }

    pub fn clear_final_topological_map_at(&mut self, coord: GridCoord) {
        self.modify(coord, "clear_final_topological_map_at", |f| {
            f.remove(CellFlags::FINAL_TOPOLOGICAL_MAP);
        });
    }

    /// Mark every owned cell as relayed. Returns how many were marked.
    pub fn relay_owned_cells(&mut self) -> usize {
        let owned: Vec<GridCoord> = self.owned_cells.iter().copied().collect();
        for coord in &owned {
            self.set_got_relayed(*coord);
        }
        owned.len()
    }

    /// Merge a partner's map into this one. Returns the number of cells changed.
    ///
    /// `with_base_station` is set when either side is the base station: every
    /// cell the partner knows is then marked known-at-base.
    pub fn merge_grid(&mut self, other: &OccupancyGrid, with_base_station: bool) -> usize {
        if self.width != other.width || self.height != other.height {
            warn!(
                "[Grid] merge of {}x{} into {}x{}: merging overlapping window only",
                other.width, other.height, self.width, self.height
            );
        }

        let width = self.width.min(other.width);
        let height = self.height.min(other.height);
        let mut changed = 0;

        for y in 0..height {
            for x in 0..width {
                let idx = y * self.width + x;
                let mine = self.cells[idx];
                let theirs = other.cells[y * other.width + x];
                let partner_knows = !theirs.is_unknown();

                let base_pending = with_base_station
                    && partner_knows
                    && !mine.contains(CellFlags::KNOWN_AT_BASE);
                if mine == theirs && !base_pending {
                    continue;
                }

                let merged = Self::merge_cell(mine, theirs, with_base_station);
                if merged != mine {
                    self.apply(idx, merged);
                    changed += 1;
                }
            }
        }

        debug!(
            "[Grid] merge_grid: {} cells changed (with_base_station={})",
            changed, with_base_station
        );
        changed
    }

    /// Priority policy for one cell. Relay and topology bits stay local.
    fn merge_cell(mine: CellFlags, theirs: CellFlags, with_base_station: bool) -> CellFlags {
        let mut merged = mine;

        if theirs.is_safe() {
            merged.insert(CellFlags::SAFE_SPACE | CellFlags::FREE_SPACE);
            merged.remove(CellFlags::OBSTACLE);
        } else if mine.is_safe() {
            // safe space is never overwritten
        } else if theirs.is_free() {
            merged.insert(CellFlags::FREE_SPACE);
            merged.remove(CellFlags::OBSTACLE);
        } else if theirs.is_obstacle() && mine.is_unknown() {
            merged.insert(CellFlags::OBSTACLE);
        }

        if theirs.contains(CellFlags::KNOWN_AT_BASE) || (with_base_station && !theirs.is_unknown())
        {
            merged.insert(CellFlags::KNOWN_AT_BASE);
        }

        merged
    }

    // === Internals ===

    fn modify(&mut self, coord: GridCoord, op: &str, f: impl FnOnce(&mut CellFlags)) {
        let Some(idx) = self.index(coord) else {
            debug!(
                "[Grid] {} ignored: {} outside {}x{} grid",
                op, coord, self.width, self.height
            );
            return;
        };
        let mut flags = self.cells[idx];
        f(&mut flags);
        self.apply(idx, flags);
    }

    /// Single write path: swap in `new` and move every counter the change touches.
    fn apply(&mut self, idx: usize, new: CellFlags) {
        let old = self.cells[idx];
        if old == new {
            return;
        }

        if old.is_unknown() && new.is_free() {
            self.map_cells_changed += 1;
        }

        let (old_free, old_kab, old_relayed) = Self::counter_terms(old);
        let (new_free, new_kab, new_relayed) = Self::counter_terms(new);

        self.cells_marked_as_free = Self::shift(self.cells_marked_as_free, old_free, new_free);
        self.cells_marked_as_free_and_known_at_base =
            Self::shift(self.cells_marked_as_free_and_known_at_base, old_kab, new_kab);
        self.cells_marked_as_free_and_relayed_and_not_known_at_base = Self::shift(
            self.cells_marked_as_free_and_relayed_and_not_known_at_base,
            old_relayed,
            new_relayed,
        );

        match (old.is_owned(), new.is_owned()) {
            (false, true) => {
                let coord = self.coord_of(idx);
                self.owned_cells.insert(coord);
            }
            (true, false) => {
                let coord = self.coord_of(idx);
                self.owned_cells.remove(&coord);
            }
            _ => {}
        }

        self.cells[idx] = new;
    }

    #[inline]
    fn counter_terms(flags: CellFlags) -> (bool, bool, bool) {
        let free = flags.is_free();
        let kab = flags.contains(CellFlags::KNOWN_AT_BASE);
        let relayed = flags.contains(CellFlags::GOT_RELAYED);
        (free, free && kab, free && relayed && !kab)
    }

    #[inline]
    fn shift(counter: usize, before: bool, after: bool) -> usize {
        match (before, after) {
            (false, true) => counter + 1,
            (true, false) => counter.saturating_sub(1),
            _ => counter,
        }
    }
}

impl std::fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(self.width.max(1)) {
            let line: String = row.iter().map(|c| c.as_char()).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recount(grid: &OccupancyGrid) -> GridCounts {
        let mut counts = GridCounts::default();
        for flags in grid.cells() {
            let (free, kab, relayed) = OccupancyGrid::counter_terms(*flags);
            counts.free += free as usize;
            counts.free_and_known_at_base += kab as usize;
            counts.free_and_relayed_not_known_at_base += relayed as usize;
            counts.owned += flags.is_owned() as usize;
        }
        counts
    }

    #[test]
    fn test_exclusivity() {
        let mut grid = OccupancyGrid::new(4, 4);
        let c = GridCoord::new(1, 1);

        grid.set_safe_space_at(c);
        assert!(grid.free_space_at(c) && grid.safe_space_at(c));

        grid.set_obstacle_at(c);
        assert!(grid.obstacle_at(c));
        assert!(!grid.free_space_at(c));
        assert!(!grid.safe_space_at(c));

        grid.set_free_space_at(c);
        assert!(grid.free_space_at(c));
        assert!(!grid.obstacle_at(c));
    }

    #[test]
    fn test_counters_follow_flags() {
        let mut grid = OccupancyGrid::new(5, 5);
        let a = GridCoord::new(0, 0);
        let b = GridCoord::new(1, 0);
        let c = GridCoord::new(2, 0);

        grid.set_free_space_at(a);
        grid.set_free_space_at(b);
        grid.set_free_space_at(c);
        grid.set_known_at_base(a);
        grid.set_got_relayed(b);
        grid.set_got_relayed(a);
        grid.set_obstacle_at(c);

        assert_eq!(grid.counts(), recount(&grid));
        assert_eq!(grid.cells_marked_as_free(), 2);
        assert_eq!(grid.cells_marked_as_free_and_known_at_base(), 1);
        assert_eq!(grid.cells_marked_as_free_and_relayed_and_not_known_at_base(), 1);
        assert!(grid.owned_cells().is_empty());

        grid.set_got_unrelayed(b);
        assert!(grid.owned_cells().contains(&b));
        assert_eq!(grid.counts(), recount(&grid));
    }

    #[test]
    fn test_map_cells_changed_counts_only_unknown_to_free() {
        let mut grid = OccupancyGrid::new(3, 3);
        let c = GridCoord::new(1, 1);

        grid.set_free_space_at(c);
        assert_eq!(grid.map_cells_changed(), 1);
        grid.set_safe_space_at(c);
        assert_eq!(grid.map_cells_changed(), 1);

        grid.set_obstacle_at(GridCoord::new(0, 0));
        grid.set_free_space_at(GridCoord::new(0, 0));
        assert_eq!(grid.map_cells_changed(), 1);
    }

    #[test]
    fn test_out_of_bounds_is_harmless() {
        let mut grid = OccupancyGrid::new(3, 3);
        let outside = GridCoord::new(-1, 7);

        grid.set_free_space_at(outside);
        grid.set_obstacle_at(outside);
        assert!(!grid.free_space_at(outside));
        assert!(!grid.obstacle_at(outside));
        assert!(grid.is_unknown(outside));
        assert_eq!(grid.cells_marked_as_free(), 0);
    }

    #[test]
    fn test_merge_with_self_is_noop() {
        let mut grid = OccupancyGrid::new(6, 6);
        grid.set_safe_space_at(GridCoord::new(1, 1));
        grid.set_free_space_at(GridCoord::new(2, 1));
        grid.set_obstacle_at(GridCoord::new(3, 1));
        grid.set_known_at_base(GridCoord::new(2, 1));

        let copy = grid.clone();
        assert_eq!(grid.merge_grid(&copy, false), 0);
        assert_eq!(grid, copy);
    }

    #[test]
    fn test_merge_safe_space_wins() {
        let c = GridCoord::new(2, 2);
        let mut a = OccupancyGrid::new(5, 5);
        a.set_safe_space_at(c);

        let mut b = OccupancyGrid::new(5, 5);
        b.set_obstacle_at(c);

        a.merge_grid(&b, false);
        assert!(a.free_space_at(c));
        assert!(!a.obstacle_at(c));

        b.merge_grid(&a, false);
        assert!(b.safe_space_at(c));
        assert!(!b.obstacle_at(c));
    }

    #[test]
    fn test_merge_free_beats_obstacle_and_unknown_adopts_obstacle() {
        let mut a = OccupancyGrid::new(4, 1);
        a.set_obstacle_at(GridCoord::new(0, 0));

        let mut b = OccupancyGrid::new(4, 1);
        b.set_free_space_at(GridCoord::new(0, 0));
        b.set_obstacle_at(GridCoord::new(1, 0));

        let changed = a.merge_grid(&b, false);
        assert_eq!(changed, 2);
        assert!(a.free_space_at(GridCoord::new(0, 0)));
        assert!(a.obstacle_at(GridCoord::new(1, 0)));
        assert_eq!(a.counts(), recount(&a));
    }

    #[test]
    fn test_merge_with_base_marks_known() {
        let mut base = OccupancyGrid::new(3, 3);
        let mut agent = OccupancyGrid::new(3, 3);
        agent.set_free_space_at(GridCoord::new(0, 0));
        agent.set_obstacle_at(GridCoord::new(1, 0));

        base.merge_grid(&agent, true);
        assert!(base.is_known_at_base(GridCoord::new(0, 0)));

        agent.merge_grid(&base, true);
        assert!(agent.is_known_at_base(GridCoord::new(0, 0)));
        assert!(agent.owned_cells().is_empty());
        assert_eq!(agent.cells_marked_as_free_and_known_at_base(), 1);

        // Second exchange is a no-op.
        assert_eq!(agent.merge_grid(&base, true), 0);
    }

    #[test]
    fn test_obstacle_within_distance() {
        let mut grid = OccupancyGrid::new(10, 10);
        grid.set_obstacle_at(GridCoord::new(5, 5));

        assert!(grid.obstacle_within_distance(GridCoord::new(5, 7), 2.0));
        assert!(!grid.obstacle_within_distance(GridCoord::new(7, 7), 2.0));
        assert!(grid.obstacle_within_distance(GridCoord::new(7, 7), 3.0));
    }

    #[test]
    fn test_frontier_and_border_predicates() {
        let mut grid = OccupancyGrid::new(3, 3);
        for y in 0..3 {
            for x in 0..2 {
                grid.set_free_space_at(GridCoord::new(x, y));
            }
        }

        assert!(grid.frontier_cell_at(GridCoord::new(1, 1)));
        // Only out-of-bounds neighbours: not a frontier cell, but borders unknown.
        assert!(!grid.frontier_cell_at(GridCoord::new(0, 1)));
        assert!(grid.borders_unknown(GridCoord::new(0, 1)));
    }
}
