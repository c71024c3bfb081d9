//! Occupancy grid, contour and frontier invariants.

mod common;

use std::collections::HashSet;

use anveshak_map::frontier::find_all_contours;
use anveshak_map::{CellFlags, GridCoord, OccupancyGrid, extract_frontiers};
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::{free_block, sense_disc};

fn apply_random_op(grid: &mut OccupancyGrid, rng: &mut StdRng) {
    // Includes coordinates one cell outside the grid.
    let c = GridCoord::new(
        rng.random_range(-1..=grid.width() as i32),
        rng.random_range(-1..=grid.height() as i32),
    );
    match rng.random_range(0..11) {
        0 => grid.set_free_space_at(c),
        1 => grid.set_no_free_space_at(c),
        2 => grid.set_obstacle_at(c),
        3 => grid.set_no_obstacle_at(c),
        4 => grid.set_safe_space_at(c),
        5 => grid.set_known_at_base(c),
        6 => grid.set_no_known_at_base(c),
        7 => grid.set_got_relayed(c),
        8 => grid.set_got_unrelayed(c),
        9 => grid.set_final_topological_map_at(c),
        _ => grid.clear_final_topological_map_at(c),
    }
}

fn assert_counters_consistent(grid: &OccupancyGrid) {
    let cells = grid.cells();
    let free = cells.iter().filter(|f| f.is_free()).count();
    let free_kab = cells
        .iter()
        .filter(|f| f.is_free() && f.contains(CellFlags::KNOWN_AT_BASE))
        .count();
    let relayed = cells
        .iter()
        .filter(|f| {
            f.is_free()
                && f.contains(CellFlags::GOT_RELAYED)
                && !f.contains(CellFlags::KNOWN_AT_BASE)
        })
        .count();

    assert_eq!(grid.cells_marked_as_free(), free);
    assert_eq!(grid.cells_marked_as_free_and_known_at_base(), free_kab);
    assert_eq!(
        grid.cells_marked_as_free_and_relayed_and_not_known_at_base(),
        relayed
    );

    let owned: Vec<GridCoord> = grid
        .free_cells()
        .into_iter()
        .filter(|c| !grid.is_known_at_base(*c) && !grid.is_got_relayed(*c))
        .collect();
    assert_eq!(grid.owned_cells().len(), owned.len());
    assert!(owned.iter().all(|c| grid.owned_cells().contains(c)));
}

#[test]
fn test_flag_exclusivity_under_random_mutations() {
    let mut grid = OccupancyGrid::new(12, 9);
    let mut rng = StdRng::seed_from_u64(0xA11CE);

    for _ in 0..5_000 {
        apply_random_op(&mut grid, &mut rng);
        for flags in grid.cells() {
            assert!(!(flags.is_free() && flags.is_obstacle()));
            assert!(!flags.is_safe() || flags.is_free());
        }
    }
}

#[test]
fn test_counters_track_flags() {
    let mut grid = OccupancyGrid::new(10, 10);
    let mut rng = StdRng::seed_from_u64(42);

    for step in 0..3_000 {
        apply_random_op(&mut grid, &mut rng);
        if step % 50 == 0 {
            assert_counters_consistent(&grid);
        }
    }
    assert_counters_consistent(&grid);

    grid.relay_owned_cells();
    assert!(grid.owned_cells().is_empty());
    assert_counters_consistent(&grid);
}

#[test]
fn test_map_cells_changed_counts_only_discoveries() {
    let mut grid = OccupancyGrid::new(5, 5);
    let c = GridCoord::new(2, 2);

    grid.set_free_space_at(c);
    grid.set_free_space_at(c);
    grid.set_safe_space_at(c);
    assert_eq!(grid.map_cells_changed(), 1);

    // obstacle -> free is not a discovery
    grid.set_obstacle_at(GridCoord::new(0, 0));
    grid.set_free_space_at(GridCoord::new(0, 0));
    assert_eq!(grid.map_cells_changed(), 1);
}

#[test]
fn test_merge_with_self_is_idempotent() {
    let mut grid = OccupancyGrid::new(16, 16);
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..500 {
        apply_random_op(&mut grid, &mut rng);
    }

    let before = grid.clone();
    assert_eq!(grid.merge_grid(&before, false), 0);
    assert_eq!(grid, before);
    assert_eq!(grid.counts(), before.counts());
}

#[test]
fn test_merge_safe_space_priority() {
    let a = GridCoord::new(1, 1);
    let b = GridCoord::new(2, 1);
    let c = GridCoord::new(3, 1);

    let mut mine = OccupancyGrid::new(5, 3);
    mine.set_obstacle_at(a);
    mine.set_safe_space_at(b);
    mine.set_obstacle_at(c);

    let mut theirs = OccupancyGrid::new(5, 3);
    theirs.set_safe_space_at(a);
    theirs.set_obstacle_at(b);
    theirs.set_free_space_at(c);

    let changed = mine.merge_grid(&theirs, false);
    assert_eq!(changed, 2);
    assert!(mine.safe_space_at(a));
    assert!(!mine.obstacle_at(a));
    assert!(mine.safe_space_at(b));
    assert!(mine.free_space_at(c));
    assert!(!mine.safe_space_at(c));
}

#[test]
fn test_merge_with_base_marks_known_at_base() {
    let mut base = OccupancyGrid::new(6, 6);
    let mut agent = free_block(6, 6, 1, 1, 3, 3);
    agent.set_obstacle_at(GridCoord::new(4, 4));

    base.merge_grid(&agent, true);
    assert_eq!(base.cells_marked_as_free(), 9);
    assert_eq!(base.cells_marked_as_free_and_known_at_base(), 9);
    assert!(base.is_known_at_base(GridCoord::new(4, 4)));

    agent.merge_grid(&base, true);
    assert_eq!(agent.cells_marked_as_free_and_known_at_base(), 9);
    assert!(agent.owned_cells().is_empty());
}

#[test]
fn test_contours_are_closed() {
    let mut grid = OccupancyGrid::new(40, 30);
    sense_disc(&mut grid, GridCoord::new(10, 10), 7.0);
    sense_disc(&mut grid, GridCoord::new(28, 18), 5.0);
    for x in 10..30 {
        grid.set_free_space_at(GridCoord::new(x, 25));
    }
    grid.set_free_space_at(GridCoord::new(35, 2));

    let contours = find_all_contours(&grid);
    assert!(contours.len() >= 3);
    for contour in &contours {
        assert!(!contour.is_empty());
        if contour.len() > 1 {
            let first = contour[0];
            let last = contour[contour.len() - 1];
            assert!(first.is_adjacent(&last), "{first} and {last} not adjacent");
        }
        for pair in contour.windows(2) {
            assert!(pair[0].is_adjacent(&pair[1]));
        }
    }
}

#[test]
fn test_convex_frontier_centre_inside() {
    let grid = free_block(20, 20, 5, 5, 12, 10);
    let frontiers = extract_frontiers(&grid);
    assert_eq!(frontiers.len(), 1);

    let frontier = &frontiers[0];
    let centre = frontier.centre();
    assert!(frontier.contains(centre));
    assert!((5..=12).contains(&centre.x));
    assert!((5..=10).contains(&centre.y));
    // 7x5 shoelace + 24/2 + 1
    assert_relative_eq!(frontier.area(), 48.0);
}

#[test]
fn test_hole_and_outer_boundary_have_distinct_ids() {
    let mut grid = free_block(21, 21, 4, 4, 16, 16);
    for y in 9..=11 {
        for x in 9..=11 {
            grid.set_no_free_space_at(GridCoord::new(x, y));
        }
    }

    let frontiers = extract_frontiers(&grid);
    assert_eq!(frontiers.len(), 2);
    let ids: HashSet<_> = frontiers.iter().map(|f| f.id()).collect();
    assert_eq!(ids.len(), 2);
}

#[test]
fn test_out_of_bounds_reads_are_empty() {
    let grid = free_block(4, 4, 0, 0, 3, 3);
    let outside = GridCoord::new(-1, 2);
    assert_eq!(grid.flags_at(outside), CellFlags::EMPTY);
    assert!(!grid.free_space_at(outside));
    assert!(!grid.obstacle_at(outside));
    assert!(grid.borders_unknown(GridCoord::new(0, 0)));
    assert!(!grid.frontier_cell_at(GridCoord::new(0, 0)));
}
