//! Region growing from key points.
//!
//! Every key point seeds one node. Undecided free cells are taken from a
//! worklist and adopt the majority node among their assigned 8-neighbours,
//! with ties resolved in N, S, E, W, NE, NW, SE, SW order. Cells with no
//! unknown neighbour are frozen on the grid so the next rebuild keeps their
//! node as long as its key point survives.

use std::collections::VecDeque;

use log::debug;

use super::node::{NodeId, UNEXPLORED_NODE_ID};
use crate::core::GridCoord;
use crate::grid::OccupancyGrid;

const UNASSIGNED: NodeId = NodeId::MAX;

/// Node id per cell plus the key point behind each id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AreaGrid {
    width: usize,
    height: usize,
    ids: Vec<NodeId>,
    key_points: Vec<GridCoord>,
}

impl AreaGrid {
    /// All cells unexplored.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ids: vec![UNEXPLORED_NODE_ID; width * height],
            key_points: Vec::new(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Node of a cell; out-of-bounds cells are unexplored.
    #[inline]
    pub fn node_at(&self, coord: GridCoord) -> NodeId {
        if coord.x < 0
            || coord.y < 0
            || coord.x as usize >= self.width
            || coord.y as usize >= self.height
        {
            return UNEXPLORED_NODE_ID;
        }
        self.ids[coord.y as usize * self.width + coord.x as usize]
    }

    /// Key point of a node id.
    pub fn key_point(&self, id: NodeId) -> Option<GridCoord> {
        if id == UNEXPLORED_NODE_ID {
            return None;
        }
        self.key_points.get(id as usize - 1).copied()
    }

    pub fn key_points(&self) -> &[GridCoord] {
        &self.key_points
    }

    /// Row-major node ids
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// Cells of one node in row-major order.
    pub fn cells_of(&self, id: NodeId) -> impl Iterator<Item = GridCoord> + '_ {
        self.ids
            .iter()
            .enumerate()
            .filter(move |(_, n)| **n == id)
            .map(|(idx, _)| GridCoord::new((idx % self.width) as i32, (idx / self.width) as i32))
    }
}

/// Partition the free cells of `grid` into one region per key point.
///
/// Key point `i` gets node id `i + 1`. Frozen cells from `previous` keep
/// their region when its key point is still present; otherwise they are
/// unfrozen and regrown.
pub fn fill_key_areas(
    grid: &mut OccupancyGrid,
    key_points: &[GridCoord],
    previous: Option<&AreaGrid>,
) -> AreaGrid {
    let (width, height) = (grid.width(), grid.height());
    let idx_of = |c: GridCoord| c.y as usize * width + c.x as usize;

    let mut ids: Vec<NodeId> = grid
        .cells()
        .iter()
        .map(|f| if f.is_free() { UNASSIGNED } else { UNEXPLORED_NODE_ID })
        .collect();

    let mut seeds: Vec<GridCoord> = Vec::new();
    for (i, kp) in key_points.iter().enumerate() {
        if grid.free_space_at(*kp) {
            ids[idx_of(*kp)] = (i + 1) as NodeId;
            seeds.push(*kp);
        }
    }

    let previous = previous.filter(|p| p.width == width && p.height == height);
    let mut reused = 0usize;
    for idx in 0..ids.len() {
        let coord = GridCoord::new((idx % width) as i32, (idx / width) as i32);
        if !grid.is_final_topological_map(coord) {
            continue;
        }
        let surviving = previous
            .and_then(|p| p.key_point(p.ids[idx]))
            .and_then(|kp| key_points.iter().position(|k| *k == kp));
        match surviving {
            Some(pos) if ids[idx] == UNASSIGNED => {
                ids[idx] = (pos + 1) as NodeId;
                seeds.push(coord);
                reused += 1;
            }
            Some(_) => {}
            None => grid.clear_final_topological_map_at(coord),
        }
    }

    let mut queued = vec![false; ids.len()];
    let mut worklist = VecDeque::new();
    for seed in &seeds {
        enqueue_neighbours(*seed, &ids, &mut queued, &mut worklist, width, height);
    }

    while let Some(cell) = worklist.pop_front() {
        let idx = idx_of(cell);
        if ids[idx] != UNASSIGNED {
            continue;
        }
        let Some(id) = majority_neighbour(cell, &ids, width, height) else {
            continue;
        };
        ids[idx] = id;
        enqueue_neighbours(cell, &ids, &mut queued, &mut worklist, width, height);
    }

    let mut frozen = 0usize;
    for idx in 0..ids.len() {
        if ids[idx] == UNASSIGNED {
            ids[idx] = UNEXPLORED_NODE_ID;
            continue;
        }
        if ids[idx] == UNEXPLORED_NODE_ID {
            continue;
        }
        let coord = GridCoord::new((idx % width) as i32, (idx / width) as i32);
        let settled = coord
            .neighbors_8()
            .iter()
            .all(|n| !grid.location_exists(*n) || !grid.is_unknown(*n));
        if settled && !grid.is_final_topological_map(coord) {
            grid.set_final_topological_map_at(coord);
            frozen += 1;
        }
    }

    debug!(
        "[Areas] {} key points, {} frozen cells reused, {} newly frozen",
        key_points.len(),
        reused,
        frozen
    );

    AreaGrid {
        width,
        height,
        ids,
        key_points: key_points.to_vec(),
    }
}

fn enqueue_neighbours(
    cell: GridCoord,
    ids: &[NodeId],
    queued: &mut [bool],
    worklist: &mut VecDeque<GridCoord>,
    width: usize,
    height: usize,
) {
    for n in cell.neighbors_8() {
        if n.x < 0 || n.y < 0 || n.x as usize >= width || n.y as usize >= height {
            continue;
        }
        let idx = n.y as usize * width + n.x as usize;
        if ids[idx] == UNASSIGNED && !queued[idx] {
            queued[idx] = true;
            worklist.push_back(n);
        }
    }
}

/// Most frequent assigned id among the 8 neighbours, first in precedence order on ties.
fn majority_neighbour(
    cell: GridCoord,
    ids: &[NodeId],
    width: usize,
    height: usize,
) -> Option<NodeId> {
    let mut votes: [(NodeId, usize); 8] = [(UNEXPLORED_NODE_ID, 0); 8];
    let mut distinct = 0;

    for n in cell.neighbors_8() {
        if n.x < 0 || n.y < 0 || n.x as usize >= width || n.y as usize >= height {
            continue;
        }
        let id = ids[n.y as usize * width + n.x as usize];
        if id == UNASSIGNED || id == UNEXPLORED_NODE_ID {
            continue;
        }
        match votes[..distinct].iter_mut().find(|(v, _)| *v == id) {
            Some(entry) => entry.1 += 1,
            None => {
                votes[distinct] = (id, 1);
                distinct += 1;
            }
        }
    }

    // votes are in precedence order; ties keep the earlier id
    votes[..distinct]
        .iter()
        .fold(None, |best: Option<(NodeId, usize)>, &(id, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((id, count)),
        })
        .map(|(id, _)| id)
}
