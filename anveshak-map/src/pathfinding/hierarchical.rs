//! Hierarchical planning over topological nodes.
//!
//! Start and goal are located in their regions, a Dijkstra search over the
//! node graph (edge weight = cached path length) picks the node sequence,
//! and the grid legs start → first key point and last key point → goal are
//! stitched around the cached inter-node paths. Any failure falls back to a
//! direct A* search.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use log::{debug, error, trace};

use super::astar::{AStarConfig, AStarPlanner, DEFAULT_ABILITY};
use super::path::Path;
use crate::core::GridCoord;
use crate::grid::OccupancyGrid;
use crate::topology::{NodeId, TopologicalMap, UNEXPLORED_NODE_ID};

#[derive(Clone, Copy, Debug)]
struct NodeEntry {
    id: NodeId,
    cost: f64,
}

impl Eq for NodeEntry {}

impl PartialEq for NodeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Ord for NodeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for NodeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Planner that routes through the topological graph when it can.
pub struct HierarchicalPlanner<'a> {
    grid: &'a OccupancyGrid,
    topology: &'a TopologicalMap,
    config: AStarConfig,
    ability: u8,
}

impl<'a> HierarchicalPlanner<'a> {
    pub fn new(grid: &'a OccupancyGrid, topology: &'a TopologicalMap, config: AStarConfig) -> Self {
        Self {
            grid,
            topology,
            config,
            ability: DEFAULT_ABILITY,
        }
    }

    pub fn with_ability(mut self, ability: u8) -> Self {
        self.ability = ability;
        self
    }

    fn direct(&self, start: GridCoord, goal: GridCoord) -> Path {
        AStarPlanner::new(self.grid, self.config.clone())
            .with_ability(self.ability)
            .find_path(start, goal)
    }

    pub fn find_path(&self, start: GridCoord, goal: GridCoord) -> Path {
        let start_node = self.topology.topological_area(start);
        let goal_node = self.topology.topological_area(goal);

        if start_node == UNEXPLORED_NODE_ID
            || goal_node == UNEXPLORED_NODE_ID
            || start_node == goal_node
        {
            return self.direct(start, goal);
        }

        match self.route(start, goal, start_node, goal_node) {
            Some(path) => path,
            None => {
                debug!(
                    "[Hierarchical] falling back to direct search {} -> {}",
                    start, goal
                );
                self.direct(start, goal)
            }
        }
    }

    fn route(
        &self,
        start: GridCoord,
        goal: GridCoord,
        start_node: NodeId,
        goal_node: NodeId,
    ) -> Option<Path> {
        let sequence = self.node_sequence(start_node, goal_node)?;
        trace!("[Hierarchical] node sequence {:?}", sequence);

        let first_key = self.topology.node(start_node)?.key_point();
        let last_key = self.topology.node(goal_node)?.key_point();

        let mut path = self.direct(start, first_key);
        if !path.found() {
            return None;
        }
        let checker = AStarPlanner::new(self.grid, self.config.clone()).with_ability(self.ability);

        for pair in sequence.windows(2) {
            let node = self.topology.node(pair[0])?;
            let next = self.topology.node(pair[1])?;
            let leg = node.path_to(pair[1])?;
            if leg.start_point() != Some(node.key_point())
                || leg.goal_point() != Some(next.key_point())
            {
                error!(
                    "[Hierarchical] cached path {} -> {} ends at {:?} -> {:?}, expected {} -> {}",
                    pair[0],
                    pair[1],
                    leg.start_point(),
                    leg.goal_point(),
                    node.key_point(),
                    next.key_point()
                );
            }
            // cached legs are planned at the default ability on an older grid
            if let Some(bad) = leg.points().iter().find(|p| !checker.is_passable(**p)) {
                debug!(
                    "[Hierarchical] cached path {} -> {} crosses {} at ability {}",
                    pair[0],
                    pair[1],
                    bad,
                    self.ability
                );
                return None;
            }
            path = path.concat(leg);
        }

        let tail = self.direct(last_key, goal);
        if !tail.found() {
            return None;
        }
        Some(path.concat(&tail))
    }

    /// Dijkstra over node adjacency weighted by cached path lengths.
    fn node_sequence(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        let mut best: BTreeMap<NodeId, f64> = BTreeMap::new();
        let mut previous: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        let mut open = BinaryHeap::new();

        best.insert(from, 0.0);
        open.push(NodeEntry { id: from, cost: 0.0 });

        while let Some(NodeEntry { id, cost }) = open.pop() {
            if id == to {
                let mut sequence = vec![to];
                let mut current = to;
                while let Some(&prev) = previous.get(&current) {
                    sequence.push(prev);
                    current = prev;
                }
                sequence.reverse();
                return Some(sequence);
            }
            if cost > best.get(&id).copied().unwrap_or(f64::INFINITY) {
                continue;
            }
            let Some(node) = self.topology.node(id) else {
                continue;
            };
            for (next, leg) in node.paths() {
                let candidate = cost + leg.length();
                if candidate < best.get(next).copied().unwrap_or(f64::INFINITY) {
                    best.insert(*next, candidate);
                    previous.insert(*next, id);
                    open.push(NodeEntry {
                        id: *next,
                        cost: candidate,
                    });
                }
            }
        }

        None
    }
}

/// Plan with the topological graph when one is given, else directly.
pub fn plan_path(
    grid: &OccupancyGrid,
    topology: Option<&TopologicalMap>,
    start: GridCoord,
    goal: GridCoord,
    config: &AStarConfig,
    ability: u8,
) -> Path {
    match topology {
        Some(topology) if topology.is_built() => {
            HierarchicalPlanner::new(grid, topology, config.clone())
                .with_ability(ability)
                .find_path(start, goal)
        }
        _ => AStarPlanner::new(grid, config.clone())
            .with_ability(ability)
            .find_path(start, goal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::TERRAIN_SAFE;
    use crate::topology::{KeyPointConfig, TopologyConfig};

    fn corridor_world() -> OccupancyGrid {
        // 60x9 hallway with walls on the border.
        let mut grid = OccupancyGrid::new(60, 9);
        for y in 0..9 {
            for x in 0..60 {
                let c = GridCoord::new(x, y);
                if x == 0 || y == 0 || x == 59 || y == 8 {
                    grid.set_obstacle_at(c);
                } else {
                    grid.set_free_space_at(c);
                }
            }
        }
        grid
    }

    #[test]
    fn test_hierarchical_path_connects_start_and_goal() {
        let mut grid = corridor_world();
        let mut topology = TopologicalMap::new(TopologyConfig {
            key_points: KeyPointConfig {
                gap_fill_distance: 10.0,
                min_spacing: 6.0,
                obstacle_clearance: 1.0,
            },
            ..Default::default()
        });
        topology.update(&mut grid, true);

        let start = GridCoord::new(2, 4);
        let goal = GridCoord::new(57, 4);
        let path = plan_path(
            &grid,
            Some(&topology),
            start,
            goal,
            &AStarConfig::default(),
            DEFAULT_ABILITY,
        );

        assert!(path.found());
        assert_eq!(path.start_point(), Some(start));
        assert_eq!(path.goal_point(), Some(goal));
        for pair in path.points().windows(2) {
            assert!(pair[0].is_adjacent(&pair[1]));
        }
        assert!(path.points().iter().all(|p| grid.free_space_at(*p)));
    }

    #[test]
    fn test_safe_only_agent_avoids_unsafe_block() {
        let mut grid = corridor_world();
        for y in 1..8 {
            for x in 1..59 {
                if !((20..=40).contains(&x) && y <= 6) {
                    grid.set_safe_space_at(GridCoord::new(x, y));
                }
            }
        }
        let mut topology = TopologicalMap::new(TopologyConfig {
            key_points: KeyPointConfig {
                gap_fill_distance: 10.0,
                min_spacing: 6.0,
                obstacle_clearance: 1.0,
            },
            ..Default::default()
        });
        topology.update(&mut grid, true);

        let start = GridCoord::new(2, 7);
        let goal = GridCoord::new(57, 7);
        let path = plan_path(
            &grid,
            Some(&topology),
            start,
            goal,
            &AStarConfig::default(),
            TERRAIN_SAFE,
        );

        assert!(path.found());
        assert_eq!(path.goal_point(), Some(goal));
        let unsafe_cells = path
            .points()
            .iter()
            .filter(|p| !grid.safe_space_at(**p))
            .count();
        assert_eq!(unsafe_cells, 0);
    }

    #[test]
    fn test_unbuilt_topology_uses_direct_search() {
        let grid = corridor_world();
        let topology = TopologicalMap::default();
        let path = plan_path(
            &grid,
            Some(&topology),
            GridCoord::new(2, 2),
            GridCoord::new(10, 6),
            &AStarConfig::default(),
            DEFAULT_ABILITY,
        );
        assert!(path.found());
        assert_eq!(path.goal_point(), Some(GridCoord::new(10, 6)));
    }
}
