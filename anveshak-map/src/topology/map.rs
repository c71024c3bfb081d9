//! Topological map: skeleton, key points, regions and node graph.

use std::collections::BTreeMap;

use log::{debug, error, info, trace};
use serde::{Deserialize, Serialize};

use super::areas::{AreaGrid, fill_key_areas};
use super::cache::{DEFAULT_PATH_CACHE_CAPACITY, PathCache};
use super::keypoints::{KeyPointConfig, find_key_points};
use super::node::{NodeId, TopologicalNode, UNEXPLORED_NODE_ID};
use super::skeleton::{Mask, skeleton_reachable, skeletonize};
use crate::core::GridCoord;
use crate::grid::OccupancyGrid;
use crate::pathfinding::{AStarConfig, AStarPlanner, Path};

/// Topological map configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Rebuild once more than this many cells turned from unknown to free
    pub change_threshold: u64,
    /// Thinning iteration cap
    pub max_thinning_iterations: usize,
    /// Hop budget for skeleton reachability queries
    pub skeleton_hop_budget: usize,
    /// Maximum number of cached inter-node paths
    pub path_cache_capacity: usize,
    /// Key-point selection
    pub key_points: KeyPointConfig,
    /// Search used for inter-node paths
    pub astar: AStarConfig,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            change_threshold: 100,
            max_thinning_iterations: 200,
            skeleton_hop_budget: 10_000,
            path_cache_capacity: DEFAULT_PATH_CACHE_CAPACITY,
            key_points: KeyPointConfig::default(),
            astar: AStarConfig::default(),
        }
    }
}

/// Lazily rebuilt decomposition of an agent's free space.
#[derive(Clone, Debug)]
pub struct TopologicalMap {
    config: TopologyConfig,
    width: usize,
    height: usize,
    skeleton: Vec<bool>,
    key_points: Vec<GridCoord>,
    area_grid: AreaGrid,
    nodes: BTreeMap<NodeId, TopologicalNode>,
    cache: PathCache,
    built: bool,
    last_change_count: u64,
    rebuilds: u64,
}

impl TopologicalMap {
    pub fn new(config: TopologyConfig) -> Self {
        let cache = PathCache::new(config.path_cache_capacity);
        Self {
            config,
            width: 0,
            height: 0,
            skeleton: Vec::new(),
            key_points: Vec::new(),
            area_grid: AreaGrid::default(),
            nodes: BTreeMap::new(),
            cache,
            built: false,
            last_change_count: 0,
            rebuilds: 0,
        }
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Rebuild if forced, never built, or the grid changed past the threshold.
    ///
    /// `force` also clears the path cache. Returns whether a rebuild happened.
    pub fn update(&mut self, grid: &mut OccupancyGrid, force: bool) -> bool {
        let changed = grid.map_cells_changed().saturating_sub(self.last_change_count);
        if self.built && !force && changed <= self.config.change_threshold {
            trace!(
                "[Topology] skip rebuild: {} changed cells <= threshold {}",
                changed, self.config.change_threshold
            );
            return false;
        }
        if force {
            self.cache.clear();
        }
        self.rebuild(grid);
        true
    }

    fn rebuild(&mut self, grid: &mut OccupancyGrid) {
        let (width, height) = (grid.width(), grid.height());
        let mask: Vec<bool> = grid
            .cells()
            .iter()
            .map(|f| f.is_free() && !f.is_obstacle())
            .collect();

        self.skeleton = skeletonize(&mask, width, height, self.config.max_thinning_iterations);
        self.key_points = find_key_points(
            Mask::new(&self.skeleton, width, height),
            grid,
            &self.config.key_points,
        );

        let previous = (self.built && self.width == width && self.height == height)
            .then_some(&self.area_grid);
        let area_grid = fill_key_areas(grid, &self.key_points, previous);
        self.area_grid = area_grid;
        self.width = width;
        self.height = height;

        self.build_nodes(grid);

        self.built = true;
        self.last_change_count = grid.map_cells_changed();
        self.rebuilds += 1;

        info!(
            "[Topology] rebuild #{}: {} key points, {} nodes, {} cached paths",
            self.rebuilds,
            self.key_points.len(),
            self.nodes.len(),
            self.cache.len()
        );
    }

    fn build_nodes(&mut self, grid: &OccupancyGrid) {
        let mut nodes: BTreeMap<NodeId, TopologicalNode> = self
            .key_points
            .iter()
            .enumerate()
            .map(|(i, kp)| ((i + 1) as NodeId, TopologicalNode::new((i + 1) as NodeId, *kp)))
            .collect();

        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let coord = GridCoord::new(x, y);
                let id = self.area_grid.node_at(coord);
                if id == UNEXPLORED_NODE_ID {
                    continue;
                }
                let Some(node) = nodes.get_mut(&id) else {
                    continue;
                };
                node.add_cell();

                let mut borders_unexplored = false;
                let mut adjacent = Vec::new();
                for n in coord.neighbors_8() {
                    if !grid.location_exists(n) {
                        continue;
                    }
                    let other = self.area_grid.node_at(n);
                    if grid.is_unknown(n)
                        || (other == UNEXPLORED_NODE_ID && grid.free_space_at(n))
                    {
                        borders_unexplored = true;
                    } else if other != UNEXPLORED_NODE_ID && other != id {
                        adjacent.push(other);
                    }
                }
                if borders_unexplored {
                    node.mark_borders_unexplored();
                }
                for other in adjacent {
                    node.add_neighbour(other);
                }
            }
        }

        // Make adjacency symmetric before computing paths.
        let links: Vec<(NodeId, NodeId)> = nodes
            .values()
            .flat_map(|n| n.neighbours().iter().map(move |m| (n.id(), *m)))
            .collect();
        for (a, b) in &links {
            if let Some(node) = nodes.get_mut(b) {
                node.add_neighbour(*a);
            }
        }

        let mut computed = 0usize;
        for (a, b) in links {
            if a > b {
                continue;
            }
            let (Some(from), Some(to)) = (
                nodes.get(&a).map(|n| n.key_point()),
                nodes.get(&b).map(|n| n.key_point()),
            ) else {
                continue;
            };

            let path = match self.cached_path(grid, from, to) {
                Some(path) => path,
                None => {
                    computed += 1;
                    let path = self.compute_node_path(grid, a, b, from, to);
                    if path.found() {
                        self.cache.insert(&path);
                    }
                    path
                }
            };

            if !path.found() {
                debug!("[Topology] no path between nodes {} and {}", a, b);
                continue;
            }
            let reverse = path.reversed();
            if let Some(node) = nodes.get_mut(&a) {
                node.set_path(b, path);
            }
            if let Some(node) = nodes.get_mut(&b) {
                node.set_path(a, reverse);
            }
        }

        debug!(
            "[Topology] {} nodes, {} links, {} paths computed",
            nodes.len(),
            nodes.values().map(|n| n.neighbours().len()).sum::<usize>() / 2,
            computed
        );
        self.nodes = nodes;
    }

    /// Cached path that is still obstacle-free on the current grid.
    fn cached_path(
        &mut self,
        grid: &OccupancyGrid,
        from: GridCoord,
        to: GridCoord,
    ) -> Option<Path> {
        let path = self.cache.get(from, to)?;
        if path.points().iter().all(|p| !grid.obstacle_at(*p)) {
            Some(path)
        } else {
            None
        }
    }

    /// A* confined to the two regions, then unrestricted.
    fn compute_node_path(
        &self,
        grid: &OccupancyGrid,
        a: NodeId,
        b: NodeId,
        from: GridCoord,
        to: GridCoord,
    ) -> Path {
        let area_grid = &self.area_grid;
        let in_regions = |c: GridCoord| {
            let id = area_grid.node_at(c);
            id == a || id == b
        };

        let mut path = AStarPlanner::new(grid, self.config.astar.clone())
            .restricted_to(&in_regions)
            .find_path(from, to);
        if !path.found() {
            path = AStarPlanner::new(grid, self.config.astar.clone()).find_path(from, to);
        }

        if path.found() && (path.start_point() != Some(from) || path.goal_point() != Some(to)) {
            error!(
                "[Topology] path {} -> {} has endpoints {:?} -> {:?}, expected {} -> {}",
                a,
                b,
                path.start_point(),
                path.goal_point(),
                from,
                to
            );
        }
        path
    }

    // === Accessors ===

    pub fn key_points(&self) -> &[GridCoord] {
        &self.key_points
    }

    pub fn area_grid(&self) -> &AreaGrid {
        &self.area_grid
    }

    /// One-pixel-wide skeleton of the free space at the last rebuild.
    pub fn skeleton(&self) -> Mask<'_> {
        Mask::new(&self.skeleton, self.width, self.height)
    }

    /// Nodes, optionally refreshing first.
    pub fn topological_nodes(
        &mut self,
        grid: &mut OccupancyGrid,
        update: bool,
    ) -> &BTreeMap<NodeId, TopologicalNode> {
        if update {
            self.update(grid, false);
        }
        &self.nodes
    }

    /// Nodes as of the last rebuild.
    pub fn nodes(&self) -> &BTreeMap<NodeId, TopologicalNode> {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&TopologicalNode> {
        self.nodes.get(&id)
    }

    /// Node that owns `point`, or [`UNEXPLORED_NODE_ID`].
    pub fn topological_area(&self, point: GridCoord) -> NodeId {
        self.area_grid.node_at(point)
    }

    /// Skeleton connectivity within the configured hop budget.
    pub fn skeleton_reachable(&self, start: GridCoord, goal: GridCoord) -> bool {
        skeleton_reachable(self.skeleton(), start, goal, self.config.skeleton_hop_budget)
    }

    pub fn path_cache(&self) -> &PathCache {
        &self.cache
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Number of rebuilds so far
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}

impl Default for TopologicalMap {
    fn default() -> Self {
        Self::new(TopologyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two 15x15 rooms joined by a 3-cell-wide corridor.
    fn two_rooms() -> OccupancyGrid {
        let mut grid = OccupancyGrid::new(50, 17);
        for y in 0..17 {
            for x in 0..50 {
                let c = GridCoord::new(x, y);
                let in_room = (1..=15).contains(&y)
                    && ((1..=15).contains(&x) || (34..=48).contains(&x));
                let in_corridor = (7..=9).contains(&y) && (16..=33).contains(&x);
                if in_room || in_corridor {
                    grid.set_free_space_at(c);
                } else {
                    grid.set_obstacle_at(c);
                }
            }
        }
        grid
    }

    fn config() -> TopologyConfig {
        TopologyConfig {
            key_points: KeyPointConfig {
                gap_fill_distance: 12.0,
                min_spacing: 8.0,
                obstacle_clearance: 1.0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_rebuild_partitions_all_free_cells() {
        let mut grid = two_rooms();
        let mut map = TopologicalMap::new(config());
        assert!(map.update(&mut grid, false));

        assert!(map.key_points().len() >= 2);
        for c in grid.free_cells() {
            assert_ne!(map.topological_area(c), UNEXPLORED_NODE_ID, "cell {} unassigned", c);
        }
    }

    #[test]
    fn test_adjacent_nodes_have_paths() {
        let mut grid = two_rooms();
        let mut map = TopologicalMap::new(config());
        map.update(&mut grid, true);

        let nodes = map.nodes();
        assert!(nodes.values().any(|n| !n.neighbours().is_empty()));
        for node in nodes.values() {
            for (other, path) in node.paths() {
                assert!(node.neighbours().contains(other));
                assert_eq!(path.start_point(), Some(node.key_point()));
                assert_eq!(path.goal_point(), Some(nodes[other].key_point()));
            }
        }
    }

    #[test]
    fn test_skeleton_spans_both_rooms() {
        let mut grid = two_rooms();
        let mut map = TopologicalMap::new(config());
        map.update(&mut grid, true);

        let pixels: Vec<GridCoord> = map.skeleton().pixels().collect();
        let first = *pixels.iter().find(|p| p.x < 16).expect("left room skeleton");
        let last = *pixels.iter().rev().find(|p| p.x > 33).expect("right room skeleton");
        assert!(map.skeleton_reachable(first, last));

        let mut short = TopologicalMap::new(TopologyConfig {
            skeleton_hop_budget: 3,
            ..config()
        });
        short.update(&mut grid, true);
        assert!(!short.skeleton_reachable(first, last));
        assert!(short.skeleton_reachable(first, first));
    }

    #[test]
    fn test_threshold_controls_rebuild() {
        let mut grid = two_rooms();
        let mut map = TopologicalMap::new(TopologyConfig {
            change_threshold: 5,
            ..config()
        });
        assert!(map.update(&mut grid, false));
        assert!(!map.update(&mut grid, false));
        assert!(map.update(&mut grid, true));
        assert_eq!(map.path_cache().generation(), 1);
        assert_eq!(map.rebuilds(), 2);
    }
}
